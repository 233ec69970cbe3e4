//! Error types for framecut

use std::path::PathBuf;

use miette::Diagnostic;

/// Result type alias using FramecutError
pub type Result<T> = std::result::Result<T, FramecutError>;

/// Main error type for framecut operations
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum FramecutError {
	/// Frame index outside the clip
	#[error("Frame index {index} is out of bounds for a {num_frames} frame clip")]
	#[diagnostic(
		code(framecut::out_of_range),
		help("Frame indices must satisfy |index| <= the clip's total frame count")
	)]
	OutOfRange { index: i64, num_frames: usize },

	/// Parallel start/end lists differ in length
	#[error("Trim start/end lists differ in length ({starts} starts, {ends} ends)")]
	#[diagnostic(code(framecut::length_mismatch))]
	LengthMismatch { starts: usize, ends: usize },

	/// Normalized trims fail the ordering check
	#[error("The trims {trims} are not logical")]
	#[diagnostic(
		code(framecut::illogical_trim),
		help("Each trim must span at least one frame and trims must be strictly ordered without touching or overlapping")
	)]
	IllogicalTrim { trims: String },

	/// Requested sub-second precision is unsupported
	#[error("The precision {precision} must be a multiple of 3 (including 0)")]
	#[diagnostic(code(framecut::invalid_precision), help("Valid precisions are 0, 3, 6 and 9"))]
	InvalidPrecision { precision: u32 },

	/// Malformed trim specification on the command line
	#[error("Invalid trim specification: {value}")]
	#[diagnostic(
		code(framecut::invalid_trim_spec),
		help("Trims are written start:end with either side optional, e.g. '3:22', '-10:-5', '97:' or ':10'")
	)]
	InvalidTrimSpec { value: String },

	/// No trims were supplied
	#[error("At least one trim is required")]
	#[diagnostic(code(framecut::empty_trims))]
	EmptyTrims,

	/// Input file not found or inaccessible
	#[error("Input file not found: {path}")]
	#[diagnostic(
		code(framecut::input_not_found),
		help("Ensure the file exists and you have read permissions")
	)]
	InputNotFound { path: PathBuf },

	/// Output file already present
	#[error("Output file already exists: {path}")]
	#[diagnostic(
		code(framecut::output_exists),
		help("framecut never overwrites; remove the file or pick another output path")
	)]
	OutputExists { path: PathBuf },

	/// Leftover concat list from a previous run
	#[error("Concat list {path} already exists")]
	#[diagnostic(
		code(framecut::concat_list_exists),
		help("A previous multi-segment cut may have been interrupted; remove the file and retry")
	)]
	ConcatListExists { path: PathBuf },

	/// ffmpeg executable missing
	#[error("ffmpeg executable not found{}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_else(|| String::from(" in PATH")))]
	#[diagnostic(
		code(framecut::ffmpeg_not_found),
		help("Install ffmpeg or point --ffmpeg at the executable")
	)]
	FfmpegNotFound { path: Option<PathBuf> },

	/// ffmpeg executable present but not answering sanely
	#[error("ffmpeg executable at {path} is not working properly")]
	#[diagnostic(code(framecut::ffmpeg_unusable))]
	FfmpegUnusable { path: PathBuf },

	/// External command exited with failure
	#[error("{program} exited with {status}")]
	#[diagnostic(code(framecut::command_failed))]
	CommandFailed { program: String, status: String },

	/// Frame index beyond the timecode table
	#[error("Frame {frame} is beyond the timecode table ({entries} entries)")]
	#[diagnostic(
		code(framecut::timecode_index),
		help("The timecodes file must carry one entry per frame of the clip")
	)]
	TimecodeIndex { frame: usize, entries: usize },

	/// Unparsable timecodes v2 file
	#[error("Invalid timecodes file {path}: {message}")]
	#[diagnostic(
		code(framecut::invalid_timecodes),
		help("Expected a timecodes v2 file: a header line followed by one millisecond value per line")
	)]
	InvalidTimecodesFile { path: PathBuf, message: String },

	/// No video stream found in the clip
	#[error("No video stream found in input file")]
	#[diagnostic(code(framecut::no_video))]
	NoVideoStream,

	/// Frame metadata did not yield a usable duration
	#[error("Frame {frame} carries no usable duration metadata")]
	#[diagnostic(
		code(framecut::frame_duration),
		help("For variable-frame-rate sources without duration metadata, supply a timecodes v2 file instead")
	)]
	FrameDuration { frame: usize },

	/// FFmpeg library error
	#[error("FFmpeg error: {message}")]
	#[diagnostic(code(framecut::ffmpeg))]
	Ffmpeg {
		message: String,
		#[source]
		source: Option<ffmpeg_next::Error>,
	},

	/// I/O error
	#[error("I/O error: {0}")]
	#[diagnostic(code(framecut::io))]
	Io(#[from] std::io::Error),
}

impl From<ffmpeg_next::Error> for FramecutError {
	fn from(err: ffmpeg_next::Error) -> Self {
		FramecutError::Ffmpeg {
			message: err.to_string(),
			source: Some(err),
		}
	}
}

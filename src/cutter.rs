//! Cut planning and ffmpeg orchestration
//!
//! Planning (normalize, validate, translate) is pure; cutting drives the
//! external ffmpeg binary with the planned `-ss`/`-to` boundaries, stream
//! copying where the container extension allows it and concatenating when
//! more than one range is kept.

use std::ffi::OsString;
use std::fs;
use std::path::{
	Path,
	PathBuf,
};
use std::process::Command;

use tracing::{
	debug,
	info,
	warn,
};

use crate::{
	clip::Clip,
	error::{
		FramecutError,
		Result,
	},
	timecodes::TimecodeCache,
	timestamp::Timestamper,
	trim::{
		check_ordered,
		normalize_many,
		normalize_one,
		Trim,
	},
};

/// Extensions FFmpeg's audio encoders can write, eligible for stream copy.
/// Anything else is re-encoded to WAV losslessly.
const STREAM_COPY_EXTENSIONS: &[&str] = &[
	"aac", "m4a", "adts", "ac3", "alac", "caf", "dca", "dts", "eac3", "flac", "gsm", "mlp", "mp2",
	"mp3", "mpga", "opus", "spx", "ogg", "oga", "pcm", "raw", "sbc", "thd", "tta", "wav", "w64",
	"wma",
];

/// Temp file names used while concatenating multi-range cuts.
const CONCAT_LIST: &str = "_framecut_concat.txt";
const SEGMENT_PREFIX: &str = "_framecut_segment_";

/// Options for a cut, beyond the trims themselves.
#[derive(Debug, Clone)]
pub struct CutOptions {
	/// Sub-second timestamp precision (0, 3, 6 or 9 digits)
	pub precision: u32,
	/// Timecodes v2 file for variable-frame-rate clips
	pub timecodes_file: Option<PathBuf>,
	/// Explicit ffmpeg executable; otherwise resolved from PATH
	pub ffmpeg_path: Option<PathBuf>,
	/// Suppress most ffmpeg console output
	pub quiet: bool,
}

impl Default for CutOptions {
	fn default() -> Self {
		Self {
			precision: 3,
			timecodes_file: None,
			ffmpeg_path: None,
			quiet: false,
		}
	}
}

/// A validated cut: normalized frame boundaries and their timestamps.
///
/// `starts`/`ends` carry the absolute frame indices after normalization (the
/// introspection output); the timestamp lists are parallel to them and are
/// handed to ffmpeg verbatim.
#[derive(Debug, Clone)]
pub struct CutPlan {
	pub starts: Vec<usize>,
	pub ends: Vec<usize>,
	pub start_timestamps: Vec<String>,
	pub end_timestamps: Vec<String>,
}

impl CutPlan {
	/// Number of ranges kept by this plan.
	pub fn segments(&self) -> usize {
		self.starts.len()
	}
}

/// Plan a single-range cut.
pub fn plan_one(
	clip: &dyn Clip,
	trim: Trim,
	options: &CutOptions,
	cache: &mut TimecodeCache,
) -> Result<CutPlan> {
	let (start, end) = normalize_one(clip.num_frames(), trim)?;
	if end <= start {
		return Err(FramecutError::IllogicalTrim {
			trims: trim_display(&trim),
		});
	}

	let mut timestamper = Timestamper::new(clip, options.timecodes_file.as_deref(), cache)?;
	let start_ts = timestamper.timestamp(start, options.precision)?;
	let end_ts = timestamper.timestamp(end, options.precision)?;

	debug!(start, end, start_ts = %start_ts, end_ts = %end_ts, "Planned trim");

	Ok(CutPlan {
		starts: vec![start],
		ends: vec![end],
		start_timestamps: vec![start_ts],
		end_timestamps: vec![end_ts],
	})
}

/// Plan a multi-range cut.
///
/// Ranges must be strictly ordered and non-touching once normalized.
pub fn plan_many(
	clip: &dyn Clip,
	trims: &[Trim],
	options: &CutOptions,
	cache: &mut TimecodeCache,
) -> Result<CutPlan> {
	if trims.is_empty() {
		return Err(FramecutError::EmptyTrims);
	}

	let raw_starts: Vec<Option<i64>> = trims.iter().map(|t| t.0).collect();
	let raw_ends: Vec<Option<i64>> = trims.iter().map(|t| t.1).collect();
	let (starts, ends) = normalize_many(clip.num_frames(), &raw_starts, &raw_ends)?;

	if !check_ordered(&starts, &ends) {
		return Err(FramecutError::IllogicalTrim {
			trims: trims.iter().map(trim_display).collect::<Vec<_>>().join(", "),
		});
	}

	let mut timestamper = Timestamper::new(clip, options.timecodes_file.as_deref(), cache)?;
	let mut start_timestamps = Vec::with_capacity(starts.len());
	let mut end_timestamps = Vec::with_capacity(ends.len());
	for (&start, &end) in starts.iter().zip(ends.iter()) {
		start_timestamps.push(timestamper.timestamp(start, options.precision)?);
		end_timestamps.push(timestamper.timestamp(end, options.precision)?);
	}

	debug!(segments = starts.len(), "Planned trims");

	Ok(CutPlan {
		starts,
		ends,
		start_timestamps,
		end_timestamps,
	})
}

/// Outcome of a completed cut.
#[derive(Debug)]
pub struct CutStats {
	/// Number of ranges cut (and concatenated, if more than one)
	pub segments: usize,
	/// Path of the written audio file
	pub output: PathBuf,
	/// Whether the audio was re-encoded to WAV instead of stream copied
	pub reencoded: bool,
}

/// Cut `audio_file` to the frame ranges of `trims` on `clip`.
///
/// The output extension follows the input's when it is stream-copyable, WAV
/// otherwise. Refuses to overwrite an existing output.
pub fn cut_audio(
	clip: &dyn Clip,
	trims: &[Trim],
	audio_file: &Path,
	outfile: Option<&Path>,
	options: &CutOptions,
	cache: &mut TimecodeCache,
) -> Result<CutStats> {
	if !audio_file.is_file() {
		return Err(FramecutError::InputNotFound {
			path: audio_file.to_path_buf(),
		});
	}

	let input_ext = audio_file.extension().and_then(|e| e.to_str()).unwrap_or_default();
	let copyable = STREAM_COPY_EXTENSIONS.contains(&input_ext);
	let (out_ext, codec_args): (&str, &[&str]) = if copyable {
		(input_ext, &["-c:a", "copy", "-rf64", "auto"])
	} else {
		warn!(
			extension = input_ext,
			"Extension is not supported by FFmpeg's audio encoders, re-encoding to WAV"
		);
		("wav", &[])
	};

	let outfile = resolve_outfile(audio_file, outfile, out_ext);
	if outfile.is_file() {
		return Err(FramecutError::OutputExists { path: outfile });
	}

	if let Some(timecodes) = options.timecodes_file.as_deref() {
		if !timecodes.is_file() {
			return Err(FramecutError::InputNotFound {
				path: timecodes.to_path_buf(),
			});
		}
	}

	let ffmpeg = resolve_ffmpeg(options.ffmpeg_path.as_deref())?;

	let plan = if trims.len() == 1 {
		plan_one(clip, trims[0], options, cache)?
	} else {
		plan_many(clip, trims, options, cache)?
	};

	info!(
		audio = %audio_file.display(),
		output = %outfile.display(),
		segments = plan.segments(),
		stream_copy = copyable,
		"Cutting audio"
	);

	let mut base_args: Vec<OsString> = vec![OsString::from("-hide_banner")];
	if options.quiet {
		base_args.push(OsString::from("-loglevel"));
		base_args.push(OsString::from("16"));
	}

	if plan.segments() == 1 {
		let mut args = base_args.clone();
		args.extend(segment_args(
			audio_file,
			&plan.start_timestamps[0],
			&plan.end_timestamps[0],
			codec_args,
			&outfile,
		));
		run_ffmpeg(&ffmpeg, &args)?;
	} else {
		concat_segments(&ffmpeg, &base_args, &plan, audio_file, codec_args, &outfile, out_ext)?;
	}

	info!(output = %outfile.display(), "Cut complete");

	Ok(CutStats {
		segments: plan.segments(),
		output: outfile,
		reencoded: !copyable,
	})
}

/// Cut each range to a temp file, then concatenate with ffmpeg's concat
/// demuxer.
fn concat_segments(
	ffmpeg: &Path,
	base_args: &[OsString],
	plan: &CutPlan,
	audio_file: &Path,
	codec_args: &[&str],
	outfile: &Path,
	out_ext: &str,
) -> Result<()> {
	let list_path = PathBuf::from(CONCAT_LIST);
	if list_path.is_file() {
		return Err(FramecutError::ConcatListExists { path: list_path });
	}

	let mut list = String::new();
	let mut temp_files = Vec::with_capacity(plan.segments());
	for key in 0..plan.segments() {
		let temp = PathBuf::from(format!("{SEGMENT_PREFIX}{key}.{out_ext}"));
		list.push_str(&format!("file {}\n", temp.display()));
		temp_files.push(temp);
	}
	fs::write(&list_path, list)?;

	for (key, temp) in temp_files.iter().enumerate() {
		let mut args = base_args.to_vec();
		args.extend(segment_args(
			audio_file,
			&plan.start_timestamps[key],
			&plan.end_timestamps[key],
			codec_args,
			temp,
		));
		run_ffmpeg(ffmpeg, &args)?;
	}

	let mut args = base_args.to_vec();
	args.extend([
		OsString::from("-f"),
		OsString::from("concat"),
		OsString::from("-i"),
		list_path.clone().into_os_string(),
		OsString::from("-c"),
		OsString::from("copy"),
		outfile.as_os_str().to_os_string(),
	]);
	run_ffmpeg(ffmpeg, &args)?;

	fs::remove_file(&list_path)?;
	for temp in temp_files {
		fs::remove_file(temp)?;
	}

	Ok(())
}

fn segment_args(
	audio_file: &Path,
	start_ts: &str,
	end_ts: &str,
	codec_args: &[&str],
	output: &Path,
) -> Vec<OsString> {
	let mut args = vec![
		OsString::from("-i"),
		audio_file.as_os_str().to_os_string(),
		OsString::from("-vn"),
		OsString::from("-ss"),
		OsString::from(start_ts),
		OsString::from("-to"),
		OsString::from(end_ts),
	];
	args.extend(codec_args.iter().map(|arg| OsString::from(*arg)));
	args.push(output.as_os_str().to_os_string());
	args
}

fn run_ffmpeg(ffmpeg: &Path, args: &[OsString]) -> Result<()> {
	debug!(ffmpeg = %ffmpeg.display(), ?args, "Running ffmpeg");

	let status = Command::new(ffmpeg).args(args).status()?;
	if !status.success() {
		return Err(FramecutError::CommandFailed {
			program: String::from("ffmpeg"),
			status: status.to_string(),
		});
	}
	Ok(())
}

/// Locate a usable ffmpeg executable and sanity-check it with `-version`.
fn resolve_ffmpeg(explicit: Option<&Path>) -> Result<PathBuf> {
	let candidate = match explicit {
		Some(path) => {
			if !path.is_file() {
				return Err(FramecutError::FfmpegNotFound {
					path: Some(path.to_path_buf()),
				});
			}
			path.to_path_buf()
		},
		None => PathBuf::from("ffmpeg"),
	};

	let output = Command::new(&candidate).arg("-version").output().map_err(|_| {
		FramecutError::FfmpegNotFound {
			path: explicit.map(Path::to_path_buf),
		}
	})?;

	let stdout = String::from_utf8_lossy(&output.stdout);
	if stdout.split_whitespace().next() != Some("ffmpeg") {
		return Err(FramecutError::FfmpegUnusable { path: candidate });
	}

	Ok(candidate)
}

/// Apply the output naming rules: default to `{stem}_cut.{ext}` next to the
/// audio file; force the chosen extension onto a caller-supplied name.
fn resolve_outfile(audio_file: &Path, outfile: Option<&Path>, out_ext: &str) -> PathBuf {
	match outfile {
		None => {
			let stem = audio_file
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or_default();
			audio_file.with_file_name(format!("{stem}_cut.{out_ext}"))
		},
		Some(path) => match path.extension() {
			Some(ext) if ext == out_ext => path.to_path_buf(),
			_ => path.with_extension(out_ext),
		},
	}
}

fn trim_display(trim: &Trim) -> String {
	let bound = |b: Option<i64>| b.map(|v| v.to_string()).unwrap_or_default();
	format!("{}:{}", bound(trim.0), bound(trim.1))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rational::Rational;

	struct StubClip {
		fps: Rational,
		num_frames: usize,
	}

	impl Clip for StubClip {
		fn id(&self) -> &str {
			"stub"
		}

		fn num_frames(&self) -> usize {
			self.num_frames
		}

		fn fps(&self) -> Rational {
			self.fps
		}

		fn frame_durations(&self) -> Result<Box<dyn Iterator<Item = Result<Rational>>>> {
			Ok(Box::new(std::iter::empty()))
		}
	}

	fn clip_24fps(num_frames: usize) -> StubClip {
		StubClip {
			fps: Rational::new(24, 1),
			num_frames,
		}
	}

	#[test]
	fn test_plan_one_simple() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		let plan = plan_one(&clip, (Some(24), Some(48)), &CutOptions::default(), &mut cache).unwrap();

		assert_eq!(plan.starts, vec![24]);
		assert_eq!(plan.ends, vec![48]);
		assert_eq!(plan.start_timestamps, vec!["00:00:01.000"]);
		assert_eq!(plan.end_timestamps, vec!["00:00:02.000"]);
	}

	#[test]
	fn test_plan_one_rejects_empty_range() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		assert!(matches!(
			plan_one(&clip, (Some(10), Some(10)), &CutOptions::default(), &mut cache),
			Err(FramecutError::IllogicalTrim { .. })
		));
		assert!(plan_one(&clip, (Some(10), Some(5)), &CutOptions::default(), &mut cache).is_err());
	}

	#[test]
	fn test_plan_one_negative_end() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		let plan = plan_one(&clip, (Some(0), Some(-76)), &CutOptions::default(), &mut cache).unwrap();
		assert_eq!(plan.ends, vec![24]);
		assert_eq!(plan.end_timestamps, vec!["00:00:01.000"]);
	}

	#[test]
	fn test_plan_many_ordered() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		let plan = plan_many(
			&clip,
			&[(Some(0), Some(24)), (Some(48), None)],
			&CutOptions::default(),
			&mut cache,
		)
		.unwrap();

		assert_eq!(plan.starts, vec![0, 48]);
		assert_eq!(plan.ends, vec![24, 100]);
		assert_eq!(plan.start_timestamps.len(), 2);
		assert_eq!(plan.end_timestamps.len(), 2);
	}

	#[test]
	fn test_plan_many_rejects_touching() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		assert!(matches!(
			plan_many(
				&clip,
				&[(Some(0), Some(24)), (Some(24), Some(48))],
				&CutOptions::default(),
				&mut cache,
			),
			Err(FramecutError::IllogicalTrim { .. })
		));
	}

	#[test]
	fn test_plan_many_rejects_empty() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		assert!(matches!(
			plan_many(&clip, &[], &CutOptions::default(), &mut cache),
			Err(FramecutError::EmptyTrims)
		));
	}

	#[test]
	fn test_plan_round_trip_recovers_frames() {
		let clip = StubClip {
			fps: Rational::new(24000, 1001),
			num_frames: 5000,
		};
		let mut cache = TimecodeCache::new();
		let trims = [(Some(100), Some(1000)), (Some(2000), Some(-1000))];
		let plan = plan_many(&clip, &trims, &CutOptions::default(), &mut cache).unwrap();

		let fps = 24000.0 / 1001.0;
		for (ts, &frame) in plan
			.start_timestamps
			.iter()
			.chain(plan.end_timestamps.iter())
			.zip(plan.starts.iter().chain(plan.ends.iter()))
		{
			// recovered frame must land within one frame of the original
			let recovered = parse_timestamp(ts) * fps;
			assert!(
				(recovered - frame as f64).abs() < 1.0,
				"{ts} does not recover frame {frame}"
			);
		}
	}

	fn parse_timestamp(ts: &str) -> f64 {
		let parts: Vec<&str> = ts.split(':').collect();
		let h: f64 = parts[0].parse().unwrap();
		let m: f64 = parts[1].parse().unwrap();
		let s: f64 = parts[2].parse().unwrap();
		h * 3600.0 + m * 60.0 + s
	}

	#[test]
	fn test_stream_copy_extensions() {
		assert!(STREAM_COPY_EXTENSIONS.contains(&"flac"));
		assert!(STREAM_COPY_EXTENSIONS.contains(&"wav"));
		assert!(STREAM_COPY_EXTENSIONS.contains(&"opus"));
		assert!(!STREAM_COPY_EXTENSIONS.contains(&"mkv"));
		assert!(!STREAM_COPY_EXTENSIONS.contains(&"webm"));
	}

	#[test]
	fn test_resolve_outfile_default() {
		let out = resolve_outfile(Path::new("/media/audio.flac"), None, "flac");
		assert_eq!(out, Path::new("/media/audio_cut.flac"));
	}

	#[test]
	fn test_resolve_outfile_appends_extension() {
		let out = resolve_outfile(Path::new("audio.flac"), Some(Path::new("cut")), "flac");
		assert_eq!(out, Path::new("cut.flac"));
	}

	#[test]
	fn test_resolve_outfile_rewrites_extension() {
		let out = resolve_outfile(Path::new("audio.flac"), Some(Path::new("cut.wav")), "flac");
		assert_eq!(out, Path::new("cut.flac"));

		let kept = resolve_outfile(Path::new("audio.flac"), Some(Path::new("cut.flac")), "flac");
		assert_eq!(kept, Path::new("cut.flac"));
	}

	#[test]
	fn test_segment_args_order() {
		let args = segment_args(
			Path::new("in.wav"),
			"00:00:01.000",
			"00:00:02.000",
			&["-c:a", "copy", "-rf64", "auto"],
			Path::new("out.wav"),
		);
		let rendered: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
		assert_eq!(
			rendered,
			vec![
				"-i",
				"in.wav",
				"-vn",
				"-ss",
				"00:00:01.000",
				"-to",
				"00:00:02.000",
				"-c:a",
				"copy",
				"-rf64",
				"auto",
				"out.wav",
			]
		);
	}

	#[test]
	fn test_cut_audio_missing_input() {
		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		let err = cut_audio(
			&clip,
			&[(Some(0), Some(10))],
			Path::new("/nonexistent/audio.wav"),
			None,
			&CutOptions::default(),
			&mut cache,
		)
		.unwrap_err();
		assert!(matches!(err, FramecutError::InputNotFound { .. }));
	}

	#[test]
	fn test_cut_audio_refuses_existing_output() {
		let dir = tempfile::tempdir().unwrap();
		let audio = dir.path().join("audio.wav");
		let existing = dir.path().join("audio_cut.wav");
		std::fs::write(&audio, b"riff").unwrap();
		std::fs::write(&existing, b"old").unwrap();

		let clip = clip_24fps(100);
		let mut cache = TimecodeCache::new();
		let err = cut_audio(
			&clip,
			&[(Some(0), Some(10))],
			&audio,
			None,
			&CutOptions::default(),
			&mut cache,
		)
		.unwrap_err();
		assert!(matches!(err, FramecutError::OutputExists { .. }));
	}
}

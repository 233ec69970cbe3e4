//! CLI argument parsing for framecut

use std::path::PathBuf;

use clap::Parser;

use crate::{
	error::{
		FramecutError,
		Result,
	},
	trim::Trim,
};

/// Cut an audio file to match frame-range trims on a video clip.
///
/// Trims follow Python/VapourSynth slicing syntax with a half-open end:
///
///   framecut -i clip.mkv -a audio.flac -t 3:22 -t 23:40
#[derive(Parser, Debug, Clone)]
#[command(name = "framecut", version, about, long_about = None)]
pub struct Args {
	/// Input video clip, used for frame count and frame rate
	#[arg(short, long)]
	pub input: PathBuf,

	/// Source audio file to cut
	#[arg(short, long)]
	pub audio: PathBuf,

	/// Frame range to keep, written start:end
	///
	/// Either side may be empty ('97:' runs to the last frame, ':10' starts
	/// at the first) and negative values count from the end of the clip.
	/// Repeat for multiple ranges; ranges must be ordered and must not touch.
	#[arg(
		short = 't',
		long = "trim",
		value_name = "START:END",
		required = true,
		allow_hyphen_values = true
	)]
	pub trims: Vec<String>,

	/// Output file name or path
	///
	/// The extension is derived from the input audio and inserted or
	/// rewritten as needed. Defaults to the audio file name with '_cut'.
	#[arg(short, long)]
	pub output: Option<PathBuf>,

	/// Sub-second timestamp precision in digits (0, 3, 6 or 9)
	#[arg(short, long, default_value = "3")]
	pub precision: u32,

	/// Timecodes v2 file for variable-frame-rate clips
	///
	/// Generated by vspipe, ffms2, mkvtoolnix etc. Not needed for CFR clips.
	#[arg(long)]
	pub timecodes: Option<PathBuf>,

	/// ffmpeg executable to use, if not in PATH
	#[arg(long)]
	pub ffmpeg: Option<PathBuf>,

	/// Print normalized frame boundaries and timestamps without cutting
	#[arg(long)]
	pub dry_run: bool,

	/// Verbose output (repeat for more verbosity: -v, -vv, -vvv)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Quiet mode - suppress all non-error output
	#[arg(short, long, conflicts_with = "verbose")]
	pub quiet: bool,
}

impl Args {
	/// Get the tracing log level filter based on verbosity settings
	pub fn log_level(&self) -> tracing::level_filters::LevelFilter {
		use tracing::level_filters::LevelFilter;

		if self.quiet {
			LevelFilter::ERROR
		} else {
			match self.verbose {
				0 => LevelFilter::WARN,
				1 => LevelFilter::INFO,
				2 => LevelFilter::DEBUG,
				_ => LevelFilter::TRACE,
			}
		}
	}

	/// Parse the raw trim specifications into frame ranges.
	pub fn parsed_trims(&self) -> Result<Vec<Trim>> {
		self.trims.iter().map(|spec| parse_trim(spec)).collect()
	}
}

/// Parse one `start:end` trim specification.
pub fn parse_trim(spec: &str) -> Result<Trim> {
	let invalid = || FramecutError::InvalidTrimSpec {
		value: spec.to_string(),
	};

	let (start, end) = spec.split_once(':').ok_or_else(invalid)?;

	let parse_bound = |bound: &str| -> Result<Option<i64>> {
		let bound = bound.trim();
		if bound.is_empty() {
			Ok(None)
		} else {
			bound.parse().map(Some).map_err(|_| invalid())
		}
	};

	Ok((parse_bound(start)?, parse_bound(end)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let args = Args::parse_from(["framecut", "-i", "clip.mkv", "-a", "audio.wav", "-t", "3:22"]);
		assert_eq!(args.precision, 3);
		assert!(args.output.is_none());
		assert!(args.timecodes.is_none());
		assert!(args.ffmpeg.is_none());
		assert!(!args.dry_run);
		assert_eq!(args.verbose, 0);
		assert!(!args.quiet);
	}

	#[test]
	fn test_multiple_trims() {
		let args = Args::parse_from([
			"framecut", "-i", "clip.mkv", "-a", "audio.wav", "-t", "3:22", "-t", "23:40",
		]);
		assert_eq!(args.parsed_trims().unwrap(), vec![(Some(3), Some(22)), (Some(23), Some(40))]);
	}

	#[test]
	fn test_parse_trim_forms() {
		assert_eq!(parse_trim("3:22").unwrap(), (Some(3), Some(22)));
		assert_eq!(parse_trim("-10:-5").unwrap(), (Some(-10), Some(-5)));
		assert_eq!(parse_trim("97:").unwrap(), (Some(97), None));
		assert_eq!(parse_trim(":10").unwrap(), (None, Some(10)));
		assert_eq!(parse_trim(":").unwrap(), (None, None));
	}

	#[test]
	fn test_parse_trim_rejects_malformed() {
		assert!(parse_trim("3").is_err());
		assert!(parse_trim("3:4:5").is_err());
		assert!(parse_trim("a:b").is_err());
		assert!(parse_trim("3.5:10").is_err());
	}

	#[test]
	fn test_negative_trim_on_command_line() {
		let args = Args::parse_from(["framecut", "-i", "c.mkv", "-a", "a.wav", "-t", "-10:-5"]);
		assert_eq!(args.parsed_trims().unwrap(), vec![(Some(-10), Some(-5))]);
	}

	#[test]
	fn test_verbosity_levels() {
		let args = Args::parse_from(["framecut", "-i", "c.mkv", "-a", "a.wav", "-t", "0:5"]);
		assert_eq!(args.log_level(), tracing::level_filters::LevelFilter::WARN);

		let args = Args::parse_from(["framecut", "-i", "c.mkv", "-a", "a.wav", "-t", "0:5", "-v"]);
		assert_eq!(args.log_level(), tracing::level_filters::LevelFilter::INFO);

		let args = Args::parse_from(["framecut", "-i", "c.mkv", "-a", "a.wav", "-t", "0:5", "-vv"]);
		assert_eq!(args.log_level(), tracing::level_filters::LevelFilter::DEBUG);

		let args = Args::parse_from(["framecut", "-i", "c.mkv", "-a", "a.wav", "-t", "0:5", "-q"]);
		assert_eq!(args.log_level(), tracing::level_filters::LevelFilter::ERROR);
	}
}

//! framecut: cut audio to match frame-range trims on a video clip
//!
//! Translates frame boundaries into timestamps and hands them to ffmpeg as
//! cut points, stream copying whenever the container allows it.

use clap::Parser;
use framecut::{
	cli::Args,
	clip::{
		Clip,
		MediaClip,
	},
	cutter::{
		self,
		CutOptions,
	},
	error::FramecutError,
	timecodes::TimecodeCache,
};
use miette::Result;
use tracing::info;
use tracing_subscriber::{
	fmt,
	prelude::*,
	EnvFilter,
};

fn main() -> Result<()> {
	// Parse CLI arguments
	let args = Args::parse();

	// Initialize tracing
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

	tracing_subscriber::registry()
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(filter)
		.init();

	// Run the application
	run(args).map_err(miette::Report::new)
}

fn run(args: Args) -> std::result::Result<(), FramecutError> {
	// Validate input file exists
	if !args.input.exists() {
		return Err(FramecutError::InputNotFound {
			path: args.input.clone(),
		});
	}

	info!(input = %args.input.display(), "Starting framecut");

	let trims = args.parsed_trims()?;

	// Probe the clip for frame count and frame rate
	let clip = MediaClip::open(&args.input)?;

	info!(
		frames = clip.num_frames(),
		fps = %clip.fps(),
		vfr = clip.fps().is_zero(),
		"Clip probed"
	);

	let options = CutOptions {
		precision: args.precision,
		timecodes_file: args.timecodes.clone(),
		ffmpeg_path: args.ffmpeg.clone(),
		quiet: args.quiet,
	};
	let mut cache = TimecodeCache::new();

	// Dry run: print the plan instead of cutting
	if args.dry_run {
		let plan = if trims.len() == 1 {
			cutter::plan_one(&clip, trims[0], &options, &mut cache)?
		} else {
			cutter::plan_many(&clip, &trims, &options, &mut cache)?
		};

		for i in 0..plan.segments() {
			println!(
				"[{}, {})  {} - {}",
				plan.starts[i], plan.ends[i], plan.start_timestamps[i], plan.end_timestamps[i]
			);
		}
		return Ok(());
	}

	let stats = cutter::cut_audio(
		&clip,
		&trims,
		&args.audio,
		args.output.as_deref(),
		&options,
		&mut cache,
	)?;

	// Print summary to stderr
	if !args.quiet {
		eprintln!();
		eprintln!("Framecut complete:");
		eprintln!("  Segments cut:  {}", stats.segments);
		eprintln!(
			"  Stream copy:   {}",
			if stats.reencoded { "no (re-encoded to WAV)" } else { "yes" }
		);
		eprintln!("  Output:        {}", stats.output.display());
	}

	Ok(())
}

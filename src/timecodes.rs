//! Timecode tables for variable-frame-rate clips
//!
//! A timecode table maps frame numbers to cumulative seconds, with entry 0
//! fixed at 0.0 and one further entry per frame. Tables come from a
//! timecodes v2 file when one is supplied, or are derived from per-frame
//! duration metadata and cached per clip.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::{
	clip::Clip,
	error::{
		FramecutError,
		Result,
	},
	rational::Rational,
};

/// Parse a timecodes v2 file (as generated by vspipe, ffms2, mkvtoolnix...).
///
/// The first line is a header and is discarded; every following line is a
/// millisecond timestamp for the frame at that position.
pub fn read_timecodes_v2(path: &Path) -> Result<Vec<f64>> {
	if !path.exists() {
		return Err(FramecutError::InputNotFound {
			path: path.to_path_buf(),
		});
	}

	let contents = fs::read_to_string(path)?;
	let mut timecodes = Vec::new();

	for (i, line) in contents.lines().skip(1).enumerate() {
		let millis: f64 = line.trim().parse().map_err(|_| FramecutError::InvalidTimecodesFile {
			path: path.to_path_buf(),
			message: format!("line {}: {line:?} is not a number", i + 2),
		})?;
		timecodes.push(millis / 1000.0);
	}

	Ok(timecodes)
}

/// Cache of derived timecode tables, keyed by clip identity.
///
/// Deriving a table walks every frame of the clip, which is by far the most
/// expensive operation here, so each clip is materialized at most once per
/// cache. Keep one cache alive for the whole process to get the same reuse
/// across repeated cuts. Single-threaded by design: the first caller builds,
/// later callers get the cached table.
#[derive(Debug, Default)]
pub struct TimecodeCache {
	tables: HashMap<String, Arc<[f64]>>,
}

impl TimecodeCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return the timecode table for `clip`, building it on first request.
	pub fn table_for(&mut self, clip: &dyn Clip) -> Result<Arc<[f64]>> {
		if let Some(table) = self.tables.get(clip.id()) {
			return Ok(Arc::clone(table));
		}

		let table: Arc<[f64]> = build_table(clip)?.into();
		self.tables.insert(clip.id().to_string(), Arc::clone(&table));
		Ok(table)
	}
}

/// Accumulate exact per-frame durations into a cumulative table.
///
/// The running total stays rational until each append, so rounding error does
/// not build up across long clips. Progress is reported at every 10% boundary
/// crossed, each at most once.
fn build_table(clip: &dyn Clip) -> Result<Vec<f64>> {
	let num_frames = clip.num_frames();
	let mut table = Vec::with_capacity(num_frames + 1);
	table.push(0.0);

	let mut current = Rational::zero();
	let mut last_percentage = 0;

	for duration in clip.frame_durations()?.take(num_frames) {
		current += duration?;
		table.push(current.to_f64());

		let percentage = (100.0 * table.len() as f64 / num_frames as f64).round() as u64;
		if percentage % 10 == 0 && percentage != last_percentage {
			info!(percent = percentage, "Finding timecodes for variable-framerate clip");
			last_percentage = percentage;
		}
	}

	Ok(table)
}

//! Frame-to-timestamp translation
//!
//! Converts absolute frame numbers into `HH:MM:SS[.fraction]` strings for
//! ffmpeg's `-ss`/`-to` arguments. Constant-frame-rate clips use exact
//! arithmetic on the frame rate; variable-frame-rate clips use a supplied
//! timecodes v2 file, or fall back to a table derived from per-frame
//! duration metadata.

use std::cmp::Ordering;
use std::path::Path;

use crate::{
	clip::Clip,
	error::{
		FramecutError,
		Result,
	},
	timecodes::{
		read_timecodes_v2,
		TimecodeCache,
	},
};

/// Translates frame numbers of one clip into timestamp strings.
///
/// A timecodes v2 file, when given, is parsed once at construction. The
/// table cache is borrowed from the caller so derived tables outlive the
/// translator and are shared across repeated cuts of the same clip.
pub struct Timestamper<'c> {
	clip: &'c dyn Clip,
	timecodes: Option<Vec<f64>>,
	cache: &'c mut TimecodeCache,
}

impl<'c> Timestamper<'c> {
	pub fn new(
		clip: &'c dyn Clip,
		timecodes_file: Option<&Path>,
		cache: &'c mut TimecodeCache,
	) -> Result<Self> {
		let timecodes = timecodes_file.map(read_timecodes_v2).transpose()?;
		Ok(Self {
			clip,
			timecodes,
			cache,
		})
	}

	/// Convert a frame number to a timestamp with the given sub-second
	/// precision (0, 3, 6 or 9 fractional digits).
	pub fn timestamp(&mut self, frame: usize, precision: u32) -> Result<String> {
		if !matches!(precision, 0 | 3 | 6 | 9) {
			return Err(FramecutError::InvalidPrecision { precision });
		}

		let fps = self.clip.fps();
		let seconds = if !fps.is_zero() {
			// Round to the nearest nanosecond in integer arithmetic so the
			// error stays bounded for arbitrarily large frame numbers.
			let nanos = round_div(
				1_000_000_000i128 * frame as i128 * fps.den as i128,
				fps.num as i128,
			);
			nanos as f64 / 1e9
		} else if let Some(timecodes) = &self.timecodes {
			*timecodes.get(frame).ok_or(FramecutError::TimecodeIndex {
				frame,
				entries: timecodes.len(),
			})?
		} else {
			let table = self.cache.table_for(self.clip)?;
			*table.get(frame).ok_or(FramecutError::TimecodeIndex {
				frame,
				entries: table.len(),
			})?
		};

		Ok(format_timestamp(seconds, precision))
	}
}

/// Integer division rounded to nearest, ties to even. Operands must be
/// non-negative.
fn round_div(numerator: i128, denominator: i128) -> i128 {
	let quotient = numerator / denominator;
	let remainder = numerator % denominator;
	match (2 * remainder).cmp(&denominator) {
		Ordering::Less => quotient,
		Ordering::Greater => quotient + 1,
		Ordering::Equal => {
			if quotient % 2 == 0 {
				quotient
			} else {
				quotient + 1
			}
		},
	}
}

fn format_timestamp(seconds: f64, precision: u32) -> String {
	let mut s = seconds;
	let mut m = (s / 60.0).floor();
	s %= 60.0;
	let h = (m / 60.0).floor();
	m %= 60.0;

	match precision {
		0 => format!("{h:02.0}:{m:02.0}:{:02}", s.round_ties_even() as i64),
		3 => format!("{h:02.0}:{m:02.0}:{s:06.3}"),
		6 => format!("{h:02.0}:{m:02.0}:{s:09.6}"),
		9 => format!("{h:02.0}:{m:02.0}:{s:012.9}"),
		_ => unreachable!("precision is validated before formatting"),
	}
}

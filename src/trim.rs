//! Frame-range trims: normalization and ordering checks
//!
//! Trims follow Python/VapourSynth slicing syntax: half-open `[start, end)`
//! ranges where either bound may be negative (counted from the end of the
//! clip) or absent.

use crate::error::{
	FramecutError,
	Result,
};

/// A half-open frame range `[start, end)`.
///
/// `None` means "unspecified": an absent start clamps to the first frame, an
/// absent end runs to the last. A clip trimmed as `src[3:-13]` is the trim
/// `(Some(3), Some(-13))`; `src[97:]` is `(Some(97), None)`.
pub type Trim = (Option<i64>, Option<i64>);

/// Resolve a single trim's bounds to absolute frame indices.
///
/// A negative start resolves to `num_frames + start`; an end that is zero or
/// negative resolves to `num_frames + end`. The asymmetry is deliberate and
/// matches slicing semantics: a start of `0` is the first frame, while an end
/// of `0` (like an absent end) means "through the last frame". A range ending
/// at frame 0 is therefore not expressible.
pub fn normalize_one(num_frames: usize, trim: Trim) -> Result<(usize, usize)> {
	let n = num_frames as i64;
	let a = trim.0.unwrap_or(0);
	let b = trim.1.unwrap_or(0);

	if a.abs() > n || b.abs() > n {
		let index = if a.abs() >= b.abs() { a } else { b };
		return Err(FramecutError::OutOfRange {
			index,
			num_frames,
		});
	}

	let start = if a >= 0 { a } else { n + a };
	let end = if b > 0 { b } else { n + b };
	Ok((start as usize, end as usize))
}

/// Resolve parallel start/end lists to absolute frame indices.
///
/// The lists must be the same length; bounds are checked for every element
/// before any conversion.
pub fn normalize_many(
	num_frames: usize,
	starts: &[Option<i64>],
	ends: &[Option<i64>],
) -> Result<(Vec<usize>, Vec<usize>)> {
	if starts.len() != ends.len() {
		return Err(FramecutError::LengthMismatch {
			starts: starts.len(),
			ends: ends.len(),
		});
	}

	let n = num_frames as i64;
	let real_starts: Vec<i64> = starts.iter().map(|a| a.unwrap_or(0)).collect();
	let real_ends: Vec<i64> = ends.iter().map(|b| b.unwrap_or(0)).collect();

	for &index in real_starts.iter().chain(real_ends.iter()) {
		if index.abs() > n {
			return Err(FramecutError::OutOfRange {
				index,
				num_frames,
			});
		}
	}

	let positive_starts = real_starts
		.iter()
		.map(|&a| if a >= 0 { a as usize } else { (n + a) as usize })
		.collect();
	let positive_ends = real_ends
		.iter()
		.map(|&b| if b > 0 { b as usize } else { (n + b) as usize })
		.collect();

	Ok((positive_starts, positive_ends))
}

/// Check that normalized ranges follow logical slicing order.
///
/// Every range must span at least one frame, and each range must end strictly
/// before the next one starts. Touching ranges (`ends[i] == starts[i + 1]`)
/// are rejected.
pub fn check_ordered(starts: &[usize], ends: &[usize]) -> bool {
	if !starts.iter().zip(ends.iter()).all(|(s, e)| s < e) {
		return false;
	}
	if !ends.iter().zip(starts.iter().skip(1)).all(|(e, next_s)| e < next_s) {
		return false;
	}
	true
}

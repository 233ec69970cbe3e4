//! framecut: frame-accurate audio cutting for trimmed video clips
//!
//! This crate converts frame-range selections on a video clip into precise
//! time-based cut instructions and drives an external ffmpeg to produce a
//! trimmed (and, for multiple ranges, concatenated) audio file matching the
//! selected frames. Both constant and variable frame rate sources are
//! handled.

pub mod cli;
pub mod clip;
pub mod cutter;
pub mod error;
pub mod rational;
pub mod timecodes;
pub mod timestamp;
pub mod trim;

pub use error::{
	FramecutError,
	Result,
};

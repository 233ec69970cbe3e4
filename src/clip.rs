//! Clip abstraction: frame count, frame rate and per-frame duration metadata

use std::path::{
	Path,
	PathBuf,
};

use ffmpeg_next::{
	self as ffmpeg,
	format,
	media,
	Packet,
};
use tracing::{
	debug,
	info,
};

use crate::{
	error::{
		FramecutError,
		Result,
	},
	rational::Rational,
};

/// A video clip as seen by the cutting core.
///
/// Only metadata is consumed: the total frame count anchors negative-index
/// resolution, the frame rate selects the timestamp strategy (`0/1` meaning
/// variable frame rate), and the duration iterator feeds the timecode table
/// builder for VFR sources.
pub trait Clip {
	/// Stable identity token, used to key the timecode table cache.
	fn id(&self) -> &str;

	/// Total number of frames.
	fn num_frames(&self) -> usize;

	/// Frame rate as an exact rational; `0/1` for variable-frame-rate clips.
	fn fps(&self) -> Rational;

	/// Sequential per-frame durations as exact rationals.
	///
	/// Yields at most `num_frames()` items. Each item is one blocking read of
	/// frame metadata; callers should iterate at most once per clip and cache
	/// the result (see `TimecodeCache`).
	fn frame_durations(&self) -> Result<Box<dyn Iterator<Item = Result<Rational>>>>;
}

/// Clip backed by a media file, probed through FFmpeg.
#[derive(Debug)]
pub struct MediaClip {
	path: PathBuf,
	id: String,
	stream_index: usize,
	num_frames: usize,
	fps: Rational,
	time_base: (i32, i32),
}

impl MediaClip {
	/// Open a media file and probe its video stream metadata.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();

		if !path.exists() {
			return Err(FramecutError::InputNotFound {
				path: path.to_path_buf(),
			});
		}

		ffmpeg::init()?;

		let ictx = format::input(path)?;

		let stream = ictx
			.streams()
			.best(media::Type::Video)
			.ok_or(FramecutError::NoVideoStream)?;
		let stream_index = stream.index();
		let time_base = (stream.time_base().numerator(), stream.time_base().denominator());

		// avg_frame_rate is unset (0) for genuinely variable-rate streams,
		// which maps straight onto the VFR sentinel.
		let rate = stream.avg_frame_rate();
		let fps = if rate.numerator() <= 0 || rate.denominator() <= 0 {
			Rational::zero()
		} else {
			Rational::new(rate.numerator() as i64, rate.denominator() as i64).reduce()
		};

		let reported = stream.frames();
		drop(ictx);

		let num_frames = if reported > 0 {
			reported as usize
		} else {
			// Container does not carry nb_frames; count video packets instead.
			info!(path = %path.display(), "Frame count not in container metadata, counting packets");
			count_video_packets(path, stream_index)?
		};

		let id = path
			.canonicalize()
			.unwrap_or_else(|_| path.to_path_buf())
			.display()
			.to_string();

		debug!(
			path = %path.display(),
			frames = num_frames,
			fps = %fps,
			stream = stream_index,
			"Probed clip"
		);

		Ok(Self {
			path: path.to_path_buf(),
			id,
			stream_index,
			num_frames,
			fps,
			time_base,
		})
	}

	/// Path of the underlying media file.
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Clip for MediaClip {
	fn id(&self) -> &str {
		&self.id
	}

	fn num_frames(&self) -> usize {
		self.num_frames
	}

	fn fps(&self) -> Rational {
		self.fps
	}

	fn frame_durations(&self) -> Result<Box<dyn Iterator<Item = Result<Rational>>>> {
		let ictx = format::input(&self.path)?;
		Ok(Box::new(FrameDurations {
			ictx,
			stream_index: self.stream_index,
			time_base: self.time_base,
			frame: 0,
			total: self.num_frames,
		}))
	}
}

/// Iterator over per-frame durations, read from video packet metadata.
struct FrameDurations {
	ictx: format::context::Input,
	stream_index: usize,
	time_base: (i32, i32),
	frame: usize,
	total: usize,
}

impl Iterator for FrameDurations {
	type Item = Result<Rational>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.frame >= self.total {
			return None;
		}

		let mut packet = Packet::empty();
		loop {
			match packet.read(&mut self.ictx) {
				Ok(()) => {
					if packet.stream() != self.stream_index {
						continue;
					}
					let frame = self.frame;
					self.frame += 1;

					let duration = packet.duration();
					if duration <= 0 {
						return Some(Err(FramecutError::FrameDuration { frame }));
					}
					return Some(Ok(
						Rational::new(duration * self.time_base.0 as i64, self.time_base.1 as i64).reduce()
					));
				},
				Err(ffmpeg::Error::Eof) => return None,
				Err(err) => return Some(Err(err.into())),
			}
		}
	}
}

fn count_video_packets(path: &Path, stream_index: usize) -> Result<usize> {
	let mut ictx = format::input(path)?;
	let count = ictx.packets().filter(|(stream, _)| stream.index() == stream_index).count();
	Ok(count)
}

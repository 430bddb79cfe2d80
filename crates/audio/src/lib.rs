//! Clipcast Audio
//!
//! Audio clip plumbing around the ffmpeg toolchain:
//! - **Probe:** Measure playback duration, with a tagged byte-length estimate as fallback
//! - **Concat:** Join clips in order, stream-copying when codecs match
//! - **Scratch:** Per-run temporary files that are always removed

pub mod concat;
pub mod probe;
pub mod scratch;

pub use concat::AudioConcatenator;
pub use probe::{estimate_from_len, DurationProbe};
pub use scratch::ScratchDir;

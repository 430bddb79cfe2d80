//! Clipcast Render Engine
//!
//! Adapter between planned compositions and the ffmpeg binary. Nothing here
//! decides timing; it only turns an effect graph, an overlay script and the
//! final audio into one encoded video.
//!
//! # Filter Graph
//!
//! ```text
//! background (looped to total) ──split──┬── segment 0 ─ trim ─ zoom ───────────┐
//!                                       ├── segment 1 ─ trim ─ zoom ─ fades ───┼─ xfade (swish)
//!                                       └── segment 2 ─ trim ─ zoom ───────────┴─ xfade (wipeup)
//!                                                                                   │
//! overlay.ass ────────────────────────────────────────────────────────────────── ass burn
//!                                                                                   │
//! audio.mp3 ───────────────────────────────────────────────────────────────── mux + encode (H.264/AAC)
//!                                                                                   ▼
//!                                                                               output.mp4
//! ```

pub mod export;
pub mod filter;

pub use export::*;
pub use filter::{build_filter_complex, FrameSize};

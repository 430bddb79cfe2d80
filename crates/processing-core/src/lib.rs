//! Clipcast Processing Core
//!
//! Turns measured durations and caption text into rendering decisions:
//! - **Transitions:** Place swish / wipe-up stages and build the effect graph
//! - **Subtitles:** Parse and emit SRT, convert timestamps to overlay format
//! - **Overlay:** Styled caption script with a per-cue reveal animation
//! - **Segmentation:** Estimate caption timing from raw text when no cues exist
//!
//! This crate is pure computation. It does no I/O and runs no external tools.
//! All inputs are data; all outputs are data.

pub mod overlay;
pub mod segmentation;
pub mod subtitles;
pub mod transitions;

pub use overlay::{OverlayEvent, OverlayScript, OverlayScriptBuilder};
pub use segmentation::segment_text;
pub use transitions::{TimingInputs, TimingViolation, TransitionPlan, TransitionPlanner};

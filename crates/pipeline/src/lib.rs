//! Clipcast Pipeline
//!
//! Runs one composition end to end, strictly in order:
//!
//! ```text
//! question ─► answer ─► speech (question, answer)
//!     ─► question clip = speech + transition sound ─► full track = question clip + answer
//!     ─► captions (transcript, or estimated from text)
//!     ─► transition plan ─► render ─► publish (optional)
//! ```
//!
//! Planning is split out as [`compose_plan`] so it can run from recorded
//! measurements without any remote service or external tool.

pub mod plan;
pub mod run;
pub mod toolkit;

pub use plan::{compose_plan, CaptionInput, CaptionMode, ComposedPlan, PlanInputs};
pub use run::{Pipeline, PipelineOutput, PipelineRequest, RunSummary, Services};
pub use toolkit::{AudioToolkit, FfmpegAudio};

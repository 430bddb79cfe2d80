//! Clipcast Common Utilities
//!
//! Shared infrastructure for all Clipcast crates:
//! - Error types and result aliases
//! - Clock, stopwatch and injectable sleeping for polling loops
//! - Tracing/logging initialization
//! - Configuration loading
//! - External tool invocation

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod process;

pub use clock::*;
pub use config::*;
pub use error::*;

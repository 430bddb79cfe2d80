//! Timed caption cues.

use serde::{Deserialize, Serialize};

/// One timed caption unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Start time in seconds (>= 0).
    pub start_secs: f64,
    /// End time in seconds (> start).
    pub end_secs: f64,
    /// Caption text. May contain `\n` line breaks.
    pub text: String,
}

/// Why a cue sequence was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CueError {
    #[error("cue {index} starts before zero")]
    NegativeStart { index: usize },

    #[error("cue {index} ends at or before its start")]
    EmptyWindow { index: usize },

    #[error("cue {index} overlaps the previous cue")]
    Overlap { index: usize },
}

impl CaptionCue {
    pub fn new(start_secs: f64, end_secs: f64, text: impl Into<String>) -> Self {
        Self {
            start_secs,
            end_secs,
            text: text.into(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Text lines with surrounding whitespace removed; blank lines dropped.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Whether the cue has no visible text.
    pub fn is_blank(&self) -> bool {
        self.lines().next().is_none()
    }
}

/// Check that cues are time-ordered, non-overlapping and well-formed.
pub fn validate_cues(cues: &[CaptionCue]) -> Result<(), CueError> {
    let mut prev_end = f64::NEG_INFINITY;
    for (index, cue) in cues.iter().enumerate() {
        if cue.start_secs < 0.0 {
            return Err(CueError::NegativeStart { index });
        }
        if cue.end_secs <= cue.start_secs {
            return Err(CueError::EmptyWindow { index });
        }
        // Allow sub-millisecond float noise at shared boundaries.
        if cue.start_secs + 1e-9 < prev_end {
            return Err(CueError::Overlap { index });
        }
        prev_end = cue.end_secs;
    }
    Ok(())
}

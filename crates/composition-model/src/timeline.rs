//! Transition stages and the effect graph.
//!
//! The effect graph is the complete visual instruction set for one render:
//! an ordered list of segments cut from the looped background track, the
//! effects applied to each, and the crossfade joins between neighbours.
//! It is derived from the stages and the target duration on every run.

use serde::{Deserialize, Serialize};

/// Kind of visual transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Zoom-and-fade accent synchronized with the transition sound.
    Swish,
    /// Wipe upwards into the answer section.
    WipeUp,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionKind::Swish => "swish",
            TransitionKind::WipeUp => "wipe_up",
        }
    }
}

/// A single visual transition placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionStage {
    pub kind: TransitionKind,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl TransitionStage {
    pub fn new(kind: TransitionKind, start_secs: f64, duration_secs: f64) -> Self {
        Self {
            kind,
            start_secs,
            duration_secs,
        }
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Half-open window overlap: touching stages do not overlap.
    pub fn overlaps(&self, other: &TransitionStage) -> bool {
        self.start_secs < other.end_secs() && other.start_secs < self.end_secs()
    }
}

/// Range cut from the looped background track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_secs: f64,
    /// `None` runs to the end of the composition.
    pub end_secs: Option<f64>,
}

/// Per-segment visual effect, applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentEffect {
    /// Scale up by `factor` and center-crop back to the original frame.
    Zoom { factor: f64 },
    /// Fade from black, segment-relative time.
    FadeIn { start_secs: f64, duration_secs: f64 },
    /// Fade to black, segment-relative time.
    FadeOut { start_secs: f64, duration_secs: f64 },
}

/// One contiguous piece of the output track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub source: SourceRange,
    pub effects: Vec<SegmentEffect>,
}

impl VideoSegment {
    pub fn new(start_secs: f64, end_secs: Option<f64>) -> Self {
        Self {
            source: SourceRange {
                start_secs,
                end_secs,
            },
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: SegmentEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Segment length given the composition length.
    pub fn duration_secs(&self, total_duration_secs: f64) -> f64 {
        self.source.end_secs.unwrap_or(total_duration_secs) - self.source.start_secs
    }
}

/// Crossfade between the output so far and the next segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossfadeJoin {
    pub transition: TransitionKind,
    pub offset_secs: f64,
    pub duration_secs: f64,
}

impl From<&TransitionStage> for CrossfadeJoin {
    fn from(stage: &TransitionStage) -> Self {
        Self {
            transition: stage.kind,
            offset_secs: stage.start_secs,
            duration_secs: stage.duration_secs,
        }
    }
}

/// Ordered rendering instructions for the visual track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectGraph {
    /// The background is looped/truncated to exactly this length.
    pub total_duration_secs: f64,
    pub segments: Vec<VideoSegment>,
    /// `joins[i]` joins the output of segments `0..=i` with segment `i + 1`.
    pub joins: Vec<CrossfadeJoin>,
}

/// Structural problems in an effect graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectGraphError {
    #[error("effect graph has no segments")]
    Empty,

    #[error("expected {expected} joins for the segment count, found {found}")]
    JoinCount { expected: usize, found: usize },

    #[error("segment {index} does not start where the previous one ends")]
    Gap { index: usize },

    #[error("segment {index} has non-positive length")]
    EmptySegment { index: usize },

    #[error("join {index} falls outside the composition")]
    JoinOutOfRange { index: usize },
}

impl EffectGraph {
    pub fn single(total_duration_secs: f64, segment: VideoSegment) -> Self {
        Self {
            total_duration_secs,
            segments: vec![segment],
            joins: Vec::new(),
        }
    }

    pub fn has_transitions(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Check contiguity and join placement.
    pub fn validate(&self) -> Result<(), EffectGraphError> {
        if self.segments.is_empty() {
            return Err(EffectGraphError::Empty);
        }
        let expected = self.segments.len() - 1;
        if self.joins.len() != expected {
            return Err(EffectGraphError::JoinCount {
                expected,
                found: self.joins.len(),
            });
        }

        let mut cursor = 0.0;
        for (index, segment) in self.segments.iter().enumerate() {
            if (segment.source.start_secs - cursor).abs() > 1e-9 {
                return Err(EffectGraphError::Gap { index });
            }
            let length = segment.duration_secs(self.total_duration_secs);
            if length <= 0.0 {
                return Err(EffectGraphError::EmptySegment { index });
            }
            cursor = segment.source.start_secs + length;
        }

        let mut prev_end = 0.0;
        for (index, join) in self.joins.iter().enumerate() {
            let end = join.offset_secs + join.duration_secs;
            if join.offset_secs <= 0.0
                || join.duration_secs <= 0.0
                || join.offset_secs + 1e-9 < prev_end
                || end > self.total_duration_secs + 1e-9
            {
                return Err(EffectGraphError::JoinOutOfRange { index });
            }
            prev_end = end;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_stages_do_not_overlap() {
        let swish = TransitionStage::new(TransitionKind::Swish, 2.6, 0.6);
        let wipe = TransitionStage::new(TransitionKind::WipeUp, 3.2, 0.8);
        assert!(!swish.overlaps(&wipe));
        assert!(!wipe.overlaps(&swish));

        let late = TransitionStage::new(TransitionKind::WipeUp, 3.0, 0.8);
        assert!(swish.overlaps(&late));
    }

    #[test]
    fn test_single_segment_graph_is_valid() {
        let graph = EffectGraph::single(
            20.0,
            VideoSegment::new(0.0, None).with_effect(SegmentEffect::Zoom { factor: 2.0 }),
        );
        assert!(graph.validate().is_ok());
        assert!(!graph.has_transitions());
    }

    #[test]
    fn test_gap_is_rejected() {
        let graph = EffectGraph {
            total_duration_secs: 10.0,
            segments: vec![
                VideoSegment::new(0.0, Some(2.0)),
                VideoSegment::new(2.5, None),
            ],
            joins: vec![CrossfadeJoin {
                transition: TransitionKind::Swish,
                offset_secs: 2.0,
                duration_secs: 0.5,
            }],
        };
        assert_eq!(graph.validate(), Err(EffectGraphError::Gap { index: 1 }));
    }

    #[test]
    fn test_join_past_end_is_rejected() {
        let graph = EffectGraph {
            total_duration_secs: 3.0,
            segments: vec![
                VideoSegment::new(0.0, Some(2.5)),
                VideoSegment::new(2.5, None),
            ],
            joins: vec![CrossfadeJoin {
                transition: TransitionKind::WipeUp,
                offset_secs: 2.5,
                duration_secs: 0.8,
            }],
        };
        assert_eq!(
            graph.validate(),
            Err(EffectGraphError::JoinOutOfRange { index: 0 })
        );
    }

    #[test]
    fn test_effect_json_is_tagged() {
        let json = serde_json::to_string(&SegmentEffect::Zoom { factor: 1.15 }).unwrap();
        assert_eq!(json, r#"{"type":"zoom","factor":1.15}"#);
    }
}

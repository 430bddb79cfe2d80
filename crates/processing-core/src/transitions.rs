//! Transition timeline planning.
//!
//! Places the visual transitions of a question/answer composition and
//! derives the effect graph handed to the rendering engine.
//!
//! # Algorithm
//!
//! 1. **Swish** starts where the transition sound starts:
//!    `question - transition_sound`. The question duration already includes
//!    the trailing transition sound.
//! 2. **Wipe-up** starts when the question clip ends and runs for the
//!    configured length, shortened if the composition ends sooner.
//! 3. **Segments**: the looped background is cut at the stage boundaries.
//!    The swish window is zoomed further and faded in/out; every segment
//!    carries the base zoom.
//! 4. **Joins**: neighbouring segments are crossfaded at each stage's start
//!    for the stage's duration.
//!
//! Timing data that cannot be trusted produces fewer stages, never a
//! misplaced one.

use std::fmt;

use clipcast_common::config::TimelineConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_composition_model::audio::DurationMeasurement;
use clipcast_composition_model::timeline::{
    CrossfadeJoin, EffectGraph, SegmentEffect, TransitionKind, TransitionStage, VideoSegment,
};
use serde::Serialize;

/// Windows shorter than this are treated as zero-length.
const MIN_STAGE_SECS: f64 = 1e-6;

/// Durations the planner works from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingInputs {
    /// Question speech plus the trailing transition sound. `None` when the
    /// measurement failed or was only an estimate.
    pub question_secs: Option<f64>,

    /// Transition sound length. `None` falls back to the configured default.
    pub transition_sound_secs: Option<f64>,

    /// Question + answer audio; the visual track is cut to exactly this.
    pub total_secs: f64,
}

impl TimingInputs {
    /// Build inputs from probe results, discarding estimated values for the
    /// two durations that position transitions.
    pub fn from_measurements(
        question: Option<DurationMeasurement>,
        transition_sound: Option<DurationMeasurement>,
        total: DurationMeasurement,
    ) -> Self {
        Self {
            question_secs: question.and_then(|m| m.exact_secs()),
            transition_sound_secs: transition_sound.and_then(|m| m.exact_secs()),
            total_secs: total.secs,
        }
    }
}

/// A precondition that removed one or more stages from the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TimingViolation {
    /// No trustworthy question duration.
    QuestionUnknown,
    /// The swish would start at or before zero.
    SoundNotShorterThanQuestion { question_secs: f64, sound_secs: f64 },
    /// The answer would be empty.
    QuestionNotShorterThanTotal { question_secs: f64, total_secs: f64 },
    /// No room left for the wipe-up after the question.
    NoRoomForWipeUp { question_secs: f64, total_secs: f64 },
}

impl fmt::Display for TimingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuestionUnknown => write!(f, "question duration unknown"),
            Self::SoundNotShorterThanQuestion {
                question_secs,
                sound_secs,
            } => write!(
                f,
                "transition sound ({sound_secs:.3}s) is not shorter than question ({question_secs:.3}s)"
            ),
            Self::QuestionNotShorterThanTotal {
                question_secs,
                total_secs,
            } => write!(
                f,
                "question ({question_secs:.3}s) is not shorter than total audio ({total_secs:.3}s)"
            ),
            Self::NoRoomForWipeUp {
                question_secs,
                total_secs,
            } => write!(
                f,
                "no room for wipe-up between {question_secs:.3}s and {total_secs:.3}s"
            ),
        }
    }
}

impl From<TimingViolation> for ClipcastError {
    fn from(violation: TimingViolation) -> Self {
        ClipcastError::invalid_timing(violation.to_string())
    }
}

/// Planner output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionPlan {
    /// Zero, one or two stages, ordered by start time.
    pub stages: Vec<TransitionStage>,
    pub graph: EffectGraph,
    /// Why stages were omitted, if any were.
    pub skipped: Vec<TimingViolation>,
}

impl TransitionPlan {
    pub fn stage(&self, kind: TransitionKind) -> Option<&TransitionStage> {
        self.stages.iter().find(|s| s.kind == kind)
    }
}

/// Places transition stages and builds the effect graph.
#[derive(Debug, Clone, Default)]
pub struct TransitionPlanner {
    config: TimelineConfig,
}

impl TransitionPlanner {
    pub fn new(config: TimelineConfig) -> Self {
        Self { config }
    }

    /// Plan stages for the given durations.
    ///
    /// Fails only when the total duration is unusable; every other problem
    /// degrades the plan and is reported in `skipped`.
    pub fn plan(&self, inputs: &TimingInputs) -> ClipcastResult<TransitionPlan> {
        let total = inputs.total_secs;
        if !total.is_finite() || total <= 0.0 {
            return Err(ClipcastError::invalid_timing(format!(
                "total audio duration must be positive, got {total}"
            )));
        }

        let sound = inputs
            .transition_sound_secs
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.config.default_transition_sound_secs);

        let (stages, skipped) = self.place_stages(inputs.question_secs, sound, total);

        for violation in &skipped {
            tracing::warn!(%violation, "Transition stage omitted");
        }

        let graph = self.build_graph(&stages, total);
        debug_assert!(graph.validate().is_ok());

        tracing::info!(
            stages = stages.len(),
            total_secs = total,
            swish_start = stages.first().map(|s| s.start_secs),
            "Transition timeline planned"
        );

        Ok(TransitionPlan {
            stages,
            graph,
            skipped,
        })
    }

    fn place_stages(
        &self,
        question: Option<f64>,
        sound: f64,
        total: f64,
    ) -> (Vec<TransitionStage>, Vec<TimingViolation>) {
        let Some(question) = question.filter(|q| q.is_finite() && *q > 0.0) else {
            return (vec![], vec![TimingViolation::QuestionUnknown]);
        };

        if question >= total {
            return (
                vec![],
                vec![TimingViolation::QuestionNotShorterThanTotal {
                    question_secs: question,
                    total_secs: total,
                }],
            );
        }

        let swish_start = question - sound;
        if swish_start <= 0.0 {
            return (
                vec![],
                vec![TimingViolation::SoundNotShorterThanQuestion {
                    question_secs: question,
                    sound_secs: sound,
                }],
            );
        }

        let swish = TransitionStage::new(TransitionKind::Swish, swish_start, sound);

        let wipe_secs = self.config.wipe_up_secs.min(total - question);
        if wipe_secs <= MIN_STAGE_SECS {
            return (
                vec![swish],
                vec![TimingViolation::NoRoomForWipeUp {
                    question_secs: question,
                    total_secs: total,
                }],
            );
        }

        let wipe = TransitionStage::new(TransitionKind::WipeUp, question, wipe_secs);
        (vec![swish, wipe], vec![])
    }

    fn build_graph(&self, stages: &[TransitionStage], total: f64) -> EffectGraph {
        let base = SegmentEffect::Zoom {
            factor: self.config.base_zoom,
        };

        let Some(swish) = stages.iter().find(|s| s.kind == TransitionKind::Swish) else {
            return EffectGraph::single(total, VideoSegment::new(0.0, None).with_effect(base));
        };
        let wipe = stages.iter().find(|s| s.kind == TransitionKind::WipeUp);

        let fade = swish.duration_secs * self.config.swish_fade_fraction;
        let swish_end = wipe.map(|w| w.start_secs);
        let swish_segment = VideoSegment::new(swish.start_secs, swish_end)
            .with_effect(base)
            .with_effect(SegmentEffect::FadeIn {
                start_secs: 0.0,
                duration_secs: fade,
            })
            .with_effect(SegmentEffect::FadeOut {
                start_secs: swish.duration_secs - fade,
                duration_secs: fade,
            })
            .with_effect(SegmentEffect::Zoom {
                factor: self.config.swish_zoom,
            });

        let mut segments = vec![
            VideoSegment::new(0.0, Some(swish.start_secs)).with_effect(base),
            swish_segment,
        ];
        let mut joins = vec![CrossfadeJoin::from(swish)];

        if let Some(wipe) = wipe {
            segments.push(VideoSegment::new(wipe.start_secs, None).with_effect(base));
            joins.push(CrossfadeJoin::from(wipe));
        }

        EffectGraph {
            total_duration_secs: total,
            segments,
            joins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn planner() -> TransitionPlanner {
        TransitionPlanner::new(TimelineConfig::default())
    }

    fn inputs(question: Option<f64>, sound: Option<f64>, total: f64) -> TimingInputs {
        TimingInputs {
            question_secs: question,
            transition_sound_secs: sound,
            total_secs: total,
        }
    }

    #[test]
    fn test_reference_scenario_three_segments() {
        let plan = planner()
            .plan(&inputs(Some(3.2), Some(0.6), 20.0))
            .unwrap();

        assert_eq!(plan.stages.len(), 2);
        let swish = plan.stage(TransitionKind::Swish).unwrap();
        let wipe = plan.stage(TransitionKind::WipeUp).unwrap();
        assert!((swish.start_secs - 2.6).abs() < 1e-9);
        assert!((swish.duration_secs - 0.6).abs() < 1e-9);
        assert!((wipe.start_secs - 3.2).abs() < 1e-9);
        assert!((wipe.duration_secs - 0.8).abs() < 1e-9);
        assert!(!swish.overlaps(wipe));

        assert_eq!(plan.graph.segments.len(), 3);
        assert_eq!(plan.graph.joins.len(), 2);
        assert_eq!(plan.graph.joins[0].transition, TransitionKind::Swish);
        assert!((plan.graph.joins[0].offset_secs - 2.6).abs() < 1e-9);
        assert_eq!(plan.graph.joins[1].transition, TransitionKind::WipeUp);
        assert!((plan.graph.joins[1].offset_secs - 3.2).abs() < 1e-9);
        assert_eq!(plan.graph.total_duration_secs, 20.0);
        assert!(plan.graph.validate().is_ok());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_swish_segment_carries_fades_and_extra_zoom() {
        let plan = planner()
            .plan(&inputs(Some(3.2), Some(0.5), 20.0))
            .unwrap();
        let swish_segment = &plan.graph.segments[1];
        assert_eq!(swish_segment.source.end_secs, Some(3.2));
        assert_eq!(swish_segment.effects.len(), 4);
        assert_eq!(swish_segment.effects[0], SegmentEffect::Zoom { factor: 2.0 });
        match swish_segment.effects[1] {
            SegmentEffect::FadeIn {
                start_secs,
                duration_secs,
            } => {
                assert_eq!(start_secs, 0.0);
                assert!((duration_secs - 0.1).abs() < 1e-9);
            }
            other => panic!("expected fade-in, got {other:?}"),
        }
        match swish_segment.effects[2] {
            SegmentEffect::FadeOut {
                start_secs,
                duration_secs,
            } => {
                assert!((start_secs - 0.4).abs() < 1e-9);
                assert!((duration_secs - 0.1).abs() < 1e-9);
            }
            other => panic!("expected fade-out, got {other:?}"),
        }
        assert_eq!(swish_segment.effects[3], SegmentEffect::Zoom { factor: 1.15 });
    }

    #[test]
    fn test_unknown_question_gives_single_zoomed_segment() {
        let plan = planner().plan(&inputs(None, Some(0.6), 12.0)).unwrap();
        assert!(plan.stages.is_empty());
        assert_eq!(plan.skipped, vec![TimingViolation::QuestionUnknown]);
        assert_eq!(plan.graph.segments.len(), 1);
        assert!(plan.graph.joins.is_empty());
        assert_eq!(
            plan.graph.segments[0].effects,
            vec![SegmentEffect::Zoom { factor: 2.0 }]
        );
    }

    #[test]
    fn test_estimated_question_duration_is_treated_as_absent() {
        let inputs = TimingInputs::from_measurements(
            Some(DurationMeasurement::estimated(3.2)),
            Some(DurationMeasurement::measured(0.6)),
            DurationMeasurement::measured(20.0),
        );
        let plan = planner().plan(&inputs).unwrap();
        assert!(plan.stages.is_empty());
    }

    #[test]
    fn test_unmeasured_sound_uses_default() {
        let plan = planner().plan(&inputs(Some(3.0), None, 20.0)).unwrap();
        let swish = plan.stage(TransitionKind::Swish).unwrap();
        assert!((swish.start_secs - 2.4).abs() < 1e-9);
        assert!((swish.duration_secs - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_sound_not_shorter_than_question_rejects_swish() {
        for sound in [0.6, 0.9] {
            let plan = planner()
                .plan(&inputs(Some(0.6), Some(sound), 20.0))
                .unwrap();
            assert!(plan.stage(TransitionKind::Swish).is_none());
            assert!(matches!(
                plan.skipped[0],
                TimingViolation::SoundNotShorterThanQuestion { .. }
            ));
        }
    }

    #[test]
    fn test_question_not_shorter_than_total_gives_no_stages() {
        for question in [20.0, 25.0] {
            let plan = planner()
                .plan(&inputs(Some(question), Some(0.6), 20.0))
                .unwrap();
            assert!(plan.stages.is_empty());
            assert_eq!(plan.graph.segments.len(), 1);
        }
    }

    #[test]
    fn test_wipe_up_is_shortened_to_fit() {
        let plan = planner()
            .plan(&inputs(Some(3.2), Some(0.6), 3.5))
            .unwrap();
        let wipe = plan.stage(TransitionKind::WipeUp).unwrap();
        assert!((wipe.duration_secs - 0.3).abs() < 1e-9);
        assert!(wipe.end_secs() <= 3.5 + 1e-9);
        assert!(plan.graph.validate().is_ok());
    }

    #[test]
    fn test_zero_width_wipe_window_leaves_swish_only() {
        let question = 3.2;
        let total = question + 1e-9;
        let plan = planner()
            .plan(&inputs(Some(question), Some(0.6), total))
            .unwrap();
        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.stages[0].kind, TransitionKind::Swish);
        assert_eq!(plan.graph.segments.len(), 2);
        assert_eq!(plan.graph.joins.len(), 1);
        assert_eq!(plan.graph.segments[1].source.end_secs, None);
    }

    #[test]
    fn test_non_positive_total_is_an_error() {
        let err = planner().plan(&inputs(Some(3.0), Some(0.6), 0.0)).unwrap_err();
        assert!(matches!(err, ClipcastError::InvalidTimingWindow { .. }));
        assert!(err.is_recoverable());
    }

    proptest! {
        #[test]
        fn prop_valid_windows_emit_two_non_overlapping_stages(
            sound in 0.05f64..2.0,
            gap in 0.05f64..10.0,
            answer in 0.05f64..120.0,
        ) {
            let question = sound + gap;
            let total = question + answer;
            let plan = planner().plan(&inputs(Some(question), Some(sound), total)).unwrap();

            prop_assert_eq!(plan.stages.len(), 2);
            let swish = plan.stages[0];
            let wipe = plan.stages[1];
            prop_assert!((swish.start_secs - (question - sound)).abs() < 1e-9);
            prop_assert!((wipe.start_secs - question).abs() < 1e-12);
            prop_assert!(!swish.overlaps(&wipe));
            prop_assert!(wipe.end_secs() <= total + 1e-9);
            prop_assert!(plan.graph.validate().is_ok());
        }

        #[test]
        fn prop_sound_at_least_question_never_emits_swish(
            question in 0.05f64..10.0,
            extra in 0.0f64..5.0,
            total in 0.1f64..120.0,
        ) {
            let sound = question + extra;
            let plan = planner().plan(&inputs(Some(question), Some(sound), total)).unwrap();
            prop_assert!(plan.stage(TransitionKind::Swish).is_none());
        }
    }
}

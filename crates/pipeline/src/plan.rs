//! Pure planning step: measurements and caption material in, transition
//! plan and overlay out.

use clipcast_common::config::AppConfig;
use clipcast_common::error::ClipcastResult;
use clipcast_composition_model::audio::DurationMeasurement;
use clipcast_composition_model::caption::CaptionCue;
use clipcast_processing_core::subtitles::parse_srt;
use clipcast_processing_core::{
    segment_text, OverlayScript, OverlayScriptBuilder, TimingInputs, TransitionPlan,
    TransitionPlanner,
};
use serde::Serialize;

/// Caption material for one run.
#[derive(Debug, Clone, Default)]
pub struct CaptionInput {
    /// SRT timed against the full track.
    pub transcript: Option<String>,
    /// Text spread from `fallback_start_secs` to the end of the track when
    /// the transcript is missing or unusable.
    pub fallback_text: String,
    pub fallback_start_secs: f64,
}

/// Everything planning needs.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    /// Question speech plus transition sound.
    pub question: Option<DurationMeasurement>,
    pub transition_sound: Option<DurationMeasurement>,
    /// Full track.
    pub total: DurationMeasurement,
    pub captions: CaptionInput,
}

/// Where the overlay's cue timing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    Transcript,
    Estimated,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedPlan {
    pub transitions: TransitionPlan,
    pub overlay: Option<OverlayScript>,
    pub caption_mode: CaptionMode,
}

/// Plan transitions and captions for one composition.
pub fn compose_plan(config: &AppConfig, inputs: &PlanInputs) -> ClipcastResult<ComposedPlan> {
    let timing =
        TimingInputs::from_measurements(inputs.question, inputs.transition_sound, inputs.total);
    let transitions = TransitionPlanner::new(config.timeline.clone()).plan(&timing)?;

    let builder = OverlayScriptBuilder::new(config.captions.clone());
    let (overlay, caption_mode) = build_overlay(config, &builder, &inputs.captions, inputs.total.secs);

    Ok(ComposedPlan {
        transitions,
        overlay,
        caption_mode,
    })
}

fn build_overlay(
    config: &AppConfig,
    builder: &OverlayScriptBuilder,
    captions: &CaptionInput,
    total_secs: f64,
) -> (Option<OverlayScript>, CaptionMode) {
    if let Some(srt) = captions.transcript.as_deref() {
        match parse_srt(srt).and_then(|cues| builder.build(&clip_to_track(cues, total_secs))) {
            Ok(script) if !script.is_empty() => return (Some(script), CaptionMode::Transcript),
            Ok(_) => tracing::warn!("Transcript has no usable cues, estimating caption timing"),
            Err(err) => {
                tracing::warn!(error = %err, "Transcript rejected, estimating caption timing")
            }
        }
    }

    let start = captions.fallback_start_secs.clamp(0.0, total_secs);
    let window = total_secs - start;
    if captions.fallback_text.trim().is_empty() || window <= 0.0 {
        return (None, CaptionMode::None);
    }

    let cues: Vec<CaptionCue> =
        segment_text(&captions.fallback_text, window, &config.captions.segmentation)
            .into_iter()
            .map(|cue| CaptionCue::new(cue.start_secs + start, cue.end_secs + start, cue.text))
            .collect();

    match builder.build(&cues) {
        Ok(script) if !script.is_empty() => (Some(script), CaptionMode::Estimated),
        Ok(_) => (None, CaptionMode::None),
        Err(err) => {
            tracing::warn!(error = %err, "Estimated captions rejected, rendering without captions");
            (None, CaptionMode::None)
        }
    }
}

/// Drop cues starting past the end of the track and cut the last one at it.
fn clip_to_track(cues: Vec<CaptionCue>, total_secs: f64) -> Vec<CaptionCue> {
    cues.into_iter()
        .filter(|c| c.start_secs < total_secs)
        .map(|mut c| {
            c.end_secs = c.end_secs.min(total_secs);
            c
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcast_composition_model::timeline::TransitionKind;

    const SRT: &str = "1\n00:00:00,500 --> 00:00:02,000\nVì sao\n\n2\n00:00:04,000 --> 00:00:07,250\nbầu trời màu xanh\n";

    fn inputs(question: Option<f64>, transcript: Option<&str>) -> PlanInputs {
        PlanInputs {
            question: question.map(DurationMeasurement::measured),
            transition_sound: Some(DurationMeasurement::measured(0.6)),
            total: DurationMeasurement::measured(20.0),
            captions: CaptionInput {
                transcript: transcript.map(str::to_string),
                fallback_text: "Bầu trời có màu xanh vì ánh sáng bị tán xạ bởi không khí.".into(),
                fallback_start_secs: 3.2,
            },
        }
    }

    #[test]
    fn test_transcript_drives_overlay() {
        let plan = compose_plan(&AppConfig::default(), &inputs(Some(3.2), Some(SRT))).unwrap();
        assert_eq!(plan.caption_mode, CaptionMode::Transcript);
        let overlay = plan.overlay.unwrap();
        assert_eq!(overlay.events.len(), 2);
        assert!((overlay.events[1].end_secs - 7.25).abs() < 1e-9);

        let swish = plan.transitions.stage(TransitionKind::Swish).unwrap();
        assert!((swish.start_secs - 2.6).abs() < 1e-9);
        assert!(plan.transitions.stage(TransitionKind::WipeUp).is_some());
    }

    #[test]
    fn test_malformed_transcript_falls_back_to_estimate_after_question() {
        let plan =
            compose_plan(&AppConfig::default(), &inputs(Some(3.2), Some("1\ngarbage\n"))).unwrap();
        assert_eq!(plan.caption_mode, CaptionMode::Estimated);
        let events = plan.overlay.unwrap().events;
        assert!((events[0].start_secs - 3.2).abs() < 1e-9);
        assert!((events.last().unwrap().end_secs - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_estimated_question_skips_transitions_but_keeps_captions() {
        let mut inputs = inputs(None, None);
        inputs.question = Some(DurationMeasurement::estimated(3.0));
        let plan = compose_plan(&AppConfig::default(), &inputs).unwrap();
        assert!(plan.transitions.stages.is_empty());
        assert_eq!(plan.transitions.graph.segments.len(), 1);
        assert_eq!(plan.caption_mode, CaptionMode::Estimated);
    }

    #[test]
    fn test_no_caption_material_renders_without_overlay() {
        let mut inputs = inputs(Some(3.2), None);
        inputs.captions.fallback_text = "   ".into();
        let plan = compose_plan(&AppConfig::default(), &inputs).unwrap();
        assert_eq!(plan.caption_mode, CaptionMode::None);
        assert!(plan.overlay.is_none());
    }

    #[test]
    fn test_cues_past_track_end_are_clipped() {
        let srt = "1\n00:00:18,000 --> 00:00:22,000\ncuối\n\n2\n00:00:25,000 --> 00:00:26,000\nthừa\n";
        let plan = compose_plan(&AppConfig::default(), &inputs(Some(3.2), Some(srt))).unwrap();
        let events = plan.overlay.unwrap().events;
        assert_eq!(events.len(), 1);
        assert!((events[0].end_secs - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_unusable_total_is_an_error() {
        let mut inputs = inputs(Some(3.2), None);
        inputs.total = DurationMeasurement::measured(0.0);
        assert!(compose_plan(&AppConfig::default(), &inputs).is_err());
    }

    #[test]
    fn test_plan_serializes_for_reports() {
        let plan = compose_plan(&AppConfig::default(), &inputs(Some(3.2), Some(SRT))).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["caption_mode"], "transcript");
        assert_eq!(json["transitions"]["stages"].as_array().unwrap().len(), 2);
    }
}

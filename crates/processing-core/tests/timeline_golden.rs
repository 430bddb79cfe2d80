use std::path::PathBuf;

use clipcast_common::config::{CaptionConfig, SegmentationConfig, TimelineConfig};
use clipcast_composition_model::audio::DurationMeasurement;
use clipcast_composition_model::timeline::TransitionKind;
use clipcast_processing_core::subtitles::{parse_overlay_time, srt_time_to_overlay};
use clipcast_processing_core::{segment_text, OverlayScriptBuilder, TimingInputs, TransitionPlanner};

fn load_fixture_srt() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("captions")
        .join("answer.srt");

    std::fs::read_to_string(path).expect("fixture captions should be readable")
}

#[test]
fn fixture_captions_become_overlay_events() {
    let script = OverlayScriptBuilder::new(CaptionConfig::default())
        .build_from_srt(&load_fixture_srt())
        .expect("fixture captions should convert");

    // The whitespace-only cue is dropped.
    assert_eq!(script.events.len(), 3);

    let text = script.to_string();
    let dialogue: Vec<&str> = text.lines().filter(|l| l.starts_with("Dialogue:")).collect();
    assert_eq!(
        dialogue,
        vec![
            "Dialogue: 0,0:00:00.00,0:00:02.48,KelvinStyle,,0,0,0,,{\\clip(0,0,0,1080)\\t(0,400,\\clip(0,0,1920,1080))}Câu hỏi hôm nay là gì?",
            "Dialogue: 0,0:00:02.48,0:00:05.91,KelvinStyle,,0,0,0,,{\\clip(0,0,0,1080)\\t(0,400,\\clip(0,0,1920,1080))}Đáp án nằm ở\\Nngay phía dưới",
            "Dialogue: 0,0:01:23.45,0:01:25.00,KelvinStyle,,0,0,0,,{\\clip(0,0,0,1080)\\t(0,400,\\clip(0,0,1920,1080))}Hẹn gặp lại (bạn)",
        ]
    );
}

#[test]
fn overlay_timestamp_round_trip_within_ten_ms() {
    for (srt, secs) in [
        ("00:01:23,456", 83.456),
        ("00:00:00,009", 0.009),
        ("02:59:59,999", 10_799.999),
    ] {
        let overlay = srt_time_to_overlay(srt).expect("valid timestamp");
        let back = parse_overlay_time(&overlay).expect("valid overlay timestamp");
        assert!(back <= secs + 1e-9);
        assert!(secs - back < 0.010 + 1e-9, "{srt} -> {overlay} -> {back}");
    }
}

#[test]
fn reference_scenario_plan_is_stable() {
    let inputs = TimingInputs::from_measurements(
        Some(DurationMeasurement::measured(3.2)),
        Some(DurationMeasurement::measured(0.6)),
        DurationMeasurement::measured(20.0),
    );
    let plan = TransitionPlanner::new(TimelineConfig::default())
        .plan(&inputs)
        .expect("plan should succeed");

    let kinds: Vec<TransitionKind> = plan.stages.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![TransitionKind::Swish, TransitionKind::WipeUp]);
    assert_eq!(plan.graph.segments.len(), 3);

    let json = serde_json::to_value(&plan.graph).expect("graph serializes");
    assert_eq!(json["segments"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["joins"][1]["transition"], "wipe_up");
    assert_eq!(json["segments"][2]["source"]["end_secs"], serde_json::Value::Null);
}

#[test]
fn fallback_captions_feed_the_overlay() {
    let text = "Trong tiếng Việt có sáu thanh điệu và mỗi thanh làm thay đổi nghĩa của từ, vì vậy hãy luyện nghe thật kỹ";
    let cues = segment_text(text, 12.0, &SegmentationConfig::default());
    let script = OverlayScriptBuilder::new(CaptionConfig::default())
        .build(&cues)
        .expect("segmented cues are valid");

    assert_eq!(script.events.len(), cues.len());
    let last = script.events.last().expect("at least one event");
    assert_eq!(last.end_secs, 12.0);
}

//! Effect graph to ffmpeg `-filter_complex` translation.

use std::fmt::Write as _;
use std::path::Path;

use clipcast_composition_model::timeline::{EffectGraph, SegmentEffect, TransitionKind};

/// Output label of the finished video chain.
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Pixel size every segment is normalized to before crossfading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Build the filter graph for a validated effect graph.
///
/// Input `0:v` is the background, already looped and cut to the total
/// duration. Each non-final segment is extended by the following crossfade
/// so the outgoing input still has frames during the transition. With
/// `frame` set, segments are rescaled to that size so xfade sees identical
/// inputs after fractional zoom crops. With `overlay` set, the caption
/// script is burned in last.
pub fn build_filter_complex(
    graph: &EffectGraph,
    frame: Option<FrameSize>,
    overlay: Option<&Path>,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let count = graph.segments.len();
    let total = graph.total_duration_secs;

    if count > 1 {
        let labels: String = (0..count).map(|i| format!("[src{i}]")).collect();
        parts.push(format!("[0:v]split={count}{labels}"));
    }

    for (i, segment) in graph.segments.iter().enumerate() {
        let input = if count > 1 {
            format!("[src{i}]")
        } else {
            "[0:v]".to_string()
        };

        let overlap = graph.joins.get(i).map(|j| j.duration_secs).unwrap_or(0.0);
        let end = (segment.source.end_secs.unwrap_or(total) + overlap).min(total);

        let mut chain = format!(
            "{input}trim=start={}:end={},setpts=PTS-STARTPTS",
            fmt_secs(segment.source.start_secs),
            fmt_secs(end)
        );
        for effect in &segment.effects {
            chain.push(',');
            chain.push_str(&effect_filter(effect));
        }
        if let Some(size) = frame {
            let _ = write!(chain, ",scale={}:{},setsar=1", size.width, size.height);
        }
        let _ = write!(chain, "[seg{i}]");
        parts.push(chain);
    }

    let mut current = "seg0".to_string();
    for (i, join) in graph.joins.iter().enumerate() {
        let next = format!("x{i}");
        parts.push(format!(
            "[{current}][seg{}]xfade=transition={}:duration={}:offset={}[{next}]",
            i + 1,
            xfade_name(join.transition),
            fmt_secs(join.duration_secs),
            fmt_secs(join.offset_secs),
        ));
        current = next;
    }

    let tail = match overlay {
        Some(path) => format!("ass='{}'", escape_filter_path(path)),
        None => "null".to_string(),
    };
    parts.push(format!("[{current}]{tail},format=yuv420p[{VIDEO_OUT_LABEL}]"));

    parts.join(";")
}

fn effect_filter(effect: &SegmentEffect) -> String {
    match *effect {
        SegmentEffect::Zoom { factor } => {
            let f = fmt_factor(factor);
            format!("scale=iw*{f}:ih*{f},crop=iw/{f}:ih/{f}:(iw-ow)/2:(ih-oh)/2")
        }
        SegmentEffect::FadeIn {
            start_secs,
            duration_secs,
        } => format!(
            "fade=t=in:st={}:d={}",
            fmt_secs(start_secs),
            fmt_secs(duration_secs)
        ),
        SegmentEffect::FadeOut {
            start_secs,
            duration_secs,
        } => format!(
            "fade=t=out:st={}:d={}",
            fmt_secs(start_secs),
            fmt_secs(duration_secs)
        ),
    }
}

fn xfade_name(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Swish => "fade",
        TransitionKind::WipeUp => "wipeup",
    }
}

fn fmt_secs(secs: f64) -> String {
    format!("{secs:.4}")
}

/// `2.0` -> `2`, `1.15` -> `1.15`.
fn fmt_factor(factor: f64) -> String {
    let s = format!("{factor:.4}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Quote a path for use inside a single-quoted filter argument.
fn escape_filter_path(path: &Path) -> String {
    let raw = path.display().to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("'\\''"),
            ':' => out.push_str("\\:"),
            _ => out.push(c),
        }
    }
    out
}

//! SRT subtitle parsing and generation, plus overlay timestamp helpers.

use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_composition_model::caption::CaptionCue;

/// Parse SRT content into cues.
///
/// Tolerates CRLF line endings, a leading BOM, missing sequence numbers and
/// `.` as the millisecond separator. Cues with no visible text are dropped.
/// Multi-line cue text is joined with `\n`.
pub fn parse_srt(content: &str) -> ClipcastResult<Vec<CaptionCue>> {
    let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut cues = Vec::new();

    for (block_index, block) in normalized.split("\n\n").enumerate() {
        let mut lines = block.lines().map(str::trim_end).skip_while(|l| l.trim().is_empty());

        let Some(first) = lines.next() else {
            continue;
        };
        let timing_line = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(line) if line.contains("-->") => line,
                _ => {
                    return Err(ClipcastError::caption(format!(
                        "block {} has no timing line",
                        block_index + 1
                    )))
                }
            }
        };

        let (start, end) = parse_timing_line(timing_line).ok_or_else(|| {
            ClipcastError::caption(format!("malformed timing line: {timing_line:?}"))
        })?;

        let text = lines
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            tracing::debug!(block = block_index + 1, "Skipping empty SRT cue");
            continue;
        }

        cues.push(CaptionCue::new(start, end, text));
    }

    Ok(cues)
}

/// Generate SRT content from cues, numbered from 1.
pub fn generate_srt(cues: &[CaptionCue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_secs),
            format_srt_time(cue.end_secs),
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
pub fn format_srt_time(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`, `.` also accepted) into seconds.
pub fn parse_srt_time(value: &str) -> Option<f64> {
    let ms = parse_srt_millis(value)?;
    Some(ms as f64 / 1000.0)
}

/// Convert `HH:MM:SS,mmm` to the overlay's `H:MM:SS.cc` form.
///
/// Centiseconds are truncated, never rounded up.
pub fn srt_time_to_overlay(value: &str) -> Option<String> {
    parse_srt_millis(value).map(format_overlay_millis)
}

/// Format seconds as an overlay timestamp: `H:MM:SS.cc`.
pub fn format_overlay_time(secs: f64) -> String {
    format_overlay_millis((secs.max(0.0) * 1000.0).round() as u64)
}

/// Parse an overlay timestamp `H:MM:SS.cc` into seconds.
pub fn parse_overlay_time(value: &str) -> Option<f64> {
    let (hms, cc) = value.trim().split_once('.')?;
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || cc.len() != 2 || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let centis: u64 = cc.parse().ok()?;
    let total_cs = ((hours * 60 + minutes) * 60 + seconds) * 100 + centis;
    Some(total_cs as f64 / 100.0)
}

fn format_overlay_millis(total_ms: u64) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let centis = (total_ms % 1000) / 10;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    // Cue settings may follow the end timestamp.
    let end = rest.split_whitespace().next()?;
    Some((parse_srt_time(start)?, parse_srt_time(end)?))
}

fn parse_srt_millis(value: &str) -> Option<u64> {
    let value = value.trim();
    let (hms, ms) = value.split_once([',', '.'])?;
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    if ms.is_empty() || ms.len() > 3 || !ms.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "5" means 500 ms, "05" means 50 ms.
    let millis: u64 = format!("{ms:0<3}").parse().ok()?;
    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

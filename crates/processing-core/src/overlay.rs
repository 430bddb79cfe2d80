//! Styled caption overlay scripts.
//!
//! Converts timed cues into an Advanced SubStation Alpha script: a style
//! header plus one dialogue line per cue. Every line opens with a
//! left-to-right reveal, done by animating a clip rectangle from zero width
//! to the full canvas over the configured reveal time.

use std::fmt;

use clipcast_common::config::{CaptionConfig, OverlayStyle};
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_composition_model::caption::{validate_cues, CaptionCue};
use serde::Serialize;

use crate::subtitles::{format_overlay_time, parse_srt};

/// One dialogue line of the overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayEvent {
    pub start_secs: f64,
    pub end_secs: f64,
    /// Absolute reveal window. Starts with the cue, never outlasts it.
    pub reveal_start_secs: f64,
    pub reveal_end_secs: f64,
    /// Cue text with line breaks kept as `\n`.
    pub text: String,
}

impl OverlayEvent {
    /// Reveal length in whole milliseconds, relative to the line start.
    pub fn reveal_ms(&self) -> u64 {
        ((self.reveal_end_secs - self.reveal_start_secs).max(0.0) * 1000.0).round() as u64
    }
}

/// A complete overlay script ready for the rendering engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayScript {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub style: OverlayStyle,
    pub events: Vec<OverlayEvent>,
}

impl OverlayScript {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn style_line(&self) -> String {
        let s = &self.style;
        format!(
            "Style: {},{},{},{},{},{},{},{},0,0,0,100,100,0,0,1,{},{},{},{},{},{},1",
            s.name,
            s.font_name,
            s.font_size,
            s.primary_colour,
            s.secondary_colour,
            s.outline_colour,
            s.back_colour,
            u8::from(s.bold),
            s.outline,
            s.shadow,
            s.alignment,
            s.margin_l,
            s.margin_r,
            s.margin_v,
        )
    }

    fn dialogue_line(&self, event: &OverlayEvent) -> String {
        let (w, h) = (self.play_res_x, self.play_res_y);
        format!(
            "Dialogue: 0,{},{},{},,0,0,0,,{{\\clip(0,0,0,{h})\\t(0,{},\\clip(0,0,{w},{h}))}}{}",
            format_overlay_time(event.start_secs),
            format_overlay_time(event.end_secs),
            self.style.name,
            event.reveal_ms(),
            escape_text(&event.text),
        )
    }
}

impl fmt::Display for OverlayScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Script Info]")?;
        writeln!(f, "ScriptType: v4.00+")?;
        writeln!(f, "PlayResX: {}", self.play_res_x)?;
        writeln!(f, "PlayResY: {}", self.play_res_y)?;
        writeln!(f)?;
        writeln!(f, "[V4+ Styles]")?;
        writeln!(
            f,
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
        )?;
        writeln!(f, "{}", self.style_line())?;
        writeln!(f)?;
        writeln!(f, "[Events]")?;
        writeln!(
            f,
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
        )?;
        for event in &self.events {
            writeln!(f, "{}", self.dialogue_line(event))?;
        }
        Ok(())
    }
}

/// Builds overlay scripts from cues.
#[derive(Debug, Clone, Default)]
pub struct OverlayScriptBuilder {
    config: CaptionConfig,
}

impl OverlayScriptBuilder {
    pub fn new(config: CaptionConfig) -> Self {
        Self { config }
    }

    /// Build a script from time-ordered cues.
    ///
    /// Blank cues are dropped before validation; the remaining cues must be
    /// ordered and non-overlapping.
    pub fn build(&self, cues: &[CaptionCue]) -> ClipcastResult<OverlayScript> {
        let kept: Vec<&CaptionCue> = cues.iter().filter(|c| !c.is_blank()).collect();
        let dropped = cues.len() - kept.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped blank caption cues");
        }

        let owned: Vec<CaptionCue> = kept.into_iter().cloned().collect();
        validate_cues(&owned).map_err(|e| ClipcastError::caption(e.to_string()))?;

        let events = owned
            .into_iter()
            .map(|cue| {
                let reveal_end = (cue.start_secs + self.config.reveal_secs).min(cue.end_secs);
                OverlayEvent {
                    start_secs: cue.start_secs,
                    end_secs: cue.end_secs,
                    reveal_start_secs: cue.start_secs,
                    reveal_end_secs: reveal_end,
                    text: cue.lines().collect::<Vec<_>>().join("\n"),
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(events = events.len(), "Built caption overlay");

        Ok(OverlayScript {
            play_res_x: self.config.play_res_x,
            play_res_y: self.config.play_res_y,
            style: self.config.style.clone(),
            events,
        })
    }

    /// Parse SRT content and build its overlay.
    pub fn build_from_srt(&self, srt: &str) -> ClipcastResult<OverlayScript> {
        let cues = parse_srt(srt)?;
        self.build(&cues)
    }
}

/// Line breaks become `\N`; braces would open override blocks, so they are
/// replaced with parentheses.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push_str("\\N");
        }
        for c in line.chars() {
            match c {
                '{' => out.push('('),
                '}' => out.push(')'),
                _ => out.push(c),
            }
        }
    }
    out
}

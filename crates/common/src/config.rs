//! Application configuration.
//!
//! Every component receives its own section at construction; nothing reads
//! the process environment behind the caller's back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ClipcastError, ClipcastResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// External media tool locations.
    pub tools: ToolsConfig,

    /// Duration probe behaviour.
    pub probe: ProbeConfig,

    /// Transition planner constants.
    pub timeline: TimelineConfig,

    /// Caption overlay styling and fallback segmentation.
    pub captions: CaptionConfig,

    /// Rendering engine encode settings.
    pub render: RenderConfig,

    /// Publishing service settings.
    pub publish: PublishConfig,

    /// Text generation, speech and transcription services.
    pub providers: ProviderConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipcast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Paths to the ffmpeg toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

/// Duration probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Assumed bitrate for the byte-length estimate when measuring fails.
    pub fallback_bitrate_bps: u32,
}

/// Transition timeline constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Used when the transition sound could not be measured.
    pub default_transition_sound_secs: f64,

    /// Length of the wipe-up stage after the question.
    pub wipe_up_secs: f64,

    /// Extra zoom applied during the swish window.
    pub swish_zoom: f64,

    /// Fraction of the swish window used for each of the fade in/out.
    pub swish_fade_fraction: f64,

    /// Uniform zoom applied to the background before cropping back.
    pub base_zoom: f64,
}

/// Visual style of the caption overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    /// Colours in `&HAABBGGRR` notation.
    pub primary_colour: String,
    pub secondary_colour: String,
    pub outline_colour: String,
    pub back_colour: String,
    pub bold: bool,
    pub outline: u32,
    pub shadow: u32,
    /// Numpad alignment (2 = bottom centre).
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

/// Caption converter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Duration of the left-to-right reveal at the start of every cue.
    pub reveal_secs: f64,

    /// Script canvas size; also the fully-open reveal clip.
    pub play_res_x: u32,
    pub play_res_y: u32,

    pub style: OverlayStyle,

    pub segmentation: SegmentationConfig,
}

/// Fallback caption segmentation when no time-coded cues exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// A final chunk shorter than this borrows words from its predecessor.
    pub min_chars: usize,

    /// Hard cap for a multi-word chunk.
    pub max_chars: usize,

    /// Largest `max_chars` accepted by validation.
    pub ceiling_chars: usize,

    /// Assumed reading rate.
    pub chars_per_second: f64,

    pub min_cue_secs: f64,
    pub max_cue_secs: f64,
}

/// Encoder settings handed to the rendering engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    pub audio_codec: String,
    pub audio_bitrate_kbps: u32,
    pub pixel_format: String,
}

/// Publishing service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub base_url: String,

    /// Declared and used chunk size in bytes.
    pub chunk_size: u64,

    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,

    pub title_max_chars: usize,
    pub privacy_level: String,
    pub cover_timestamp_ms: u64,

    /// Per-request HTTP timeout. `None` keeps the transport default.
    pub request_timeout_secs: Option<u64>,
}

/// External collaborator endpoints and identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub openai_base_url: String,
    pub text_model: String,
    pub question_max_tokens: u32,
    pub answer_max_tokens: u32,
    pub transcription_model: String,
    pub transcription_language: String,

    pub minimax_base_url: String,
    pub tts_model: String,
    pub question_voice_id: String,
    pub answer_voice_id: String,
    pub language_boost: String,
    pub sample_rate: u32,
    pub bitrate: u32,

    /// Per-request HTTP timeout. `None` keeps the transport default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            fallback_bitrate_bps: 128_000,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_transition_sound_secs: 0.6,
            wipe_up_secs: 0.8,
            swish_zoom: 1.15,
            swish_fade_fraction: 0.2,
            base_zoom: 2.0,
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            name: "KelvinStyle".to_string(),
            font_name: "Montserrat".to_string(),
            font_size: 42,
            primary_colour: "&H00FFFFFF".to_string(),
            secondary_colour: "&H00000000".to_string(),
            outline_colour: "&H00000000".to_string(),
            back_colour: "&H64000000".to_string(),
            bold: true,
            outline: 6,
            shadow: 2,
            alignment: 2,
            margin_l: 30,
            margin_r: 30,
            margin_v: 60,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            reveal_secs: 0.4,
            play_res_x: 1920,
            play_res_y: 1080,
            style: OverlayStyle::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_chars: 15,
            max_chars: 50,
            ceiling_chars: 80,
            chars_per_second: 3.5,
            min_cue_secs: 1.5,
            max_cue_secs: 4.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate_kbps: 192,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open.tiktokapis.com/v2".to_string(),
            chunk_size: 10_000_000,
            poll_interval_secs: 10,
            max_poll_attempts: 30,
            title_max_chars: 150,
            privacy_level: "PUBLIC_TO_EVERYONE".to_string(),
            cover_timestamp_ms: 1000,
            request_timeout_secs: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4o".to_string(),
            question_max_tokens: 100,
            answer_max_tokens: 900,
            transcription_model: "whisper-1".to_string(),
            transcription_language: "vi".to_string(),
            minimax_base_url: "https://api.minimax.io/v1".to_string(),
            tts_model: "speech-2.6-turbo".to_string(),
            question_voice_id: "Vietnamese_female_4_v1".to_string(),
            answer_voice_id: "female-shaonv".to_string(),
            language_boost: "Vietnamese".to_string(),
            sample_rate: 32_000,
            bitrate: 128_000,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &std::path::Path) -> ClipcastResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Reject settings no component can work with.
    pub fn validate(&self) -> ClipcastResult<()> {
        let seg = &self.captions.segmentation;
        if seg.max_chars == 0 || seg.max_chars > seg.ceiling_chars {
            return Err(ClipcastError::config(format!(
                "captions.segmentation.max_chars must be in 1..={}, got {}",
                seg.ceiling_chars, seg.max_chars
            )));
        }
        if seg.min_chars > seg.max_chars {
            return Err(ClipcastError::config(
                "captions.segmentation.min_chars exceeds max_chars",
            ));
        }
        if seg.chars_per_second <= 0.0 {
            return Err(ClipcastError::config(
                "captions.segmentation.chars_per_second must be positive",
            ));
        }
        if seg.min_cue_secs <= 0.0 || seg.min_cue_secs > seg.max_cue_secs {
            return Err(ClipcastError::config(
                "captions.segmentation cue bounds must satisfy 0 < min <= max",
            ));
        }
        if self.captions.reveal_secs <= 0.0 {
            return Err(ClipcastError::config("captions.reveal_secs must be positive"));
        }
        if self.timeline.wipe_up_secs <= 0.0 || self.timeline.default_transition_sound_secs <= 0.0
        {
            return Err(ClipcastError::config(
                "timeline stage durations must be positive",
            ));
        }
        if self.timeline.base_zoom < 1.0 || self.timeline.swish_zoom < 1.0 {
            return Err(ClipcastError::config("timeline zoom factors must be >= 1.0"));
        }
        if self.probe.fallback_bitrate_bps == 0 {
            return Err(ClipcastError::config(
                "probe.fallback_bitrate_bps must be positive",
            ));
        }
        if self.publish.chunk_size == 0 {
            return Err(ClipcastError::config("publish.chunk_size must be positive"));
        }
        if self.publish.max_poll_attempts == 0 {
            return Err(ClipcastError::config(
                "publish.max_poll_attempts must be positive",
            ));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipcast").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = AppConfig::default();
        assert_eq!(config.publish.chunk_size, 10_000_000);
        assert_eq!(config.publish.poll_interval_secs, 10);
        assert_eq!(config.publish.max_poll_attempts, 30);
        assert!((config.timeline.default_transition_sound_secs - 0.6).abs() < 1e-12);
        assert!((config.captions.reveal_secs - 0.4).abs() < 1e-12);
        assert_eq!(config.captions.segmentation.max_chars, 50);
    }

    #[test]
    fn test_partial_json_falls_back_to_section_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"publish":{"chunk_size":5000000}}"#).unwrap();
        assert_eq!(config.publish.chunk_size, 5_000_000);
        assert_eq!(config.publish.max_poll_attempts, 30);
        assert_eq!(config.tools.ffmpeg_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_validate_rejects_chunk_cap_above_ceiling() {
        let mut config = AppConfig::default();
        config.captions.segmentation.max_chars = 81;
        assert!(matches!(
            config.validate(),
            Err(ClipcastError::Config { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"logging":{"level":"debug"}}"#).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }
}

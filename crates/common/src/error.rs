//! Error types shared across Clipcast crates.

use std::path::PathBuf;

/// Top-level error type for Clipcast operations.
///
/// Timing failures (`Measurement`, `InvalidTimingWindow`) are recoverable:
/// callers degrade to a simpler rendering plan. Everything touching the
/// concatenator or the publishing service aborts the current run.
#[derive(Debug, thiserror::Error)]
pub enum ClipcastError {
    #[error("Measurement error: {message}")]
    Measurement { message: String },

    #[error("Invalid timing window: {message}")]
    InvalidTimingWindow { message: String },

    #[error("Concatenation error: {message}")]
    Concatenation { message: String },

    #[error("Upload session init failed: {message}")]
    SessionInit { message: String },

    #[error("Chunk upload failed at offset {offset}: {message}")]
    ChunkUpload { offset: u64, message: String },

    #[error("Publish failed for {publish_id}: {message}")]
    PublishFailed { publish_id: String, message: String },

    #[error("Publish status for {publish_id} still pending after {attempts} attempts")]
    PublishTimeout { publish_id: String, attempts: u32 },

    #[error("Caption error: {message}")]
    Caption { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("{service} error: {message}")]
    Provider { service: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClipcastError.
pub type ClipcastResult<T> = Result<T, ClipcastError>;

impl ClipcastError {
    pub fn measurement(msg: impl Into<String>) -> Self {
        Self::Measurement {
            message: msg.into(),
        }
    }

    pub fn invalid_timing(msg: impl Into<String>) -> Self {
        Self::InvalidTimingWindow {
            message: msg.into(),
        }
    }

    pub fn concatenation(msg: impl Into<String>) -> Self {
        Self::Concatenation {
            message: msg.into(),
        }
    }

    pub fn session_init(msg: impl Into<String>) -> Self {
        Self::SessionInit {
            message: msg.into(),
        }
    }

    pub fn caption(msg: impl Into<String>) -> Self {
        Self::Caption {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn provider(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            service: service.into(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the pipeline may continue with a degraded plan.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Measurement { .. } | Self::InvalidTimingWindow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_split_follows_taxonomy() {
        assert!(ClipcastError::measurement("ffprobe missing").is_recoverable());
        assert!(ClipcastError::invalid_timing("negative offset").is_recoverable());
        assert!(!ClipcastError::concatenation("bad header").is_recoverable());
        assert!(!ClipcastError::session_init("no publish_id").is_recoverable());
        assert!(!ClipcastError::PublishTimeout {
            publish_id: "p1".into(),
            attempts: 30
        }
        .is_recoverable());
    }

    #[test]
    fn test_service_message_is_kept_verbatim() {
        let raw = r#"{"error":{"code":"spam_risk_too_many_posts","message":"limit"}}"#;
        let err = ClipcastError::ChunkUpload {
            offset: 10_000_000,
            message: raw.to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("offset 10000000"));
        assert!(rendered.ends_with(raw));
    }
}

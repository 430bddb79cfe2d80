//! Clipcast Providers
//!
//! The remote collaborators a pipeline run talks to, each behind a trait so
//! runs can be driven by fakes:
//! - **Text:** question and answer generation (`TextGenerator`)
//! - **Speech:** text-to-speech (`SpeechSynthesizer`)
//! - **Transcription:** audio to time-coded SRT (`Transcriber`)

pub mod minimax;
pub mod openai;
pub mod prompts;
pub mod text;

use async_trait::async_trait;
use clipcast_common::error::ClipcastResult;

pub use minimax::MiniMaxClient;
pub use openai::OpenAiClient;
pub use text::{clean_generated_question, normalize_speech_text};

/// One chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the trimmed completion text. Empty output is an error.
    async fn generate(&self, request: &TextRequest) -> ClipcastResult<String>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice_id`, returning encoded audio bytes.
    async fn synthesize(&self, text: &str, voice_id: &str) -> ClipcastResult<Vec<u8>>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio clip to SRT text.
    async fn transcribe(&self, audio: &[u8]) -> ClipcastResult<String>;
}

/// Shared HTTP client construction.
pub(crate) fn http_client(timeout_secs: Option<u64>) -> ClipcastResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(std::time::Duration::from_secs(secs));
    }
    builder.build().map_err(|e| {
        clipcast_common::error::ClipcastError::config(format!(
            "Failed to create HTTP client: {e}"
        ))
    })
}

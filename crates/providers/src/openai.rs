//! OpenAI-compatible chat completion and transcription client.

use async_trait::async_trait;
use clipcast_common::config::ProviderConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult};
use serde::{Deserialize, Serialize};

use crate::{http_client, TextGenerator, TextRequest, Transcriber};

const SERVICE: &str = "OpenAI";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_completion_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's text out of a completion body.
fn parse_chat_response(body: &str) -> ClipcastResult<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ClipcastError::provider(SERVICE, format!("invalid response ({e}): {body}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ClipcastError::provider(SERVICE, "No content generated"))
}

/// Chat completions for text, whisper-style transcription for captions.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    transcription_model: String,
    language: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("transcription_model", &self.transcription_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, config: &ProviderConfig) -> ClipcastResult<Self> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            api_key: api_key.into(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            transcription_model: config.transcription_model.clone(),
            language: config.transcription_language.clone(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn transcription_url(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &TextRequest) -> ClipcastResult<String> {
        let body = ChatRequest {
            model: &self.text_model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        tracing::debug!(model = %self.text_model, max_tokens = request.max_tokens, "Requesting completion");
        let resp = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClipcastError::provider(SERVICE, format!("Network error: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClipcastError::provider(SERVICE, format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(ClipcastError::provider(SERVICE, format!("({status}) {text}")));
        }

        let content = parse_chat_response(&text)?;
        tracing::info!(chars = content.chars().count(), "Completion received");
        Ok(content)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: &[u8]) -> ClipcastResult<String> {
        let file = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| ClipcastError::provider(SERVICE, format!("invalid mime type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.transcription_model.clone())
            .text("language", self.language.clone())
            .text("response_format", "srt")
            .text("temperature", "0");

        tracing::debug!(bytes = audio.len(), language = %self.language, "Requesting transcription");
        let resp = self
            .client
            .post(self.transcription_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClipcastError::provider(SERVICE, format!("Network error: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClipcastError::provider(SERVICE, format!("Failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(ClipcastError::provider(SERVICE, format!("({status}) {text}")));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response_trims_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Vì sao?\n"}},{"message":{"content":"x"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Vì sao?");
    }

    #[test]
    fn test_parse_chat_response_empty_is_error() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
            r#"{"choices":[{}]}"#,
        ] {
            let err = parse_chat_response(body).unwrap_err();
            assert!(matches!(err, ClipcastError::Provider { .. }), "{body}");
        }
    }

    #[test]
    fn test_parse_chat_response_keeps_raw_body_on_garbage() {
        let err = parse_chat_response("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("<html>bad gateway</html>"));
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
            max_completion_tokens: 900,
            temperature: 0.7,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
        assert_eq!(json["max_completion_tokens"], 900);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_urls_and_debug() {
        let config = ProviderConfig {
            openai_base_url: "http://localhost:9000/v1/".into(),
            ..ProviderConfig::default()
        };
        let client = OpenAiClient::new("sk-secret", &config).unwrap();
        assert_eq!(client.chat_url(), "http://localhost:9000/v1/chat/completions");
        assert_eq!(
            client.transcription_url(),
            "http://localhost:9000/v1/audio/transcriptions"
        );
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}

//! MiniMax text-to-speech client.

use async_trait::async_trait;
use clipcast_common::config::ProviderConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult};
use serde::{Deserialize, Serialize};

use crate::text::normalize_speech_text;
use crate::{http_client, SpeechSynthesizer};

const SERVICE: &str = "MiniMax";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    text: &'a str,
    stream: bool,
    output_format: &'a str,
    language_boost: &'a str,
    voice_setting: VoiceSetting<'a>,
    audio_setting: AudioSetting,
}

#[derive(Debug, Serialize)]
struct VoiceSetting<'a> {
    voice_id: &'a str,
    speed: f32,
    vol: f32,
    pitch: i32,
}

#[derive(Debug, Serialize)]
struct AudioSetting {
    sample_rate: u32,
    bitrate: u32,
    format: &'static str,
    channel: u32,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    #[serde(default)]
    base_resp: Option<BaseResp>,
    #[serde(default)]
    data: Option<SpeechData>,
}

#[derive(Debug, Deserialize)]
struct BaseResp {
    status_code: i64,
    #[serde(default)]
    status_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechData {
    #[serde(default)]
    audio: Option<String>,
}

/// Decode a hex string, ignoring embedded whitespace.
fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| (b as char).to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect())
}

/// Decode the JSON form of a synthesis response into audio bytes.
fn decode_speech_response(body: &str) -> ClipcastResult<Vec<u8>> {
    let parsed: SpeechResponse = serde_json::from_str(body)
        .map_err(|e| ClipcastError::provider(SERVICE, format!("invalid response ({e}): {body}")))?;

    if let Some(base) = parsed.base_resp {
        if base.status_code != 0 {
            let message = base
                .status_msg
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Status code: {}", base.status_code));
            return Err(ClipcastError::provider(SERVICE, message));
        }
    }

    let hex = parsed
        .data
        .and_then(|d| d.audio)
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ClipcastError::provider(SERVICE, "audio data not found in response"))?;
    decode_hex(&hex).ok_or_else(|| ClipcastError::provider(SERVICE, "audio data is not valid hex"))
}

fn is_raw_audio(content_type: &str) -> bool {
    content_type.contains("audio/") || content_type.contains("application/octet-stream")
}

/// Speech synthesis over the `t2a_v2` endpoint. Output is mono MP3.
pub struct MiniMaxClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    language_boost: String,
    sample_rate: u32,
    bitrate: u32,
}

impl std::fmt::Debug for MiniMaxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniMaxClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl MiniMaxClient {
    pub fn new(api_key: impl Into<String>, config: &ProviderConfig) -> ClipcastResult<Self> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            api_key: api_key.into(),
            base_url: config.minimax_base_url.trim_end_matches('/').to_string(),
            model: config.tts_model.clone(),
            language_boost: config.language_boost.clone(),
            sample_rate: config.sample_rate,
            bitrate: config.bitrate,
        })
    }

    fn speech_url(&self) -> String {
        format!("{}/t2a_v2", self.base_url)
    }

    fn request<'a>(&'a self, text: &'a str, voice_id: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.model,
            text,
            stream: false,
            output_format: "hex",
            language_boost: &self.language_boost,
            voice_setting: VoiceSetting {
                voice_id,
                speed: 1.0,
                vol: 1.0,
                pitch: 0,
            },
            audio_setting: AudioSetting {
                sample_rate: self.sample_rate,
                bitrate: self.bitrate,
                format: "mp3",
                channel: 1,
            },
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MiniMaxClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> ClipcastResult<Vec<u8>> {
        let normalized = normalize_speech_text(text);
        if normalized.is_empty() {
            return Err(ClipcastError::provider(SERVICE, "nothing to synthesize"));
        }

        tracing::debug!(voice_id, chars = normalized.chars().count(), "Requesting speech");
        let resp = self
            .client
            .post(self.speech_url())
            .bearer_auth(&self.api_key)
            .json(&self.request(&normalized, voice_id))
            .send()
            .await
            .map_err(|e| ClipcastError::provider(SERVICE, format!("Network error: {e}")))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClipcastError::provider(SERVICE, format!("({status}) {body}")));
        }

        let audio = if is_raw_audio(&content_type) {
            resp.bytes()
                .await
                .map_err(|e| ClipcastError::provider(SERVICE, format!("Failed to read audio: {e}")))?
                .to_vec()
        } else {
            let body = resp.text().await.map_err(|e| {
                ClipcastError::provider(SERVICE, format!("Failed to read response: {e}"))
            })?;
            decode_speech_response(&body)?
        };

        tracing::info!(voice_id, bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}

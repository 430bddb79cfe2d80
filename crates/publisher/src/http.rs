//! HTTP implementation of the publishing service calls.

use std::time::Duration;

use async_trait::async_trait;
use clipcast_common::config::PublishConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_composition_model::upload::ChunkRange;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::{InitRequest, InitResponse, PublishApi, StatusReport};

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: Option<String>,
}

impl EnvelopeError {
    fn is_error(&self) -> bool {
        matches!(self.code.as_deref(), Some(code) if code != "ok")
    }
}

/// Publishing service over HTTPS with a bearer token.
pub struct HttpPublishApi {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl std::fmt::Debug for HttpPublishApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPublishApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpPublishApi {
    pub fn new(access_token: impl Into<String>, config: &PublishConfig) -> ClipcastResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClipcastError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn init_url(&self) -> String {
        format!("{}/post/publish/inbox/video/init/", self.base_url)
    }

    fn status_url(&self) -> String {
        format!("{}/post/publish/status/fetch/", self.base_url)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Decode an envelope, returning `None` when the body or the embedded error
/// code says the call failed.
fn decode_envelope<T: DeserializeOwned + Default>(body: &str) -> Option<T> {
    let envelope: Envelope<T> = serde_json::from_str(body).ok()?;
    if envelope.error.as_ref().is_some_and(EnvelopeError::is_error) {
        return None;
    }
    Some(envelope.data.unwrap_or_default())
}

#[async_trait]
impl PublishApi for HttpPublishApi {
    async fn init_upload(&self, request: &InitRequest) -> ClipcastResult<InitResponse> {
        let resp = self
            .client
            .post(self.init_url())
            .header("Authorization", self.bearer())
            .json(request)
            .send()
            .await
            .map_err(|e| ClipcastError::session_init(format!("Network error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClipcastError::session_init(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ClipcastError::session_init(format!(
                "init upload error ({status}): {body}"
            )));
        }

        decode_envelope(&body)
            .ok_or_else(|| ClipcastError::session_init(format!("init upload error: {body}")))
    }

    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: &ChunkRange,
        bytes: &[u8],
    ) -> ClipcastResult<()> {
        let chunk_error = |message: String| ClipcastError::ChunkUpload {
            offset: range.start,
            message,
        };

        let resp = self
            .client
            .put(upload_url)
            .header("Content-Type", "video/mp4")
            .header("Content-Range", range.content_range())
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| chunk_error(format!("Network error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(chunk_error(format!("upload chunk error ({status}): {body}")));
        }
        Ok(())
    }

    async fn complete_upload(&self, publish_id: &str) -> ClipcastResult<StatusReport> {
        self.fetch_status(publish_id).await
    }

    async fn fetch_status(&self, publish_id: &str) -> ClipcastResult<StatusReport> {
        let failed = |message: String| ClipcastError::PublishFailed {
            publish_id: publish_id.to_string(),
            message,
        };

        let resp = self
            .client
            .get(self.status_url())
            .query(&[("publish_id", publish_id)])
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| failed(format!("Network error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| failed(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(failed(format!("status check error ({status}): {body}")));
        }

        decode_envelope(&body).ok_or_else(|| failed(format!("status check error: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_ok_error_code_yields_data() {
        let body = r#"{"data":{"publish_id":"v_pub_1","upload_url":"https://up/1"},"error":{"code":"ok","message":""}}"#;
        let parsed: InitResponse = decode_envelope(body).unwrap();
        assert_eq!(parsed.publish_id.as_deref(), Some("v_pub_1"));
        assert_eq!(parsed.upload_url.as_deref(), Some("https://up/1"));
    }

    #[test]
    fn test_envelope_without_data_is_empty_not_error() {
        let parsed: InitResponse = decode_envelope("{}").unwrap();
        assert_eq!(parsed, InitResponse::default());
    }

    #[test]
    fn test_envelope_error_code_is_failure() {
        let body = r#"{"error":{"code":"access_token_invalid","message":"bad token"}}"#;
        assert!(decode_envelope::<InitResponse>(body).is_none());
        assert!(decode_envelope::<InitResponse>("<html>").is_none());
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let config = PublishConfig {
            base_url: "https://open.example.com/v2/".into(),
            ..PublishConfig::default()
        };
        let api = HttpPublishApi::new("token", &config).unwrap();
        assert_eq!(
            api.init_url(),
            "https://open.example.com/v2/post/publish/inbox/video/init/"
        );
        assert_eq!(
            api.status_url(),
            "https://open.example.com/v2/post/publish/status/fetch/"
        );
        assert!(!format!("{api:?}").contains("token"));
    }
}

//! Publishing service interface.

use async_trait::async_trait;
use clipcast_common::error::ClipcastResult;
use clipcast_composition_model::upload::ChunkRange;
use serde::{Deserialize, Serialize};

/// Upload session request: post metadata plus declared size and chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitRequest {
    pub post_info: PostInfo,
    pub source_info: SourceInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostInfo {
    pub title: String,
    pub privacy_level: String,
    pub disable_duet: bool,
    pub disable_comment: bool,
    pub disable_stitch: bool,
    pub video_cover_timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub source: String,
    pub video_size: u64,
    pub chunk_size: u64,
}

/// Upload session response. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InitResponse {
    #[serde(default)]
    pub publish_id: Option<String>,
    #[serde(default)]
    pub upload_url: Option<String>,
}

/// Raw publish status as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

/// Classified publish status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    Published { share_url: Option<String> },
    Failed { reason: Option<String> },
    /// Still processing, or a status this client does not know.
    Pending(Option<String>),
}

impl StatusReport {
    pub fn classify(&self) -> PublishStatus {
        match self.status.as_deref() {
            Some("PUBLISH_COMPLETE") | Some("PUBLISHED") => PublishStatus::Published {
                share_url: self.share_url.clone().filter(|u| !u.is_empty()),
            },
            Some("FAILED") => PublishStatus::Failed {
                reason: self.fail_reason.clone(),
            },
            other => PublishStatus::Pending(other.map(str::to_string)),
        }
    }
}

/// The three publishing service calls, plus the upload-complete signal.
#[async_trait]
pub trait PublishApi: Send + Sync {
    /// Request an upload session.
    async fn init_upload(&self, request: &InitRequest) -> ClipcastResult<InitResponse>;

    /// Send one byte range to the session's upload target.
    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: &ChunkRange,
        bytes: &[u8],
    ) -> ClipcastResult<()>;

    /// Signal that every byte was sent. Returns the first status report.
    async fn complete_upload(&self, publish_id: &str) -> ClipcastResult<StatusReport>;

    /// Query publish status.
    async fn fetch_status(&self, publish_id: &str) -> ClipcastResult<StatusReport>;
}

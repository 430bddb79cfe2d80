//! Upload and publish state machine.
//!
//! One `publish` call walks a single session from init to a terminal state.
//! Chunks are sent strictly in order; a failed chunk fails the session and
//! the caller restarts from init. Status polling is bounded by
//! `max_poll_attempts` waits of `poll_interval_secs` each, and running out
//! is reported as a timeout, never as success.

use std::sync::Arc;
use std::time::Duration;

use clipcast_common::clock::Sleeper;
use clipcast_common::config::PublishConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_composition_model::upload::{ChunkRange, UploadSession};
use serde::Serialize;

use crate::api::{InitRequest, PostInfo, PublishApi, PublishStatus, SourceInfo, StatusReport};

/// Where a publish run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    Idle,
    Initializing,
    Uploading,
    AwaitingPublish,
    Polling,
    Published,
    Failed,
    TimedOut,
}

impl PublishState {
    /// Published, Failed or TimedOut. A machine in one of these states has
    /// finished its run and may start another.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Published | Self::Failed | Self::TimedOut)
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub publish_id: String,
    /// Absent when the service did not return one.
    pub share_url: Option<String>,
    /// Status queries issued after the completion signal.
    pub poll_attempts: u32,
    pub bytes_sent: u64,
    pub chunks: usize,
}

/// Drives the publishing service through one session at a time.
pub struct PublishStateMachine {
    api: Arc<dyn PublishApi>,
    sleeper: Arc<dyn Sleeper>,
    config: PublishConfig,
    state: PublishState,
}

impl PublishStateMachine {
    pub fn new(api: Arc<dyn PublishApi>, sleeper: Arc<dyn Sleeper>, config: PublishConfig) -> Self {
        Self {
            api,
            sleeper,
            config,
            state: PublishState::Idle,
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    /// Upload `artifact` and wait for the service to publish it.
    pub async fn publish(&mut self, artifact: &[u8], title: &str) -> ClipcastResult<PublishOutcome> {
        self.state = PublishState::Initializing;
        let result = self.run(artifact, title).await;
        if let Err(err) = &result {
            if !self.state.is_terminal() {
                self.state = PublishState::Failed;
            }
            tracing::error!(error = %err, state = ?self.state, "Publish run ended without success");
        }
        result
    }

    /// Poll an existing publish id without uploading anything.
    pub async fn poll_status(&mut self, publish_id: &str) -> ClipcastResult<PublishOutcome> {
        self.state = PublishState::Polling;
        let result = self.poll(publish_id).await;
        if result.is_err() && !self.state.is_terminal() {
            self.state = PublishState::Failed;
        }
        result.map(|(share_url, poll_attempts)| PublishOutcome {
            publish_id: publish_id.to_string(),
            share_url,
            poll_attempts,
            bytes_sent: 0,
            chunks: 0,
        })
    }

    async fn run(&mut self, artifact: &[u8], title: &str) -> ClipcastResult<PublishOutcome> {
        if artifact.is_empty() {
            return Err(ClipcastError::session_init("artifact is empty"));
        }
        if self.config.chunk_size == 0 {
            return Err(ClipcastError::config("publish.chunk_size must be positive"));
        }

        let total = artifact.len() as u64;
        let ranges = ChunkRange::plan(total, self.config.chunk_size);
        let request = self.init_request(title, total);

        tracing::info!(
            bytes = total,
            chunks = ranges.len(),
            chunk_size = self.config.chunk_size,
            "Initializing upload session"
        );
        let init = self.api.init_upload(&request).await?;
        let (publish_id, upload_url) = match (init.publish_id, init.upload_url) {
            (Some(id), Some(url)) if !id.is_empty() && !url.is_empty() => (id, url),
            (id, url) => {
                return Err(ClipcastError::session_init(format!(
                    "session response missing fields (publish_id: {}, upload_url: {})",
                    id.is_some(),
                    url.is_some()
                )));
            }
        };
        let mut session = UploadSession::new(publish_id, upload_url, total);

        self.state = PublishState::Uploading;
        for (index, range) in ranges.iter().enumerate() {
            let bytes = &artifact[range.as_slice_range()];
            self.api
                .upload_chunk(&session.upload_url, range, bytes)
                .await
                .map_err(|err| match err {
                    ClipcastError::ChunkUpload { .. } => err,
                    other => ClipcastError::ChunkUpload {
                        offset: range.start,
                        message: other.to_string(),
                    },
                })?;
            session
                .record_sent(range)
                .map_err(|e| ClipcastError::ChunkUpload {
                    offset: range.start,
                    message: e.to_string(),
                })?;
            tracing::debug!(
                chunk = index + 1,
                of = ranges.len(),
                range = %range.content_range(),
                "Chunk uploaded"
            );
        }
        if !session.is_complete() {
            return Err(ClipcastError::ChunkUpload {
                offset: session.bytes_sent,
                message: format!("only {} of {} bytes sent", session.bytes_sent, total),
            });
        }
        tracing::info!(publish_id = %session.publish_id, "Upload complete");

        self.state = PublishState::AwaitingPublish;
        let first = self.api.complete_upload(&session.publish_id).await?;
        let (share_url, poll_attempts) = match self.resolve(&session.publish_id, &first)? {
            Some(share_url) => (share_url, 0),
            None => {
                self.state = PublishState::Polling;
                self.poll(&session.publish_id).await?
            }
        };

        Ok(PublishOutcome {
            publish_id: session.publish_id,
            share_url,
            poll_attempts,
            bytes_sent: session.bytes_sent,
            chunks: ranges.len(),
        })
    }

    /// Returns the share url and the number of status queries issued.
    async fn poll(&mut self, publish_id: &str) -> ClipcastResult<(Option<String>, u32)> {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let max = self.config.max_poll_attempts;

        for attempt in 1..=max {
            self.sleeper.sleep(interval).await;
            let report = self.api.fetch_status(publish_id).await?;
            tracing::debug!(publish_id, attempt, status = ?report.status, "Publish status");
            if let Some(share_url) = self.resolve(publish_id, &report)? {
                return Ok((share_url, attempt));
            }
        }

        self.state = PublishState::TimedOut;
        tracing::warn!(publish_id, attempts = max, "Publish status polling exhausted");
        Err(ClipcastError::PublishTimeout {
            publish_id: publish_id.to_string(),
            attempts: max,
        })
    }

    /// `Some(share_url)` once published, `None` while pending.
    fn resolve(
        &mut self,
        publish_id: &str,
        report: &StatusReport,
    ) -> ClipcastResult<Option<Option<String>>> {
        match report.classify() {
            PublishStatus::Published { share_url } => {
                self.state = PublishState::Published;
                tracing::info!(publish_id, share_url = ?share_url, "Published");
                Ok(Some(share_url))
            }
            PublishStatus::Failed { reason } => Err(ClipcastError::PublishFailed {
                publish_id: publish_id.to_string(),
                message: reason.unwrap_or_else(|| "publish reported FAILED".to_string()),
            }),
            PublishStatus::Pending(_) => Ok(None),
        }
    }

    fn init_request(&self, title: &str, total: u64) -> InitRequest {
        InitRequest {
            post_info: PostInfo {
                title: title.chars().take(self.config.title_max_chars).collect(),
                privacy_level: self.config.privacy_level.clone(),
                disable_duet: false,
                disable_comment: false,
                disable_stitch: false,
                video_cover_timestamp_ms: self.config.cover_timestamp_ms,
            },
            source_info: SourceInfo {
                source: "FILE_UPLOAD".to_string(),
                video_size: total,
                chunk_size: self.config.chunk_size,
            },
        }
    }
}

//! Upload and publish a finished video.

use std::path::PathBuf;
use std::sync::Arc;

use clipcast_common::clock::TokioSleeper;
use clipcast_common::config::AppConfig;
use clipcast_publisher::{HttpPublishApi, PublishState, PublishStateMachine};

pub async fn run(
    config: &AppConfig,
    video: Option<PathBuf>,
    title: String,
    poll: Option<String>,
    access_token: String,
) -> anyhow::Result<()> {
    let api = HttpPublishApi::new(access_token, &config.publish)?;
    let mut machine =
        PublishStateMachine::new(Arc::new(api), Arc::new(TokioSleeper), config.publish.clone());

    let outcome = match (poll, video) {
        (Some(publish_id), _) => {
            println!("Polling publish status for {publish_id}");
            machine.poll_status(&publish_id).await
        }
        (None, Some(path)) => {
            let bytes = std::fs::read(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
            println!("Publishing {} ({} bytes)", path.display(), bytes.len());
            machine.publish(&bytes, &title).await
        }
        (None, None) => anyhow::bail!("Provide a video file, or --poll with a publish id"),
    };

    match outcome {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => {
            println!("Publish ended in state {:?}", machine.state());
            if machine.state() == PublishState::TimedOut {
                println!("The service may still finish; re-check later with --poll");
            }
            Err(e.into())
        }
    }
}

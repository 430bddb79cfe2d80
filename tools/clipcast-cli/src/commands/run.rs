//! Run the whole pipeline once.

use std::path::PathBuf;
use std::sync::Arc;

use clipcast_common::clock::TokioSleeper;
use clipcast_common::config::AppConfig;
use clipcast_pipeline::{FfmpegAudio, Pipeline, PipelineRequest, Services};
use clipcast_providers::{MiniMaxClient, OpenAiClient, Transcriber};
use clipcast_publisher::{HttpPublishApi, PublishApi};
use clipcast_render_engine::{FfmpegBackend, RenderBackend};

pub struct RunArgs {
    pub background: PathBuf,
    pub transition_sound: PathBuf,
    pub question: Option<String>,
    pub output: PathBuf,
    pub audio_output: Option<PathBuf>,
    pub transcribe: bool,
    pub access_token: Option<String>,
    pub openai_api_key: String,
    pub minimax_api_key: String,
}

pub async fn run(config: AppConfig, args: RunArgs) -> anyhow::Result<()> {
    let transition_sound = std::fs::read(&args.transition_sound).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read transition sound {}: {e}",
            args.transition_sound.display()
        )
    })?;

    let renderer = FfmpegBackend::new(&config.tools, config.render.clone());
    if !renderer.is_available() {
        anyhow::bail!(
            "ffmpeg not found at {}; run `clipcast check`",
            config.tools.ffmpeg_path.display()
        );
    }

    let openai = Arc::new(OpenAiClient::new(args.openai_api_key, &config.providers)?);
    let transcriber: Option<Arc<dyn Transcriber>> = if args.transcribe {
        Some(openai.clone() as Arc<dyn Transcriber>)
    } else {
        None
    };
    let publisher: Option<Arc<dyn PublishApi>> = match args.access_token {
        Some(token) => {
            let api = HttpPublishApi::new(token, &config.publish)?;
            Some(Arc::new(api) as Arc<dyn PublishApi>)
        }
        None => {
            tracing::info!("No access token, the video will not be published");
            None
        }
    };

    let services = Services {
        text: openai,
        speech: Arc::new(MiniMaxClient::new(args.minimax_api_key, &config.providers)?),
        transcriber,
        audio: Arc::new(FfmpegAudio::new(&config.tools, &config.probe)),
        renderer: Arc::new(renderer),
        publisher,
        sleeper: Arc::new(TokioSleeper),
    };

    let pipeline = Pipeline::new(config, services);
    let output = pipeline
        .run(&PipelineRequest {
            background: args.background,
            transition_sound,
            question: args.question,
        })
        .await?;

    std::fs::write(&args.output, &output.video)?;
    println!("Video written to {}", args.output.display());
    if let Some(path) = &args.audio_output {
        std::fs::write(path, &output.audio)?;
        println!("Audio written to {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&output.summary())?);
    Ok(())
}

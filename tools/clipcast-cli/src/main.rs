//! Clipcast CLI: plan, caption, join audio, render and publish short videos.
//!
//! Usage:
//!   clipcast plan [OPTIONS]          Plan transitions from durations
//!   clipcast captions <SRT>          Convert SRT to a styled overlay script
//!   clipcast probe <FILES>...        Measure audio durations
//!   clipcast concat <FILES>...       Join audio clips in order
//!   clipcast publish <VIDEO>         Upload and publish a finished video
//!   clipcast run [OPTIONS]           Run the whole pipeline once
//!   clipcast check                   Check external tools and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipcast_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "clipcast",
    about = "Short-form video composition and publishing",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan transition stages and print the plan as JSON
    Plan {
        /// Question speech plus transition sound (seconds); omit if unknown
        #[arg(long)]
        question_secs: Option<f64>,

        /// Transition sound length (seconds)
        #[arg(long)]
        sound_secs: Option<f64>,

        /// Full audio track length (seconds)
        #[arg(long)]
        total_secs: f64,

        /// Also print the ffmpeg filter graph
        #[arg(long)]
        filter: bool,
    },

    /// Convert captions to a styled overlay script
    Captions {
        /// SRT file; omit to estimate timing from --text
        srt: Option<PathBuf>,

        /// Plain text to segment when no SRT is given
        #[arg(long, requires = "duration")]
        text: Option<String>,

        /// Audio duration the text is spread over (seconds)
        #[arg(long)]
        duration: Option<f64>,

        /// Output file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write SRT instead of the overlay script
        #[arg(long)]
        srt_out: bool,
    },

    /// Measure audio durations
    Probe {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Join audio clips in the given order
    Concat {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Upload and publish a finished video
    Publish {
        /// Video file to upload (not needed with --poll)
        video: Option<PathBuf>,

        /// Post title
        #[arg(long, default_value = "")]
        title: String,

        /// Re-poll an existing publish id instead of uploading
        #[arg(long, conflicts_with = "video")]
        poll: Option<String>,

        #[arg(long, env = "TIKTOK_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },

    /// Run the whole pipeline once
    Run {
        /// Background video, looped to the audio length
        #[arg(long)]
        background: PathBuf,

        /// Transition sound appended to the question speech
        #[arg(long)]
        transition_sound: PathBuf,

        /// Use this question instead of generating one
        #[arg(long)]
        question: Option<String>,

        /// Where to write the rendered video
        #[arg(short, long, default_value = "clipcast-output.mp4")]
        output: PathBuf,

        /// Also write the final audio track here
        #[arg(long)]
        audio_output: Option<PathBuf>,

        /// Estimate caption timing instead of transcribing
        #[arg(long)]
        no_transcribe: bool,

        /// Render only; never publish
        #[arg(long)]
        no_publish: bool,

        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: String,

        #[arg(long, env = "MINIMAX_API_KEY", hide_env_values = true)]
        minimax_api_key: String,

        /// Publishing is skipped when no token is available
        #[arg(long, env = "TIKTOK_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },

    /// Check external tools and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    clipcast_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Plan {
            question_secs,
            sound_secs,
            total_secs,
            filter,
        } => commands::plan::run(&config, question_secs, sound_secs, total_secs, filter),
        Commands::Captions {
            srt,
            text,
            duration,
            output,
            srt_out,
        } => commands::captions::run(&config, srt, text, duration, output, srt_out),
        Commands::Probe { files } => commands::probe::run(&config, files),
        Commands::Concat { files, output } => commands::concat::run(&config, files, output),
        Commands::Publish {
            video,
            title,
            poll,
            access_token,
        } => commands::publish::run(&config, video, title, poll, access_token).await,
        Commands::Run {
            background,
            transition_sound,
            question,
            output,
            audio_output,
            no_transcribe,
            no_publish,
            openai_api_key,
            minimax_api_key,
            access_token,
        } => {
            commands::run::run(
                config,
                commands::run::RunArgs {
                    background,
                    transition_sound,
                    question,
                    output,
                    audio_output,
                    transcribe: !no_transcribe,
                    access_token: access_token.filter(|_| !no_publish),
                    openai_api_key,
                    minimax_api_key,
                },
            )
            .await
        }
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
    }
}

//! One pipeline run.

use std::path::PathBuf;
use std::sync::Arc;

use clipcast_common::clock::{PipelineClock, Sleeper};
use clipcast_common::config::AppConfig;
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_composition_model::audio::{AudioClip, DurationMeasurement};
use clipcast_providers::prompts::{answer_request, question_request};
use clipcast_providers::{
    clean_generated_question, SpeechSynthesizer, TextGenerator, Transcriber,
};
use clipcast_publisher::{PublishApi, PublishOutcome, PublishStateMachine};
use clipcast_render_engine::{RenderBackend, RenderJob, RenderProgress};
use serde::Serialize;

use crate::plan::{compose_plan, CaptionInput, CaptionMode, ComposedPlan, PlanInputs};
use crate::toolkit::AudioToolkit;

/// Collaborators for a run. Optional services are skipped when absent.
#[derive(Clone)]
pub struct Services {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Without a transcriber, captions are estimated from the answer text.
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub audio: Arc<dyn AudioToolkit>,
    pub renderer: Arc<dyn RenderBackend>,
    /// Without a publishing service, the video is rendered but not posted.
    pub publisher: Option<Arc<dyn PublishApi>>,
    pub sleeper: Arc<dyn Sleeper>,
}

/// Per-run inputs.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub background: PathBuf,
    /// Encoded transition sound appended to the question speech.
    pub transition_sound: Vec<u8>,
    /// Use this question instead of generating one.
    pub question: Option<String>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub run_id: String,
    pub question: String,
    pub answer: String,
    pub question_duration: DurationMeasurement,
    pub total_duration: DurationMeasurement,
    pub plan: ComposedPlan,
    pub audio: Vec<u8>,
    pub video: Vec<u8>,
    pub publish: Option<PublishOutcome>,
    pub elapsed_secs: f64,
}

/// Serializable digest of a run, without the media bytes.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub run_id: &'a str,
    pub question: &'a str,
    pub answer_chars: usize,
    pub question_duration: DurationMeasurement,
    pub total_duration: DurationMeasurement,
    pub stages: usize,
    pub skipped: usize,
    pub caption_mode: CaptionMode,
    pub video_bytes: usize,
    pub publish: Option<&'a PublishOutcome>,
    pub elapsed_secs: f64,
}

impl PipelineOutput {
    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary {
            run_id: &self.run_id,
            question: &self.question,
            answer_chars: self.answer.chars().count(),
            question_duration: self.question_duration,
            total_duration: self.total_duration,
            stages: self.plan.transitions.stages.len(),
            skipped: self.plan.transitions.skipped.len(),
            caption_mode: self.plan.caption_mode,
            video_bytes: self.video.len(),
            publish: self.publish.as_ref(),
            elapsed_secs: self.elapsed_secs,
        }
    }
}

/// Sequential composition and publishing.
pub struct Pipeline {
    config: AppConfig,
    services: Services,
}

impl Pipeline {
    pub fn new(config: AppConfig, services: Services) -> Self {
        Self { config, services }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn run(&self, request: &PipelineRequest) -> ClipcastResult<PipelineOutput> {
        let clock = PipelineClock::start();
        let run_id = clock.run_id();
        tracing::info!(run_id = %run_id, started = clock.epoch_wall(), "Pipeline run started");

        if !request.background.exists() {
            return Err(ClipcastError::FileNotFound {
                path: request.background.clone(),
            });
        }
        if request.transition_sound.is_empty() {
            return Err(ClipcastError::config("transition sound is empty"));
        }

        let s = &self.services;
        let providers = &self.config.providers;

        let question = match &request.question {
            Some(q) if !q.trim().is_empty() => clean_generated_question(q),
            _ => {
                let raw = s.text.generate(&question_request(providers, &run_id)).await?;
                clean_generated_question(&raw)
            }
        };
        tracing::info!(question = %question, "Question ready");

        let answer = s.text.generate(&answer_request(providers, &question)).await?;
        tracing::info!(chars = answer.chars().count(), "Answer ready");

        let question_speech = s
            .speech
            .synthesize(&question, &providers.question_voice_id)
            .await?;
        let answer_speech = s
            .speech
            .synthesize(&answer, &providers.answer_voice_id)
            .await?;

        let sound_duration = s.audio.measure(&request.transition_sound);
        let sound = AudioClip::new(request.transition_sound.clone(), sound_duration);
        let question_speech_duration = s.audio.measure(&question_speech);
        let question_speech = AudioClip::new(question_speech, question_speech_duration);
        let answer_duration = s.audio.measure(&answer_speech);
        let answer_clip = AudioClip::new(answer_speech, answer_duration);

        let question_clip = s.audio.concat(&question_speech, &sound)?;
        let full = s.audio.concat(&question_clip, &answer_clip)?;
        tracing::info!(
            question_secs = question_clip.duration_secs(),
            question_exact = question_clip.duration().is_exact(),
            total_secs = full.duration_secs(),
            total_exact = full.duration().is_exact(),
            "Audio track assembled"
        );

        let transcript = match &s.transcriber {
            Some(transcriber) => match transcriber.transcribe(full.bytes()).await {
                Ok(srt) => Some(srt),
                Err(err) => {
                    tracing::warn!(error = %err, "Transcription failed, estimating captions");
                    None
                }
            },
            None => None,
        };

        let fallback_start = question_clip
            .duration()
            .exact_secs()
            .unwrap_or_else(|| (full.duration_secs() - answer_clip.duration_secs()).max(0.0));
        let plan = compose_plan(
            &self.config,
            &PlanInputs {
                question: Some(question_clip.duration()),
                transition_sound: Some(sound_duration),
                total: full.duration(),
                captions: CaptionInput {
                    transcript,
                    fallback_text: answer.clone(),
                    fallback_start_secs: fallback_start,
                },
            },
        )?;

        let job = RenderJob {
            background: &request.background,
            graph: &plan.transitions.graph,
            overlay: plan.overlay.as_ref(),
            audio: &full,
        };
        tracing::info!(backend = s.renderer.name(), "Rendering");
        let video = s.renderer.render(&job, Some(Box::new(log_progress)))?;
        tracing::info!(bytes = video.len(), "Render complete");

        let publish = match &s.publisher {
            Some(api) => {
                let mut machine = PublishStateMachine::new(
                    api.clone(),
                    s.sleeper.clone(),
                    self.config.publish.clone(),
                );
                Some(machine.publish(&video, &answer).await?)
            }
            None => {
                tracing::info!("No publishing service configured, skipping publish");
                None
            }
        };

        let elapsed_secs = clock.elapsed_secs();
        tracing::info!(run_id = %run_id, elapsed_secs, "Pipeline run finished");

        Ok(PipelineOutput {
            run_id,
            question,
            answer,
            question_duration: question_clip.duration(),
            total_duration: full.duration(),
            plan,
            audio: full.into_bytes(),
            video,
            publish,
            elapsed_secs,
        })
    }
}

fn log_progress(progress: RenderProgress) {
    tracing::debug!(
        progress = progress.progress,
        out_time_secs = progress.out_time_secs,
        eta_secs = progress.eta_secs,
        stage = ?progress.stage,
        "Render progress"
    );
}

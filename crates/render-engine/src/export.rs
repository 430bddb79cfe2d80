//! Render jobs and the ffmpeg backend.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use clipcast_audio::ScratchDir;
use clipcast_common::config::{RenderConfig, ToolsConfig};
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_common::process::{command_exists, run_tool};
use clipcast_composition_model::audio::AudioClip;
use clipcast_composition_model::timeline::EffectGraph;
use clipcast_processing_core::OverlayScript;

use crate::filter::{build_filter_complex, FrameSize, VIDEO_OUT_LABEL};

/// Everything the rendering engine consumes for one composition.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Background clip, looped or cut to the graph's total duration.
    pub background: &'a Path,
    pub graph: &'a EffectGraph,
    /// Caption overlay; `None` renders without captions.
    pub overlay: Option<&'a OverlayScript>,
    /// Final concatenated audio track.
    pub audio: &'a AudioClip,
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Output time encoded so far.
    pub out_time_secs: f64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Encoding,
    Finalizing,
    Complete,
}

/// A rendering engine behind a narrow interface.
pub trait RenderBackend: Send + Sync {
    /// Render the job and return the encoded video bytes.
    fn render(
        &self,
        job: &RenderJob<'_>,
        progress: Option<ProgressCallback>,
    ) -> ClipcastResult<Vec<u8>>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Renders with the ffmpeg command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    config: RenderConfig,
}

/// Fully resolved ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub args: Vec<OsString>,
    pub output: PathBuf,
    pub expected_duration_secs: f64,
}

impl FfmpegBackend {
    pub fn new(tools: &ToolsConfig, config: RenderConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg_path.clone(),
            ffprobe: tools.ffprobe_path.clone(),
            config,
        }
    }

    /// Build the ffmpeg argument list.
    ///
    /// Input 0 is the looped background, input 1 the audio. The output is
    /// cut to the graph's total duration.
    pub fn build_plan(
        &self,
        background: &Path,
        audio: &Path,
        graph: &EffectGraph,
        frame: Option<FrameSize>,
        overlay: Option<&Path>,
        output: &Path,
    ) -> RenderPlan {
        let total = format!("{:.4}", graph.total_duration_secs);
        let filter = build_filter_complex(graph, frame, overlay);
        let c = &self.config;

        let mut args: Vec<OsString> = Vec::new();
        let mut push = |s: &str| args.push(OsString::from(s));
        for arg in ["-y", "-v", "error", "-nostats", "-progress", "pipe:1"] {
            push(arg);
        }
        for arg in ["-stream_loop", "-1", "-t", total.as_str(), "-i"] {
            push(arg);
        }
        args.push(background.as_os_str().to_owned());
        args.push("-i".into());
        args.push(audio.as_os_str().to_owned());

        let tail = [
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            format!("[{VIDEO_OUT_LABEL}]"),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            c.video_codec.clone(),
            "-preset".to_string(),
            c.preset.clone(),
            "-crf".to_string(),
            c.crf.to_string(),
            "-c:a".to_string(),
            c.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", c.audio_bitrate_kbps),
            "-pix_fmt".to_string(),
            c.pixel_format.clone(),
            "-t".to_string(),
            total,
            "-movflags".to_string(),
            "+faststart".to_string(),
        ];
        args.extend(tail.map(OsString::from));
        args.push(output.as_os_str().to_owned());

        RenderPlan {
            args,
            output: output.to_path_buf(),
            expected_duration_secs: graph.total_duration_secs,
        }
    }

    fn run_ffmpeg(
        &self,
        plan: &RenderPlan,
        progress: Option<&ProgressCallback>,
    ) -> ClipcastResult<()> {
        tracing::debug!(args = ?plan.args, "Running ffmpeg");
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ClipcastError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            args_len = plan.args.len(),
            expected_secs = plan.expected_duration_secs,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipcastError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClipcastError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| ClipcastError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                latest.update(key, value);
                if key == "progress" {
                    if let Some(cb) = progress {
                        cb(progress_report(
                            &latest,
                            plan.expected_duration_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| ClipcastError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ClipcastError::render(format!(
                "ffmpeg render failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "ffmpeg process finished"
        );
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &self,
        job: &RenderJob<'_>,
        progress: Option<ProgressCallback>,
    ) -> ClipcastResult<Vec<u8>> {
        job.graph
            .validate()
            .map_err(|e| ClipcastError::render(format!("invalid effect graph: {e}")))?;
        if !job.background.exists() {
            return Err(ClipcastError::FileNotFound {
                path: job.background.to_path_buf(),
            });
        }
        if job.audio.is_empty() {
            return Err(ClipcastError::render("audio track is empty"));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 0.0,
                out_time_secs: 0.0,
                eta_secs: 0.0,
                stage: RenderStage::Preparing,
            });
        }

        let scratch = ScratchDir::new("render")?;
        let audio_path = scratch.write("audio.mp3", job.audio.bytes())?;
        let overlay_path = match job.overlay.filter(|o| !o.is_empty()) {
            Some(script) => Some(scratch.write("overlay.ass", script.to_string().as_bytes())?),
            None => None,
        };

        let frame = probe_video_dimensions(&self.ffprobe, job.background);
        if frame.is_none() {
            tracing::warn!(
                background = %job.background.display(),
                "Could not read background dimensions, skipping frame normalization"
            );
        }

        let plan = self.build_plan(
            job.background,
            &audio_path,
            job.graph,
            frame,
            overlay_path.as_deref(),
            &scratch.file("output.mp4"),
        );

        tracing::info!(
            segments = job.graph.segments.len(),
            transitions = job.graph.joins.len(),
            captions = job.overlay.map(|o| o.events.len()).unwrap_or(0),
            total_secs = job.graph.total_duration_secs,
            "Rendering composition"
        );

        self.run_ffmpeg(&plan, progress.as_ref())?;
        let bytes = std::fs::read(&plan.output)?;

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 1.0,
                out_time_secs: plan.expected_duration_secs,
                eta_secs: 0.0,
                stage: RenderStage::Complete,
            });
        }

        tracing::info!(bytes = bytes.len(), "Render finished");
        Ok(bytes)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg) && command_exists(&self.ffprobe)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Width and height of the first video stream.
pub fn probe_video_dimensions(ffprobe: &Path, path: &Path) -> Option<FrameSize> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=width,height",
        "-of",
        "csv=p=0:s=x",
    ]
    .map(OsString::from)
    .to_vec();
    args.push(path.as_os_str().to_owned());

    let output = run_tool(ffprobe, &args).ok()?;
    if !output.success {
        return None;
    }
    parse_dimensions(&output.stdout)
}

fn parse_dimensions(raw: &str) -> Option<FrameSize> {
    let line = raw.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(FrameSize { width, height })
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        out_time_secs: state.out_time_secs,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Encoding
        },
    }
}

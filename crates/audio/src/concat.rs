//! Ordered audio concatenation.
//!
//! Clips whose first audio streams agree on codec, sample rate and channel
//! layout are joined with the concat demuxer and stream copy, so no sample
//! is decoded or resampled. Anything else, or a copy that ffmpeg refuses,
//! goes through the concat filter and is re-encoded to MP3.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clipcast_common::config::{ProbeConfig, ToolsConfig};
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_common::process::run_tool;
use clipcast_composition_model::audio::{AudioClip, DurationMeasurement};
use serde::Deserialize;

use crate::probe::DurationProbe;
use crate::scratch::ScratchDir;

/// Codec parameters of a clip's first audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamFormat {
    pub codec_name: Option<String>,
    pub sample_rate: Option<String>,
    pub channels: Option<u32>,
}

impl StreamFormat {
    fn is_complete(&self) -> bool {
        self.codec_name.is_some() && self.sample_rate.is_some() && self.channels.is_some()
    }

    /// File extension the stream can be copied into.
    fn container_extension(&self) -> &'static str {
        match self.codec_name.as_deref() {
            Some("mp3") => "mp3",
            Some("aac") => "m4a",
            Some("opus") | Some("vorbis") => "ogg",
            Some("flac") => "flac",
            Some(codec) if codec.starts_with("pcm_") => "wav",
            _ => "mka",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeStreams {
    #[serde(default)]
    streams: Vec<StreamFormat>,
}

/// Parse `ffprobe -show_entries stream=... -of json` output.
pub fn parse_stream_format(json: &str) -> Option<StreamFormat> {
    let parsed: ProbeStreams = serde_json::from_str(json).ok()?;
    parsed.streams.into_iter().next()
}

/// Body of a concat demuxer list file.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
        .collect()
}

/// Joins clips in argument order.
#[derive(Debug, Clone)]
pub struct AudioConcatenator {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    reencode_bitrate_bps: u32,
    probe: DurationProbe,
}

impl AudioConcatenator {
    pub fn new(tools: &ToolsConfig, probe: &ProbeConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg_path.clone(),
            ffprobe: tools.ffprobe_path.clone(),
            reencode_bitrate_bps: probe.fallback_bitrate_bps,
            probe: DurationProbe::new(tools, probe),
        }
    }

    /// `first` plays entirely before `second`.
    pub fn concat(&self, first: &AudioClip, second: &AudioClip) -> ClipcastResult<AudioClip> {
        self.concat_all(&[first, second])
    }

    /// Join any number of clips, in order.
    pub fn concat_all(&self, clips: &[&AudioClip]) -> ClipcastResult<AudioClip> {
        if clips.is_empty() {
            return Err(ClipcastError::concatenation("no clips to concatenate"));
        }
        if let Some(index) = clips.iter().position(|c| c.is_empty()) {
            return Err(ClipcastError::concatenation(format!("clip {index} is empty")));
        }

        let scratch = ScratchDir::new("concat")?;
        let mut parts = Vec::with_capacity(clips.len());
        let mut formats = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            let path = scratch.write(&format!("part-{i:03}"), clip.bytes())?;
            formats.push(self.stream_format(&path));
            parts.push(path);
        }

        let copyable = formats
            .first()
            .and_then(|f| f.as_ref())
            .filter(|first| first.is_complete())
            .filter(|first| formats.iter().all(|f| f.as_ref() == Some(*first)))
            .cloned();

        let output = match copyable {
            Some(format) => match self.stream_copy(&scratch, &parts, &format) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(error = %err, "Stream copy failed, re-encoding");
                    self.reencode(&scratch, &parts)?
                }
            },
            None => {
                tracing::info!(?formats, "Clip formats differ, re-encoding");
                self.reencode(&scratch, &parts)?
            }
        };

        let bytes = std::fs::read(&output)?;
        let duration = match self.probe.measure_file(&output) {
            Ok(secs) => DurationMeasurement::measured(secs),
            Err(err) => {
                tracing::warn!(error = %err, "Could not measure joined clip");
                self.probe.estimate(bytes.len() as u64)
            }
        };

        tracing::info!(
            clips = clips.len(),
            bytes = bytes.len(),
            secs = duration.secs,
            "Audio concatenated"
        );
        Ok(AudioClip::new(bytes, duration))
    }

    fn stream_format(&self, path: &Path) -> Option<StreamFormat> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=codec_name,sample_rate,channels",
            "-of",
            "json",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_owned());

        match run_tool(&self.ffprobe, &args) {
            Ok(out) if out.success => parse_stream_format(&out.stdout),
            Ok(out) => {
                tracing::debug!(stderr = %out.stderr.trim(), "ffprobe could not read stream format");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "ffprobe unavailable for stream format");
                None
            }
        }
    }

    fn stream_copy(
        &self,
        scratch: &ScratchDir,
        parts: &[PathBuf],
        format: &StreamFormat,
    ) -> ClipcastResult<PathBuf> {
        let list = scratch.write("concat.txt", concat_list(parts).as_bytes())?;
        let output = scratch.file(&format!("joined.{}", format.container_extension()));

        let mut args: Vec<OsString> = ["-y", "-v", "error", "-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(list.into_os_string());
        args.extend(["-c", "copy"].map(OsString::from));
        args.push(output.clone().into_os_string());

        self.run_ffmpeg(&args)?;
        Ok(output)
    }

    fn reencode(&self, scratch: &ScratchDir, parts: &[PathBuf]) -> ClipcastResult<PathBuf> {
        let output = scratch.file("joined.mp3");

        let mut args: Vec<OsString> = ["-y", "-v", "error"].map(OsString::from).to_vec();
        for part in parts {
            args.push("-i".into());
            args.push(part.clone().into_os_string());
        }
        let inputs: String = (0..parts.len()).map(|i| format!("[{i}:a]")).collect();
        args.push("-filter_complex".into());
        args.push(format!("{inputs}concat=n={}:v=0:a=1[out]", parts.len()).into());
        args.extend(
            [
                "-map".to_string(),
                "[out]".to_string(),
                "-c:a".to_string(),
                "libmp3lame".to_string(),
                "-b:a".to_string(),
                format!("{}k", (self.reencode_bitrate_bps / 1000).max(32)),
            ]
            .map(OsString::from),
        );
        args.push(output.clone().into_os_string());

        self.run_ffmpeg(&args)?;
        Ok(output)
    }

    fn run_ffmpeg(&self, args: &[OsString]) -> ClipcastResult<()> {
        tracing::debug!(?args, "Running ffmpeg");
        let out = run_tool(&self.ffmpeg, args).map_err(|e| {
            ClipcastError::concatenation(format!("failed to start {}: {e}", self.ffmpeg.display()))
        })?;
        if !out.success {
            return Err(ClipcastError::concatenation(out.stderr.trim().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_format() {
        let json = r#"{
            "programs": [],
            "streams": [
                { "codec_name": "mp3", "sample_rate": "32000", "channels": 1 }
            ]
        }"#;
        let format = parse_stream_format(json).unwrap();
        assert_eq!(format.codec_name.as_deref(), Some("mp3"));
        assert_eq!(format.sample_rate.as_deref(), Some("32000"));
        assert_eq!(format.channels, Some(1));
        assert!(format.is_complete());
        assert_eq!(format.container_extension(), "mp3");
    }

    #[test]
    fn test_parse_stream_format_without_streams() {
        assert_eq!(parse_stream_format(r#"{"streams": []}"#), None);
        assert_eq!(parse_stream_format("{}"), None);
        assert_eq!(parse_stream_format("not json"), None);
    }

    #[test]
    fn test_concat_list_quotes_paths() {
        let list = concat_list(&[
            PathBuf::from("/tmp/a/part-000"),
            PathBuf::from("/tmp/it's/part-001"),
        ]);
        assert_eq!(
            list,
            "file '/tmp/a/part-000'\nfile '/tmp/it'\\''s/part-001'\n"
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let concat = AudioConcatenator::new(&ToolsConfig::default(), &ProbeConfig::default());
        let err = concat.concat_all(&[]).unwrap_err();
        assert!(matches!(err, ClipcastError::Concatenation { .. }));

        let empty = AudioClip::new(Vec::new(), DurationMeasurement::measured(1.0));
        let full = AudioClip::new(vec![1, 2, 3], DurationMeasurement::measured(1.0));
        let err = concat.concat(&full, &empty).unwrap_err();
        assert!(err.to_string().contains("clip 1 is empty"));
    }

    #[test]
    fn test_missing_ffmpeg_is_fatal_concatenation_error() {
        let tools = ToolsConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".into(),
            ffprobe_path: "/nonexistent/ffprobe".into(),
        };
        let concat = AudioConcatenator::new(&tools, &ProbeConfig::default());
        let a = AudioClip::new(vec![0xff; 64], DurationMeasurement::measured(1.0));
        let b = AudioClip::new(vec![0xff; 64], DurationMeasurement::measured(1.0));
        let err = concat.concat(&a, &b).unwrap_err();
        assert!(matches!(err, ClipcastError::Concatenation { .. }));
        assert!(!err.is_recoverable());
    }
}

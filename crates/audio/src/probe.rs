//! Playback duration measurement.
//!
//! Durations come from ffprobe, which detects the container itself so
//! callers never declare a codec. When probing fails the duration is
//! estimated from the byte length and an assumed bitrate, and tagged as an
//! estimate so timing-sensitive consumers can ignore it.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clipcast_common::config::{ProbeConfig, ToolsConfig};
use clipcast_common::error::{ClipcastError, ClipcastResult};
use clipcast_common::process::run_tool;
use clipcast_composition_model::audio::DurationMeasurement;

use crate::scratch::ScratchDir;

/// Seconds of audio implied by `len` bytes at `bitrate_bps`.
pub fn estimate_from_len(len: u64, bitrate_bps: u32) -> f64 {
    if bitrate_bps == 0 {
        return 0.0;
    }
    len as f64 / (bitrate_bps as f64 / 8.0)
}

/// Parse ffprobe's `format=duration` output in `nokey` form.
pub fn parse_duration_output(stdout: &str) -> Option<f64> {
    let value: f64 = stdout.lines().next()?.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Measures clip durations with ffprobe.
#[derive(Debug, Clone)]
pub struct DurationProbe {
    ffprobe: PathBuf,
    fallback_bitrate_bps: u32,
}

impl DurationProbe {
    pub fn new(tools: &ToolsConfig, config: &ProbeConfig) -> Self {
        Self {
            ffprobe: tools.ffprobe_path.clone(),
            fallback_bitrate_bps: config.fallback_bitrate_bps,
        }
    }

    /// Duration of an encoded clip. Never fails; check
    /// [`DurationMeasurement::is_exact`] before using the value for sync.
    pub fn measure(&self, bytes: &[u8]) -> DurationMeasurement {
        match self.measure_bytes(bytes) {
            Ok(secs) => {
                tracing::debug!(bytes = bytes.len(), secs, "Measured clip duration");
                DurationMeasurement::measured(secs)
            }
            Err(err) => {
                let estimate = self.estimate(bytes.len() as u64);
                tracing::warn!(
                    error = %err,
                    bytes = bytes.len(),
                    estimated_secs = estimate.secs,
                    bitrate_bps = self.fallback_bitrate_bps,
                    "Duration probe failed, using byte-length estimate"
                );
                estimate
            }
        }
    }

    /// Duration of a file on disk.
    pub fn measure_file(&self, path: &Path) -> ClipcastResult<f64> {
        if !path.exists() {
            return Err(ClipcastError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut args: Vec<&OsStr> = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        args.push(path.as_os_str());

        let output = run_tool(&self.ffprobe, args).map_err(|e| {
            ClipcastError::measurement(format!("failed to start {}: {e}", self.ffprobe.display()))
        })?;

        if !output.success {
            return Err(ClipcastError::measurement(format!(
                "ffprobe failed ({}): {}",
                output.status,
                output.stderr.trim()
            )));
        }

        parse_duration_output(&output.stdout).ok_or_else(|| {
            ClipcastError::measurement(format!(
                "ffprobe returned no usable duration: {:?}",
                output.stdout.trim()
            ))
        })
    }

    /// Byte-length estimate at the configured bitrate.
    pub fn estimate(&self, len: u64) -> DurationMeasurement {
        DurationMeasurement::estimated(estimate_from_len(len, self.fallback_bitrate_bps))
    }

    fn measure_bytes(&self, bytes: &[u8]) -> ClipcastResult<f64> {
        if bytes.is_empty() {
            return Err(ClipcastError::measurement("clip is empty"));
        }
        let scratch = ScratchDir::new("probe")?;
        let path = scratch.write("clip", bytes)?;
        self.measure_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipcast_composition_model::audio::DurationSource;
    use proptest::prelude::*;

    fn probe_with_missing_tool() -> DurationProbe {
        DurationProbe::new(
            &ToolsConfig {
                ffmpeg_path: "/nonexistent/ffmpeg".into(),
                ffprobe_path: "/nonexistent/ffprobe".into(),
            },
            &ProbeConfig::default(),
        )
    }

    #[test]
    fn test_estimate_at_128kbps() {
        // 16 000 bytes per second.
        assert_eq!(estimate_from_len(48_000, 128_000), 3.0);
        assert_eq!(estimate_from_len(1_000, 0), 0.0);
    }

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(parse_duration_output("3.265306\n"), Some(3.265306));
        assert_eq!(parse_duration_output("N/A\n"), None);
        assert_eq!(parse_duration_output(""), None);
        assert_eq!(parse_duration_output("0.000000"), None);
    }

    #[test]
    fn test_missing_tool_falls_back_to_tagged_estimate() {
        let m = probe_with_missing_tool().measure(&[0u8; 32_000]);
        assert_eq!(m.source, DurationSource::Estimated);
        assert_eq!(m.secs, 2.0);
        assert_eq!(m.exact_secs(), None);
    }

    #[test]
    fn test_missing_tool_is_measurement_error() {
        let scratch = ScratchDir::new("probe-test").unwrap();
        let path = scratch.write("clip", b"not audio").unwrap();
        let err = probe_with_missing_tool().measure_file(&path).unwrap_err();
        assert!(matches!(err, ClipcastError::Measurement { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = probe_with_missing_tool()
            .measure_file(Path::new("/nonexistent/clip.mp3"))
            .unwrap_err();
        assert!(matches!(err, ClipcastError::FileNotFound { .. }));
    }

    proptest! {
        #[test]
        fn prop_estimate_scales_with_length(len in 0u64..50_000_000, bitrate in 8_000u32..512_000) {
            let one = estimate_from_len(len, bitrate);
            let two = estimate_from_len(len * 2, bitrate);
            prop_assert!(one >= 0.0);
            prop_assert!((two - 2.0 * one).abs() <= 1e-9 * (1.0 + two));
        }
    }
}

//! Audio operations the pipeline needs, behind a seam.

use clipcast_audio::{AudioConcatenator, DurationProbe};
use clipcast_common::config::{ProbeConfig, ToolsConfig};
use clipcast_common::error::ClipcastResult;
use clipcast_composition_model::audio::{AudioClip, DurationMeasurement};

/// Measuring and joining clips.
pub trait AudioToolkit: Send + Sync {
    /// Never fails; estimates are tagged as such.
    fn measure(&self, bytes: &[u8]) -> DurationMeasurement;

    /// `first` then `second`, with the joined clip's duration measured.
    fn concat(&self, first: &AudioClip, second: &AudioClip) -> ClipcastResult<AudioClip>;
}

/// The ffmpeg-backed toolkit.
#[derive(Debug, Clone)]
pub struct FfmpegAudio {
    probe: DurationProbe,
    concat: AudioConcatenator,
}

impl FfmpegAudio {
    pub fn new(tools: &ToolsConfig, probe: &ProbeConfig) -> Self {
        Self {
            probe: DurationProbe::new(tools, probe),
            concat: AudioConcatenator::new(tools, probe),
        }
    }
}

impl AudioToolkit for FfmpegAudio {
    fn measure(&self, bytes: &[u8]) -> DurationMeasurement {
        self.probe.measure(bytes)
    }

    fn concat(&self, first: &AudioClip, second: &AudioClip) -> ClipcastResult<AudioClip> {
        self.concat.concat(first, second)
    }
}

//! Encoded audio clips and duration measurements.

use serde::{Deserialize, Serialize};

/// How a duration value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationSource {
    /// Read from the container/stream by a media probe.
    Measured,
    /// Derived from byte length and an assumed bitrate. Low confidence.
    Estimated,
}

/// A playback duration together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationMeasurement {
    pub secs: f64,
    pub source: DurationSource,
}

impl DurationMeasurement {
    pub fn measured(secs: f64) -> Self {
        Self {
            secs,
            source: DurationSource::Measured,
        }
    }

    pub fn estimated(secs: f64) -> Self {
        Self {
            secs,
            source: DurationSource::Estimated,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.source == DurationSource::Measured
    }

    /// The duration, but only when it can be trusted for synchronization.
    ///
    /// Estimates return `None`: consumers placing transitions must treat them
    /// as absent timing data.
    pub fn exact_secs(&self) -> Option<f64> {
        (self.is_exact() && self.secs.is_finite() && self.secs > 0.0).then_some(self.secs)
    }
}

/// An immutable encoded audio clip with its duration.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    bytes: Vec<u8>,
    duration: DurationMeasurement,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, duration: DurationMeasurement) -> Self {
        Self { bytes, duration }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn duration(&self) -> DurationMeasurement {
        self.duration
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.secs
    }
}

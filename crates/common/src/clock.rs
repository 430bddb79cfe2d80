//! Clock and timing utilities.
//!
//! - `PipelineClock`: monotonic run timer anchored to a wall-clock start
//! - `Sleeper`: injectable suspension used by polling loops, so tests can
//!   drive a 5-minute polling budget without waiting for it

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A run clock that provides monotonic timestamps relative to the moment a
/// pipeline run started.
#[derive(Debug, Clone)]
pub struct PipelineClock {
    /// The instant the run started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl PipelineClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at run start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Compact identifier derived from the start time, usable in file names.
    pub fn run_id(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.epoch_wall)
            .map(|t| t.format("%Y%m%dT%H%M%S%3f").to_string())
            .unwrap_or_else(|_| "run".to_string())
    }
}

/// Something that can suspend the current task for a duration.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and records every requested wait.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// All waits requested so far, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Sum of all requested waits (the virtual wall time spent sleeping).
    pub fn total(&self) -> Duration {
        self.waits().iter().sum()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = PipelineClock::start();
        assert!(clock.elapsed_secs() < 1.0);
    }

    #[test]
    fn test_run_id_is_filename_safe() {
        let clock = PipelineClock::start();
        let id = clock.run_id();
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_recording_sleeper_accumulates() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(10)).await;
        sleeper.sleep(Duration::from_secs(10)).await;
        assert_eq!(sleeper.waits().len(), 2);
        assert_eq!(sleeper.total(), Duration::from_secs(20));
    }
}

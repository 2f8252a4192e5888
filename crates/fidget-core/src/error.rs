//! Error taxonomy.
//!
//! Only two conditions ever surface to callers: a recoverable sufficiency
//! failure at generation time, and an audio device that could not be opened.
//! Transient producer failures (a flaky scheduler stat read, a dropped audio
//! buffer) are swallowed at the source and never propagate.

use serde::Serialize;
use thiserror::Error;

/// Detailed breakdown of which sufficiency thresholds were unmet.
///
/// Carries both the observed values and the configured requirements so a
/// caller can decide whether to keep waiting.
#[derive(Debug, Clone, Serialize)]
pub struct EntropyShortfall {
    /// Accumulated active pointer movement at evaluation time, in seconds.
    pub active_seconds: f64,
    /// Required active movement, in seconds.
    pub required_seconds: f64,
    /// Current pointer pool size.
    pub pointer_samples: usize,
    /// Required pointer pool size.
    pub min_pointer_samples: usize,
    /// Current audio pool size, when the audio source is enabled.
    pub audio_samples: Option<usize>,
    /// Required audio pool size, when the audio source is enabled.
    pub min_audio_samples: Option<usize>,
    /// Concatenated snapshot size across all pools.
    pub total_samples: usize,
    /// Required snapshot size for the requested operation.
    pub min_total_samples: usize,
}

impl EntropyShortfall {
    /// Names of the thresholds that failed, in evaluation order.
    pub fn failed_thresholds(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.active_seconds < self.required_seconds {
            failed.push("active_duration");
        }
        if self.pointer_samples < self.min_pointer_samples {
            failed.push("pointer_samples");
        }
        if let (Some(audio), Some(min)) = (self.audio_samples, self.min_audio_samples) {
            if audio < min {
                failed.push("audio_samples");
            }
        }
        if self.total_samples < self.min_total_samples {
            failed.push("total_samples");
        }
        failed
    }
}

impl std::fmt::Display for EntropyShortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.1}s/{:.0}s active movement, {}/{} pointer samples",
            self.active_seconds,
            self.required_seconds,
            self.pointer_samples,
            self.min_pointer_samples
        )?;
        if let (Some(audio), Some(min)) = (self.audio_samples, self.min_audio_samples) {
            write!(f, ", {audio}/{min} audio samples")?;
        }
        write!(
            f,
            ", {}/{} total samples",
            self.total_samples, self.min_total_samples
        )
    }
}

/// Errors surfaced by the collection engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Not enough entropy has accumulated to permit generation. Recoverable:
    /// wait for more collection and retry.
    #[error("insufficient entropy: {0}")]
    InsufficientEntropy(EntropyShortfall),

    /// The audio input device could not be opened. The audio source is
    /// disabled for the remainder of the session; collection continues with
    /// the remaining sources.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
}

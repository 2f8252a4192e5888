//! Sufficiency gate.
//!
//! A pure predicate over tracker state and pool sizes. It gates status
//! reporting and generation, never collection itself, and is evaluated fresh
//! on every call (no caching).

use std::time::Duration;

use crate::config::CollectorConfig;
use crate::error::EntropyShortfall;

/// Decides whether enough true randomness has accumulated to permit output.
#[derive(Debug, Clone)]
pub struct SufficiencyPolicy {
    required_active_duration: Duration,
    min_pointer_samples: usize,
    /// `Some` only when the audio source is part of the session.
    min_audio_samples: Option<usize>,
}

impl SufficiencyPolicy {
    /// Build the policy from collector configuration.
    pub fn from_config(config: &CollectorConfig, audio_enabled: bool) -> Self {
        Self {
            required_active_duration: config.required_active_duration,
            min_pointer_samples: config.min_pointer_samples,
            min_audio_samples: audio_enabled.then_some(config.min_audio_samples),
        }
    }

    /// The pure sufficiency predicate.
    pub fn is_sufficient(
        &self,
        active_duration: Duration,
        pointer_samples: usize,
        audio_samples: usize,
    ) -> bool {
        let audio_ok = match self.min_audio_samples {
            Some(min) => audio_samples >= min,
            None => true,
        };
        active_duration >= self.required_active_duration
            && pointer_samples >= self.min_pointer_samples
            && audio_ok
    }

    /// Evaluate the predicate plus the operation-specific snapshot minimum,
    /// producing a full shortfall breakdown on failure.
    pub fn check_generation(
        &self,
        active_duration: Duration,
        pointer_samples: usize,
        audio_samples: usize,
        total_samples: usize,
        min_total_samples: usize,
    ) -> Result<(), EntropyShortfall> {
        if self.is_sufficient(active_duration, pointer_samples, audio_samples)
            && total_samples >= min_total_samples
        {
            return Ok(());
        }
        Err(EntropyShortfall {
            active_seconds: active_duration.as_secs_f64(),
            required_seconds: self.required_active_duration.as_secs_f64(),
            pointer_samples,
            min_pointer_samples: self.min_pointer_samples,
            audio_samples: self.min_audio_samples.map(|_| audio_samples),
            min_audio_samples: self.min_audio_samples,
            total_samples,
            min_total_samples,
        })
    }
}

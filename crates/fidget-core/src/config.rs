//! Collector configuration.
//!
//! Every threshold the engine consults is injectable so that tests and
//! interactive callers can run with accelerated values (e.g. a 1-second
//! required duration instead of the reference 30 seconds).

use std::time::Duration;

/// Reference pool capacity per source.
pub const DEFAULT_POOL_CAPACITY: usize = 2000;

/// Output range: generated numbers fall in `[0, OUTPUT_RANGE)`.
pub const OUTPUT_RANGE: u32 = 2048;

/// Tunable parameters for a [`Collector`](crate::Collector).
///
/// `Default` yields the reference behavior: 2000-sample pools, a 2-second
/// pointer activity timeout, 30 seconds of required active movement, and the
/// 300/100 per-source sample minimums.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum samples retained per source pool (oldest evicted first).
    pub pool_capacity: usize,
    /// Pointer gap longer than this ends the current active segment.
    pub activity_timeout: Duration,
    /// Accumulated active pointer time required before generation is allowed.
    pub required_active_duration: Duration,
    /// Minimum pointer samples required for sufficiency.
    pub min_pointer_samples: usize,
    /// Minimum audio samples required for sufficiency (only when audio is enabled).
    pub min_audio_samples: usize,
    /// Minimum concatenated snapshot size for single-number generation.
    pub min_total_samples_single: usize,
    /// Minimum concatenated snapshot size for batch generation.
    pub min_total_samples_batch: usize,
    /// Scheduler source tick period.
    pub scheduler_interval: Duration,
    /// Audio capture parameters.
    pub audio: AudioConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            activity_timeout: Duration::from_secs(2),
            required_active_duration: Duration::from_secs(30),
            min_pointer_samples: 300,
            min_audio_samples: 100,
            min_total_samples_single: 300,
            min_total_samples_batch: 400,
            scheduler_interval: Duration::from_millis(10),
            audio: AudioConfig::default(),
        }
    }
}

/// Audio capture parameters for the microphone source.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Frames per buffer read. One buffer yields one entropy sample.
    pub chunk_frames: usize,
    /// Input device override. `None` uses the platform default input.
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            chunk_frames: 1024,
            device: None,
        }
    }
}

impl AudioConfig {
    /// Bytes per buffer read (s16le PCM).
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_frames * self.channels as usize * 2
    }
}

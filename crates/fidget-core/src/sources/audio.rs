//! Microphone audio source.
//!
//! Captures s16le PCM from the default input device through a long-lived
//! ffmpeg child process and turns each buffer into one sample from its RMS,
//! peak amplitude, and variance, XORed with a timestamp term truncated to
//! 16 bits.
//!
//! The capture process is an exclusive resource. It is reaped on the producer
//! loop's exit path — never from the stop call itself — so release happens
//! exactly once even when collection is stopped mid-read.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::config::AudioConfig;
use crate::error::Error;
use crate::pool::SamplePool;

use super::timestamp_ns;

/// Compute a sample value from one buffer of s16le PCM.
///
/// Returns `None` for an empty buffer.
pub fn sample_value(pcm: &[u8], timestamp_ns: u128) -> Option<u32> {
    let samples: Vec<i32> = pcm
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]) as i32)
        .collect();
    if samples.is_empty() {
        return None;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let mean_square = samples.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / n;

    let rms = mean_square.sqrt() as u32 & 0xFFFF;
    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0) & 0xFFFF;
    let variance = (mean_square - mean * mean).max(0.0) as u64 & 0xFFFF_FFFF;

    let ts_low = (timestamp_ns & 0xFFFF) as u32;
    Some((rms ^ peak ^ (variance as u32 & 0xFFFF) ^ ts_low) & 0xFFFF)
}

/// Spawn the ffmpeg capture child writing raw s16le PCM to stdout.
fn spawn_capture(config: &AudioConfig) -> std::io::Result<Child> {
    #[cfg(target_os = "macos")]
    let (input_format, default_device) = ("avfoundation", ":0");
    #[cfg(not(target_os = "macos"))]
    let (input_format, default_device) = ("alsa", "default");

    let device = config.device.as_deref().unwrap_or(default_device);

    Command::new("ffmpeg")
        .args([
            "-f",
            input_format,
            "-i",
            device,
            "-f",
            "s16le",
            "-ar",
            &config.sample_rate.to_string(),
            "-ac",
            &config.channels.to_string(),
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
}

/// Producer reading microphone buffers into its dedicated pool.
pub struct AudioSource {
    pool: Arc<SamplePool>,
    config: AudioConfig,
}

impl AudioSource {
    pub fn new(pool: Arc<SamplePool>, config: AudioConfig) -> Self {
        Self { pool, config }
    }

    /// Open the capture stream and spawn the read loop.
    ///
    /// Fails with [`Error::DeviceUnavailable`] if the stream cannot be
    /// opened; the owner is expected to continue without audio. Once
    /// running, the loop observes `collecting` once per buffer (one buffer
    /// is ~23 ms at the reference rate) and reaps the child on exit. If the
    /// stream dies mid-session, `live` is cleared so the owner stops
    /// counting this source toward sufficiency.
    pub fn spawn(
        self,
        collecting: Arc<AtomicBool>,
        live: Arc<AtomicBool>,
    ) -> Result<JoinHandle<()>, Error> {
        let mut child =
            spawn_capture(&self.config).map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::DeviceUnavailable(
                "capture process has no stdout".to_string(),
            ));
        };

        let chunk_bytes = self.config.chunk_bytes();
        let pool = self.pool;
        Ok(thread::spawn(move || {
            let mut buf = vec![0u8; chunk_bytes];
            while collecting.load(Ordering::Relaxed) {
                match stdout.read_exact(&mut buf) {
                    Ok(()) => {
                        if let Some(value) = sample_value(&buf, timestamp_ns()) {
                            pool.push(value);
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                        log::warn!("audio capture stream ended: {e}");
                        live.store(false, Ordering::Relaxed);
                        break;
                    }
                    Err(e) => {
                        log::debug!("audio read error, skipping buffer: {e}");
                    }
                }
            }
            // Exactly-once release, bound to loop exit.
            let _ = child.kill();
            let _ = child.wait();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_from(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn empty_buffer_yields_no_sample() {
        assert_eq!(sample_value(&[], 12345), None);
    }

    #[test]
    fn value_is_16_bit() {
        let pcm = pcm_from(&[100, -200, 3000, -4000, 32767, -32768]);
        let v = sample_value(&pcm, 1_700_000_000_999_999_999).unwrap();
        assert!(v <= 0xFFFF);
    }

    #[test]
    fn silence_reduces_to_timestamp_term() {
        // RMS, peak, and variance of silence are all zero.
        let pcm = pcm_from(&[0; 64]);
        let ts: u128 = 0xABCD_1234;
        assert_eq!(sample_value(&pcm, ts).unwrap(), (ts & 0xFFFF) as u32);
    }

    #[test]
    fn constant_signal_has_zero_variance() {
        // Constant 1000: RMS = peak = 1000, variance = 0.
        let pcm = pcm_from(&[1000; 32]);
        let v = sample_value(&pcm, 0).unwrap();
        assert_eq!(v, 1000 ^ 1000);
    }

    #[test]
    fn extreme_amplitudes_do_not_overflow() {
        let pcm = pcm_from(&[i16::MIN; 128]);
        let v = sample_value(&pcm, u128::MAX).unwrap();
        assert!(v <= 0xFFFF);
    }
}

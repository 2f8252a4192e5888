//! Pointer motion source.
//!
//! Invoked once per motion event with raw 2D coordinates — no throttling.
//! The event callback context belongs to whatever front end owns the
//! collector; this module only turns coordinates into sample values and
//! feeds the activity tracker.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::activity::ActivityTracker;
use crate::pool::SamplePool;

use super::timestamp_ns;

/// Compute a pointer sample value from coordinates and a nanosecond timestamp.
///
/// `x XOR y XOR (timestamp & 0xFFFFFFFF)`, truncated to 16 bits. When the
/// pool already holds samples, a microsecond-precision jitter term derived
/// from the sub-second portion of the timestamp is XORed in.
pub fn sample_value(x: i32, y: i32, timestamp_ns: u128, mix_jitter: bool) -> u32 {
    let ts_low = (timestamp_ns & 0xFFFF_FFFF) as u32;
    let mut value = (x as u32 ^ y as u32 ^ ts_low) & 0xFFFF;
    if mix_jitter {
        let jitter = ((timestamp_ns % 1_000_000) * 1000) as u32;
        value ^= jitter;
    }
    value
}

/// Producer for pointer motion events.
///
/// Writes into its dedicated pool and is the only writer of the activity
/// tracker. Never blocks.
pub struct PointerSource {
    pool: Arc<SamplePool>,
    tracker: Arc<Mutex<ActivityTracker>>,
}

impl PointerSource {
    pub fn new(pool: Arc<SamplePool>, tracker: Arc<Mutex<ActivityTracker>>) -> Self {
        Self { pool, tracker }
    }

    /// Record one motion event at the current time.
    pub fn on_motion(&self, x: i32, y: i32) {
        self.tracker.lock().unwrap().on_activity(Instant::now());
        let mix_jitter = !self.pool.is_empty();
        self.pool.push(sample_value(x, y, timestamp_ns(), mix_jitter));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SourceKind;
    use std::time::Duration;

    #[test]
    fn first_sample_is_16_bit() {
        let v = sample_value(12345, 67890, 1_700_000_000_123_456_789, false);
        assert!(v <= 0xFFFF);
        assert_eq!(
            v,
            (12345u32 ^ 67890 ^ (1_700_000_000_123_456_789u128 & 0xFFFF_FFFF) as u32) & 0xFFFF
        );
    }

    #[test]
    fn jitter_term_uses_sub_second_nanos() {
        let ts: u128 = 1_700_000_000_000_654_321;
        let base = sample_value(10, 20, ts, false);
        let jittered = sample_value(10, 20, ts, true);
        let jitter = ((ts % 1_000_000) * 1000) as u32;
        assert_eq!(jittered, base ^ jitter);
    }

    #[test]
    fn on_motion_feeds_pool_and_tracker() {
        let pool = Arc::new(SamplePool::new(SourceKind::Pointer, 100));
        let tracker = Arc::new(Mutex::new(ActivityTracker::new(Duration::from_secs(2))));
        let source = PointerSource::new(Arc::clone(&pool), Arc::clone(&tracker));

        source.on_motion(100, 200);
        source.on_motion(101, 202);

        assert_eq!(pool.len(), 2);
        assert!(tracker.lock().unwrap().is_active(Instant::now()));
    }
}

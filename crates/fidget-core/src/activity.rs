//! Pointer activity tracking.
//!
//! The tracker accumulates how long the pointer has been in continuous motion.
//! Motion events closer together than the activity timeout extend the current
//! active segment; a longer gap is discarded entirely (no credit, no penalty)
//! and the next event starts a fresh segment. The accumulated duration is the
//! admission gate for "enough true randomness has been observed".

use std::time::{Duration, Instant};

/// Tracks whether the pointer is currently active and how much total active
/// movement time has accumulated.
///
/// All methods take an explicit `now` so behavior is testable without real
/// sleeps. The accumulated duration only ever increases, and only by gaps
/// at or below the timeout.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    last_activity: Option<Instant>,
    accumulated: Duration,
    timeout: Duration,
}

impl ActivityTracker {
    /// Create a tracker with the given activity timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_activity: None,
            accumulated: Duration::ZERO,
            timeout,
        }
    }

    /// Record a motion event at `now`.
    ///
    /// If the gap since the previous event is within the timeout, it is added
    /// to the accumulated active duration; otherwise the gap is dropped.
    pub fn on_activity(&mut self, now: Instant) {
        if let Some(prior) = self.last_activity {
            let gap = now.saturating_duration_since(prior);
            if gap <= self.timeout {
                self.accumulated += gap;
            }
        }
        self.last_activity = Some(now);
    }

    /// Total active duration as of `now`.
    ///
    /// A currently-live segment counts continuously: if the gap since the
    /// last event is within the timeout it is included without waiting for
    /// the next event.
    pub fn current_duration(&self, now: Instant) -> Duration {
        let Some(last) = self.last_activity else {
            return Duration::ZERO;
        };
        let gap = now.saturating_duration_since(last);
        if gap <= self.timeout {
            self.accumulated + gap
        } else {
            self.accumulated
        }
    }

    /// Whether the pointer moved within the last timeout window.
    pub fn is_active(&self, now: Instant) -> bool {
        match self.last_activity {
            Some(last) => now.saturating_duration_since(last) <= self.timeout,
            None => false,
        }
    }

    /// Discard all state. Called when a new collection session starts.
    pub fn reset(&mut self) {
        self.last_activity = None;
        self.accumulated = Duration::ZERO;
    }
}

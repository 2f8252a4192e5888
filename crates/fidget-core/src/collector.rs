//! Collection session orchestration.
//!
//! The [`Collector`] owns the per-source pools and the activity tracker,
//! starts and stops the producer threads, and exposes the snapshot, status,
//! and generation operations. Lifecycle is Idle → Collecting → Idle; both
//! transitions are idempotent and stop never leaves resources held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime};

use serde::Serialize;

use crate::activity::ActivityTracker;
use crate::config::CollectorConfig;
use crate::error::Error;
use crate::mixer;
use crate::policy::SufficiencyPolicy;
use crate::pool::{SamplePool, SourceKind};
use crate::sources::audio::AudioSource;
use crate::sources::pointer::PointerSource;
use crate::sources::scheduler::SchedulerSource;
use crate::sources::timestamp_ns;

/// Options for starting a collection session.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOptions {
    /// Also open the microphone source.
    pub audio_enabled: bool,
}

/// Read-only snapshot of collection progress. Safe to poll at any rate.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub pointer_samples: usize,
    pub scheduler_samples: usize,
    pub audio_samples: usize,
    pub total_samples: usize,
    pub active_duration_seconds: f64,
    pub is_pointer_active: bool,
}

/// One generated output. History entries are append-only and never mutated.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeneratedNumber {
    /// Value in `[0, 2048)`.
    pub value: u16,
    pub generated_at: SystemTime,
}

struct SessionState {
    collecting: bool,
    handles: Vec<JoinHandle<()>>,
}

/// Entropy collection and generation engine.
///
/// Construct one per caller that needs a session; there is no hidden global.
/// Producer threads write their own pools; status and generation calls read
/// point-in-time copies, so the collector is safe to share behind an `Arc`.
pub struct Collector {
    config: CollectorConfig,
    pointer_pool: Arc<SamplePool>,
    scheduler_pool: Arc<SamplePool>,
    audio_pool: Arc<SamplePool>,
    tracker: Arc<Mutex<ActivityTracker>>,
    pointer: PointerSource,
    /// Shared stop signal: true while producers should keep running.
    collecting: Arc<AtomicBool>,
    /// Whether the audio source is live in the current session. Cleared by
    /// the audio producer itself if its stream dies.
    audio_enabled: Arc<AtomicBool>,
    state: Mutex<SessionState>,
    history: Mutex<Vec<GeneratedNumber>>,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        let pointer_pool = Arc::new(SamplePool::new(SourceKind::Pointer, config.pool_capacity));
        let scheduler_pool = Arc::new(SamplePool::new(SourceKind::Scheduler, config.pool_capacity));
        let audio_pool = Arc::new(SamplePool::new(SourceKind::Audio, config.pool_capacity));
        let tracker = Arc::new(Mutex::new(ActivityTracker::new(config.activity_timeout)));
        let pointer = PointerSource::new(Arc::clone(&pointer_pool), Arc::clone(&tracker));

        Self {
            config,
            pointer_pool,
            scheduler_pool,
            audio_pool,
            tracker,
            pointer,
            collecting: Arc::new(AtomicBool::new(false)),
            audio_enabled: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(SessionState {
                collecting: false,
                handles: Vec::new(),
            }),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Collector with the reference configuration.
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Transition Idle → Collecting: reset the tracker, clear the pools, and
    /// spawn the enabled producers. A no-op while already collecting.
    pub fn start_collection(&self, options: StartOptions) {
        let mut state = self.state.lock().unwrap();
        if state.collecting {
            return;
        }

        self.tracker.lock().unwrap().reset();
        self.pointer_pool.clear();
        self.scheduler_pool.clear();
        self.audio_pool.clear();
        self.collecting.store(true, Ordering::Relaxed);

        let scheduler = SchedulerSource::new(
            Arc::clone(&self.scheduler_pool),
            self.config.scheduler_interval,
        );
        state.handles.push(scheduler.spawn(Arc::clone(&self.collecting)));

        if options.audio_enabled {
            let audio = AudioSource::new(Arc::clone(&self.audio_pool), self.config.audio.clone());
            self.audio_enabled.store(true, Ordering::Relaxed);
            match audio.spawn(Arc::clone(&self.collecting), Arc::clone(&self.audio_enabled)) {
                Ok(handle) => {
                    state.handles.push(handle);
                }
                Err(e) => {
                    // Collection continues with the remaining sources.
                    log::warn!("{e}; continuing without audio");
                    self.audio_enabled.store(false, Ordering::Relaxed);
                }
            }
        } else {
            self.audio_enabled.store(false, Ordering::Relaxed);
        }

        state.collecting = true;
    }

    /// Transition Collecting → Idle: signal every producer to halt and join
    /// them. Producers observe the signal within one polling interval; the
    /// audio child process is released by its loop's exit path. A no-op
    /// while already idle.
    pub fn stop_collection(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.collecting {
            return;
        }
        self.collecting.store(false, Ordering::Relaxed);
        for handle in state.handles.drain(..) {
            let _ = handle.join();
        }
        state.collecting = false;
    }

    /// Whether a collection session is running.
    pub fn is_collecting(&self) -> bool {
        self.state.lock().unwrap().collecting
    }

    /// Feed one pointer motion event. Ignored while idle.
    ///
    /// This is the pointer producer's entry point: the owning front end calls
    /// it from its motion-event callback context, once per event.
    pub fn record_pointer_motion(&self, x: i32, y: i32) {
        if self.collecting.load(Ordering::Relaxed) {
            self.pointer.on_motion(x, y);
        }
    }

    /// Current collection progress.
    pub fn status(&self) -> Status {
        let now = Instant::now();
        let tracker = self.tracker.lock().unwrap();
        let pointer_samples = self.pointer_pool.len();
        let scheduler_samples = self.scheduler_pool.len();
        let audio_samples = self.audio_pool.len();
        Status {
            pointer_samples,
            scheduler_samples,
            audio_samples,
            total_samples: pointer_samples + scheduler_samples + audio_samples,
            active_duration_seconds: tracker.current_duration(now).as_secs_f64(),
            is_pointer_active: tracker.is_active(now),
        }
    }

    /// Whether the sufficiency gate currently passes. Evaluated fresh.
    pub fn is_sufficient(&self) -> bool {
        let now = Instant::now();
        let active = self.tracker.lock().unwrap().current_duration(now);
        self.policy()
            .is_sufficient(active, self.pointer_pool.len(), self.audio_pool.len())
    }

    /// Generate one number in `[0, 2048)` from the current pool snapshot.
    pub fn generate_one(&self) -> Result<u16, Error> {
        let snapshot = self.snapshot();
        self.check_generation(snapshot.len(), self.config.min_total_samples_single)?;
        let value = mixer::mix_one(&snapshot, timestamp_ns());
        self.record(value);
        Ok(value)
    }

    /// Generate `count` independently-mixed numbers in `[0, 2048)`.
    pub fn generate_many(&self, count: usize) -> Result<Vec<u16>, Error> {
        let snapshot = self.snapshot();
        self.check_generation(snapshot.len(), self.config.min_total_samples_batch)?;
        let values = mixer::mix_batch(&snapshot, timestamp_ns(), count);
        {
            let mut history = self.history.lock().unwrap();
            let generated_at = SystemTime::now();
            history.extend(values.iter().map(|&value| GeneratedNumber {
                value,
                generated_at,
            }));
        }
        Ok(values)
    }

    /// Append-only history of every number generated by this collector.
    pub fn generated_numbers(&self) -> Vec<GeneratedNumber> {
        self.history.lock().unwrap().clone()
    }

    /// Directly seed a pool with raw values, bypassing the producers.
    ///
    /// Intended for acceptance tests and offline analysis runs that need a
    /// synthetic pool; interactive collection never calls this.
    pub fn seed_pool(&self, kind: SourceKind, values: impl IntoIterator<Item = u32>) {
        let pool = match kind {
            SourceKind::Pointer => &self.pointer_pool,
            SourceKind::Scheduler => &self.scheduler_pool,
            SourceKind::Audio => &self.audio_pool,
        };
        for value in values {
            pool.push(value);
        }
    }

    /// Point-in-time copy of all pools in mixing order: pointer, scheduler,
    /// audio. Concurrent appends during hashing cannot affect it.
    fn snapshot(&self) -> Vec<u32> {
        let mut snapshot = self.pointer_pool.snapshot();
        snapshot.extend(self.scheduler_pool.snapshot());
        snapshot.extend(self.audio_pool.snapshot());
        snapshot
    }

    fn policy(&self) -> SufficiencyPolicy {
        SufficiencyPolicy::from_config(&self.config, self.audio_enabled.load(Ordering::Relaxed))
    }

    fn check_generation(&self, total: usize, min_total: usize) -> Result<(), Error> {
        let now = Instant::now();
        let active = self.tracker.lock().unwrap().current_duration(now);
        self.policy()
            .check_generation(
                active,
                self.pointer_pool.len(),
                self.audio_pool.len(),
                total,
                min_total,
            )
            .map_err(Error::InsufficientEntropy)
    }

    fn record(&self, value: u16) {
        self.history.lock().unwrap().push(GeneratedNumber {
            value,
            generated_at: SystemTime::now(),
        });
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop_collection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Config with every admission gate open, for exercising the pipeline
    /// without a human at the mouse.
    fn open_config() -> CollectorConfig {
        CollectorConfig {
            required_active_duration: Duration::ZERO,
            min_pointer_samples: 0,
            min_total_samples_single: 1,
            min_total_samples_batch: 1,
            ..CollectorConfig::default()
        }
    }

    #[test]
    fn starts_idle() {
        let c = Collector::with_defaults();
        assert!(!c.is_collecting());
        let status = c.status();
        assert_eq!(status.total_samples, 0);
        assert!(!status.is_pointer_active);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let c = Collector::new(open_config());
        c.start_collection(StartOptions::default());
        c.start_collection(StartOptions::default());
        assert!(c.is_collecting());
        c.stop_collection();
        c.stop_collection();
        assert!(!c.is_collecting());
    }

    #[test]
    fn pointer_motion_ignored_while_idle() {
        let c = Collector::with_defaults();
        c.record_pointer_motion(10, 20);
        assert_eq!(c.status().pointer_samples, 0);
    }

    #[test]
    fn pointer_motion_recorded_while_collecting() {
        let c = Collector::new(open_config());
        c.start_collection(StartOptions::default());
        c.record_pointer_motion(10, 20);
        c.record_pointer_motion(11, 21);
        let status = c.status();
        assert_eq!(status.pointer_samples, 2);
        assert!(status.is_pointer_active);
        c.stop_collection();
    }

    #[test]
    fn status_total_is_sum_of_sources() {
        let c = Collector::with_defaults();
        c.seed_pool(SourceKind::Pointer, [1, 2, 3]);
        c.seed_pool(SourceKind::Scheduler, [4, 5]);
        c.seed_pool(SourceKind::Audio, [6]);
        let status = c.status();
        assert_eq!(status.pointer_samples, 3);
        assert_eq!(status.scheduler_samples, 2);
        assert_eq!(status.audio_samples, 1);
        assert_eq!(status.total_samples, 6);
    }

    #[test]
    fn generate_fails_without_entropy() {
        let c = Collector::with_defaults();
        let err = c.generate_one().unwrap_err();
        match err {
            Error::InsufficientEntropy(shortfall) => {
                assert!(shortfall.failed_thresholds().contains(&"active_duration"));
                assert!(shortfall.failed_thresholds().contains(&"pointer_samples"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lowered_thresholds_allow_generation() {
        // Concrete reference scenario: pointer [10, 20, 30], scheduler [100],
        // min_pointer_samples=3, required_duration=0.
        let c = Collector::new(CollectorConfig {
            required_active_duration: Duration::ZERO,
            min_pointer_samples: 3,
            min_total_samples_single: 3,
            min_total_samples_batch: 4,
            ..CollectorConfig::default()
        });
        c.seed_pool(SourceKind::Pointer, [10, 20, 30]);
        c.seed_pool(SourceKind::Scheduler, [100]);

        let v = c.generate_one().unwrap();
        assert!(v < 2048);

        let batch = c.generate_many(2).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|&v| v < 2048));
    }

    #[test]
    fn batch_minimum_is_separate_from_single() {
        let c = Collector::new(CollectorConfig {
            required_active_duration: Duration::ZERO,
            min_pointer_samples: 0,
            min_total_samples_single: 3,
            min_total_samples_batch: 10,
            ..CollectorConfig::default()
        });
        c.seed_pool(SourceKind::Pointer, [1, 2, 3, 4, 5]);
        assert!(c.generate_one().is_ok());
        assert!(matches!(
            c.generate_many(2),
            Err(Error::InsufficientEntropy(_))
        ));
    }

    #[test]
    fn history_is_append_only() {
        let c = Collector::new(open_config());
        c.seed_pool(SourceKind::Scheduler, 0..50u32);
        let a = c.generate_one().unwrap();
        let batch = c.generate_many(3).unwrap();
        let history = c.generated_numbers();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].value, a);
        assert_eq!(
            history[1..].iter().map(|g| g.value).collect::<Vec<_>>(),
            batch
        );
    }

    #[test]
    fn start_clears_previous_session() {
        let c = Collector::new(open_config());
        c.seed_pool(SourceKind::Pointer, [1, 2, 3]);
        c.start_collection(StartOptions::default());
        assert_eq!(c.status().pointer_samples, 0);
        c.stop_collection();
    }

    #[test]
    fn scheduler_producer_feeds_pool() {
        let c = Collector::new(open_config());
        c.start_collection(StartOptions::default());
        std::thread::sleep(Duration::from_millis(120));
        c.stop_collection();
        assert!(
            c.status().scheduler_samples > 0,
            "scheduler thread should have ticked"
        );
    }

    #[test]
    fn audio_open_failure_disables_source_not_session() {
        // Point the capture at a device that cannot exist; start must still
        // succeed and sufficiency must not demand audio samples.
        let mut config = open_config();
        config.audio.device = Some("/nonexistent/fidget-test-device".to_string());
        let c = Collector::new(config);
        c.start_collection(StartOptions { audio_enabled: true });
        std::thread::sleep(Duration::from_millis(500));
        c.seed_pool(SourceKind::Pointer, [1, 2, 3]);
        // Either ffmpeg is missing (spawn failed) or the device open failed
        // and the stream ended; both leave the session running and drop the
        // audio term from sufficiency.
        assert!(c.is_collecting());
        assert!(c.is_sufficient());
        c.stop_collection();
        assert!(!c.is_collecting());
        // Second stop must not double-release the audio resource.
        c.stop_collection();
    }
}

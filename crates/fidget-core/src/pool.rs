//! Bounded, order-preserving sample pools.
//!
//! Each source writes into its own pool; the consumer copies a point-in-time
//! snapshot before mixing. Exactly one producer writes a given pool, so a
//! mutex around a ring buffer is all the discipline the contract needs: an
//! append (with eviction) is atomic with respect to snapshot reads, and a
//! snapshot is never affected by appends that land during hashing.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Which source produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceKind {
    /// Pointer motion events.
    Pointer,
    /// Periodic scheduler/process statistics.
    Scheduler,
    /// Microphone buffer statistics.
    Audio,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pointer => write!(f, "pointer"),
            Self::Scheduler => write!(f, "scheduler"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// One timestamped entropy sample. Immutable once created.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    /// Mixed raw value.
    pub value: u32,
    /// Monotonic arrival sequence number within the pool.
    pub seq: u64,
}

/// Fixed-capacity FIFO buffer of samples from a single source.
///
/// Pushing beyond capacity evicts the oldest entry. Insertion order is
/// significant (it affects mixing) and is never reordered or deduplicated.
pub struct SamplePool {
    kind: SourceKind,
    capacity: usize,
    inner: Mutex<VecDeque<Sample>>,
    pushed: AtomicU64,
}

impl SamplePool {
    /// Create an empty pool for `kind` holding at most `capacity` samples.
    pub fn new(kind: SourceKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            pushed: AtomicU64::new(0),
        }
    }

    /// Source this pool belongs to.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Append a value, evicting the oldest sample if the pool is full.
    pub fn push(&self, value: u32) {
        let seq = self.pushed.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock().unwrap();
        if inner.len() == self.capacity {
            inner.pop_front();
        }
        inner.push_back(Sample { value, seq });
    }

    /// Current number of retained samples.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether the pool holds no samples.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Total samples ever pushed, including evicted ones.
    pub fn total_pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Copy the retained values in insertion order.
    pub fn snapshot(&self) -> Vec<u32> {
        self.inner.lock().unwrap().iter().map(|s| s.value).collect()
    }

    /// Drop all retained samples. The arrival counter keeps running.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn push_preserves_insertion_order() {
        let pool = SamplePool::new(SourceKind::Pointer, 10);
        for v in [10, 20, 30] {
            pool.push(v);
        }
        assert_eq!(pool.snapshot(), vec![10, 20, 30]);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let pool = SamplePool::new(SourceKind::Scheduler, 4);
        // capacity + k pushes leave exactly the most recent `capacity` values.
        for v in 0..7u32 {
            pool.push(v);
        }
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.snapshot(), vec![3, 4, 5, 6]);
        assert_eq!(pool.total_pushed(), 7);
    }

    #[test]
    fn len_never_exceeds_capacity() {
        let pool = SamplePool::new(SourceKind::Audio, 16);
        for v in 0..1000u32 {
            pool.push(v);
            assert!(pool.len() <= 16);
        }
    }

    #[test]
    fn duplicates_are_kept() {
        let pool = SamplePool::new(SourceKind::Pointer, 10);
        pool.push(7);
        pool.push(7);
        pool.push(7);
        assert_eq!(pool.snapshot(), vec![7, 7, 7]);
    }

    #[test]
    fn clear_empties_but_keeps_arrival_counter() {
        let pool = SamplePool::new(SourceKind::Pointer, 10);
        pool.push(1);
        pool.push(2);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.total_pushed(), 2);
    }

    #[test]
    fn concurrent_pushes_and_snapshots_do_not_tear() {
        let pool = Arc::new(SamplePool::new(SourceKind::Scheduler, 100));
        let writer = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                for v in 0..10_000u32 {
                    pool.push(v);
                }
            })
        };
        // Readers must always observe a consistent ordered prefix window.
        for _ in 0..200 {
            let snap = pool.snapshot();
            assert!(snap.len() <= 100);
            for w in snap.windows(2) {
                assert_eq!(w[1], w[0] + 1, "snapshot must be a contiguous window");
            }
        }
        writer.join().unwrap();
        assert_eq!(pool.total_pushed(), 10_000);
    }
}

//! Sample source producers.
//!
//! Each source is an independent producer appending to its own pool. None
//! reads another source's pool, and none blocks on another. Cancellation is
//! cooperative: the shared collecting flag is checked once per iteration.

pub mod audio;
pub mod pointer;
pub mod scheduler;

use std::time::{SystemTime, UNIX_EPOCH};

/// High-resolution wall-clock timestamp in nanoseconds since the epoch.
pub(crate) fn timestamp_ns() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

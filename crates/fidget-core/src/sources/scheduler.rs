//! Scheduler statistics source.
//!
//! Ticks on a fixed period (10 ms reference), reads system CPU-time counters
//! and the process count, and mixes them with the current high-resolution
//! timestamp into one sample per tick. A failed system read is skipped
//! silently — no propagation, no thread death — and the loop keeps ticking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::pool::SamplePool;

use super::timestamp_ns;

/// One reading of the scheduler counters.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerStats {
    /// Cumulative user-mode CPU time, microseconds.
    pub user_us: u64,
    /// Cumulative kernel-mode CPU time, microseconds.
    pub system_us: u64,
    /// Cumulative idle time, microseconds.
    pub idle_us: u64,
    /// Current process count.
    pub processes: u64,
}

/// Combine a stats reading with a timestamp into a sample value.
///
/// Multiplicative/additive mix reduced modulo 2^32: the three CPU-time
/// counters are summed and the process count is multiplied by the timestamp.
pub fn sample_value(stats: &SchedulerStats, timestamp_ns: u128) -> u32 {
    let mix = (stats.user_us as u128)
        .wrapping_add(stats.system_us as u128)
        .wrapping_add(stats.idle_us as u128)
        .wrapping_add((stats.processes as u128).wrapping_mul(timestamp_ns));
    mix as u32
}

/// Read the scheduler counters. Returns `None` on any read or parse failure.
pub fn read_scheduler_stats() -> Option<SchedulerStats> {
    #[cfg(target_os = "linux")]
    {
        read_proc_stat()
    }
    #[cfg(not(target_os = "linux"))]
    {
        read_ps_fallback()
    }
}

/// Parse the aggregate "cpu" line of /proc/stat and count /proc PID entries.
#[cfg(target_os = "linux")]
fn read_proc_stat() -> Option<SchedulerStats> {
    let stat = std::fs::read_to_string("/proc/stat").ok()?;
    let cpu_line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let mut fields = cpu_line.split_whitespace().skip(1);
    let user_ticks: u64 = fields.next()?.parse().ok()?;
    let _nice: u64 = fields.next()?.parse().ok()?;
    let system_ticks: u64 = fields.next()?.parse().ok()?;
    let idle_ticks: u64 = fields.next()?.parse().ok()?;

    // SAFETY: sysconf is a read-only libc call.
    let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    let hz = if hz > 0 { hz as u64 } else { 100 };
    let to_us = |ticks: u64| ticks.saturating_mul(1_000_000) / hz;

    let processes = std::fs::read_dir("/proc")
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()))
        })
        .count() as u64;

    Some(SchedulerStats {
        user_us: to_us(user_ticks),
        system_us: to_us(system_ticks),
        idle_us: to_us(idle_ticks),
        processes,
    })
}

/// Best-effort fallback for platforms without /proc: process count via `ps`,
/// CPU counters unavailable (zero). The timestamp term still varies per tick.
#[cfg(not(target_os = "linux"))]
fn read_ps_fallback() -> Option<SchedulerStats> {
    let output = std::process::Command::new("ps")
        .args(["-axo", "pid="])
        .stdin(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let processes = String::from_utf8_lossy(&output.stdout).lines().count() as u64;
    Some(SchedulerStats {
        user_us: 0,
        system_us: 0,
        idle_us: 0,
        processes,
    })
}

/// Periodic producer appending scheduler samples to its dedicated pool.
pub struct SchedulerSource {
    pool: Arc<SamplePool>,
    interval: Duration,
}

impl SchedulerSource {
    pub fn new(pool: Arc<SamplePool>, interval: Duration) -> Self {
        Self { pool, interval }
    }

    /// Spawn the tick loop. The thread exits within one interval of
    /// `collecting` being cleared.
    pub fn spawn(self, collecting: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            while collecting.load(Ordering::Relaxed) {
                match read_scheduler_stats() {
                    Some(stats) => self.pool.push(sample_value(&stats, timestamp_ns())),
                    None => log::debug!("scheduler stat read failed, skipping tick"),
                }
                thread::sleep(self.interval);
            }
        })
    }
}

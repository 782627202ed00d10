//! System CPU load from `/proc/stat` deltas
//!
//! `/proc/stat` only exposes cumulative jiffies, so a load figure needs two
//! readings. The tracker keeps the previous reading; the first call primes it
//! and reports the sentinel.

use std::sync::{Mutex, TryLockError};

use threadgauge_common::CPU_LOAD_UNAVAILABLE;

use super::procfs::{self, CpuTimes};

/// Busy fraction of all CPUs between two successive readings
#[derive(Debug, Default)]
pub struct CpuLoadTracker {
    last: Mutex<Option<CpuTimes>>,
}

impl CpuLoadTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: Mutex::new(None) }
    }

    /// Read `/proc/stat` and return the load percentage since the previous call.
    ///
    /// Returns [`CPU_LOAD_UNAVAILABLE`] when /proc is missing, on the first
    /// call, or when another thread is updating the tracker right now.
    pub fn sample(&self) -> f64 {
        match procfs::read_cpu_times() {
            Ok(now) => self.observe(now),
            Err(_) => CPU_LOAD_UNAVAILABLE,
        }
    }

    /// Feed one reading; returns the load since the previous reading.
    pub fn observe(&self, now: CpuTimes) -> f64 {
        let mut last = match self.last.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            // A read that would block counts as unavailable, never retried
            Err(TryLockError::WouldBlock) => return CPU_LOAD_UNAVAILABLE,
        };

        let Some(previous) = *last else {
            *last = Some(now);
            return CPU_LOAD_UNAVAILABLE;
        };

        match load_between(previous, now) {
            Some(load) => {
                *last = Some(now);
                load
            }
            // Same jiffy or counter reset: keep the old baseline
            None => CPU_LOAD_UNAVAILABLE,
        }
    }
}

/// Load percentage between two readings, `None` if no time elapsed
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn load_between(previous: CpuTimes, now: CpuTimes) -> Option<f64> {
    let total = now.total.checked_sub(previous.total)?;
    if total == 0 {
        return None;
    }
    let idle = now.idle.saturating_sub(previous.idle).min(total);
    Some((total - idle) as f64 / total as f64 * 100.0)
}

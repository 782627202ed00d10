//! # Thread Capacity Probe
//!
//! Creates idle threads in batches until something gives: the caller cancels,
//! the safety cap is reached, free memory headroom drops under the minimum, or
//! the OS refuses another thread. Every outcome, including failure, ends in a
//! [`ProbeResult`]; nothing escapes `run` as an error.
//!
//! ## Run Phases
//!
//! ```text
//! compact + measure ─▶ batch loop ─▶ compact + measure ─▶ cleanup ─▶ result
//!   (memory_before)     │  ▲            (memory_after)     (bounded)
//!                       ▼  │
//!              headroom check, spawn batch, progress
//! ```
//!
//! The memory-per-thread figure comes from two resident-set snapshots around
//! thousands of thread creations. It is a comparative, order-of-magnitude
//! diagnostic and nothing more.

use log::{debug, info, warn};
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use threadgauge_common::{ProbeConfig, ProbeNote, ProbeResult, StopReason};

use super::cancel::CancelToken;
use super::pool::ThreadPool;
use super::progress::Progress;
use super::stack_policy::StackSizePolicy;
use super::thread_handle::idle_until_stopped;
use crate::domain::{GaugeError, GaugeResult, Platform, StackSizeKb};
use crate::sampling::{compact_heap, ResourceSampler};

const MB: u64 = 1024 * 1024;

/// Park increment of idle probe threads. Cleanup unparks them explicitly, so
/// this only bounds how long a missed wakeup can delay an exit.
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Discovers how many threads this process can keep alive
#[derive(Debug, Clone)]
pub struct ThreadCapacityProbe {
    config: ProbeConfig,
    policy: StackSizePolicy,
    platform: Platform,
}

impl ThreadCapacityProbe {
    /// Validate `config` and build a probe for the current platform.
    ///
    /// # Errors
    /// Returns [`GaugeError::InvalidConfig`] when a limit is zero
    pub fn new(config: ProbeConfig) -> GaugeResult<Self> {
        validate(&config)?;
        Ok(Self { config, policy: StackSizePolicy::builtin(), platform: Platform::current() })
    }

    /// Replace the stack-size strategy table
    #[must_use]
    pub fn with_policy(mut self, policy: StackSizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve stack quirks as if running on `platform`
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run the probe to completion on the calling thread.
    ///
    /// Checks `cancel` between batches. Returns only after every thread it
    /// created has been signaled and reaped, or the cleanup budget ran out.
    pub fn run(&self, cancel: &CancelToken, on_progress: impl FnMut(String)) -> ProbeResult {
        let mut progress = Progress::new(on_progress);
        let limits = self.config.limits;
        let started = Instant::now();
        let sampler = ResourceSampler::new();
        let mut notes = Vec::new();

        let requested = StackSizeKb(self.config.stack_size_kb);
        progress.emit(format!("Starting max thread test with stack size: {requested}"));

        let choice = self.policy.resolve(self.platform, requested);
        if choice.overridden() {
            warn!("stack size {requested} is unstable on {}, using platform default", self.platform);
            progress.emit(format!("Stack size {requested} overridden with platform default"));
            notes.push(ProbeNote::StackSizeOverridden { requested_kb: requested.0 });
        }
        let stack_size = choice.effective();

        let memory_before = settled_resident_bytes(&sampler, limits.settle_delay);

        let capacity = usize::try_from(limits.safety_cap.min(4096)).unwrap_or(4096);
        let mut pool = ThreadPool::with_capacity("probe", capacity);
        let mut created: u32 = 0;
        let mut low_heap = false;
        let mut creation_error: Option<io::Error> = None;
        let mut next_progress = limits.progress_every;
        let min_free_bytes = limits.min_free_heap_mb.saturating_mul(MB);

        'batches: while !cancel.is_cancelled() && created < limits.safety_cap {
            // Unknown headroom (no procfs) never counts as low
            if let Some(headroom) = sampler.free_headroom_bytes() {
                if headroom < min_free_bytes {
                    debug!("headroom {} MB below minimum after {created} threads", headroom / MB);
                    low_heap = true;
                    break;
                }
            }

            let batch_end = created.saturating_add(limits.batch_size).min(limits.safety_cap);
            while created < batch_end {
                match pool.spawn(stack_size, |stop| idle_until_stopped(stop, IDLE_TICK)) {
                    Ok(()) => created += 1,
                    Err(e) => {
                        debug!("thread creation failed after {created} threads: {e}");
                        creation_error = Some(e);
                        break 'batches;
                    }
                }
            }

            if created >= next_progress {
                progress.emit(format!("Created {created} threads so far..."));
                next_progress = (created / limits.progress_every + 1) * limits.progress_every;
            }

            thread::sleep(limits.batch_pause);
        }

        let stop_reason = resolve_stop_reason(
            cancel.is_cancelled(),
            created >= limits.safety_cap,
            low_heap,
        );
        if let Some(e) = creation_error {
            notes.push(ProbeNote::CreationError { message: e.to_string() });
        }

        progress.emit(format!("Test complete ({stop_reason}). Measuring memory..."));
        let memory_after = settled_resident_bytes(&sampler, limits.settle_delay);
        let memory_per_thread_kb = memory_per_thread_kb(memory_before, memory_after, created);

        progress.emit(format!("Cleaning up {created} threads..."));
        let cleanup = pool.shutdown(limits.join_timeout, limits.cleanup_budget);
        if cleanup.budget_exhausted() {
            notes.push(ProbeNote::CleanupTimeout { abandoned: cleanup.abandoned });
        }

        let result = ProbeResult {
            max_threads: created,
            stack_size_kb: requested.0,
            memory_per_thread_kb,
            stop_reason,
            notes,
            elapsed_secs: started.elapsed().as_secs_f64(),
            memory_before_mb: memory_before / MB,
            memory_after_mb: memory_after / MB,
            threads_reaped: cleanup.joined,
            threads_abandoned: cleanup.abandoned,
        };

        info!(
            "probe finished: {} threads, ~{} KB/thread, reason: {}",
            result.max_threads, result.memory_per_thread_kb, result.stop_reason
        );
        result
    }
}

fn validate(config: &ProbeConfig) -> GaugeResult<()> {
    let limits = &config.limits;
    if limits.batch_size == 0 {
        return Err(GaugeError::invalid("batch_size", "must be greater than 0"));
    }
    if limits.safety_cap == 0 {
        return Err(GaugeError::invalid("safety_cap", "must be greater than 0"));
    }
    if limits.progress_every == 0 {
        return Err(GaugeError::invalid("progress_every", "must be greater than 0"));
    }
    Ok(())
}

/// Compaction pass, settle, then read resident memory
fn settled_resident_bytes(sampler: &ResourceSampler, settle: Duration) -> u64 {
    compact_heap();
    thread::sleep(settle);
    sampler.resident_bytes()
}

/// Single terminal cause, by precedence:
/// cancellation > safety cap > low heap > creation failure
#[must_use]
pub fn resolve_stop_reason(cancelled: bool, cap_reached: bool, low_heap: bool) -> StopReason {
    if cancelled {
        StopReason::Cancelled
    } else if cap_reached {
        StopReason::SafetyCap
    } else if low_heap {
        StopReason::LowHeap
    } else {
        StopReason::CreationFailure
    }
}

/// `(after − before) / threads / 1024`, 0 without threads, never negative
#[must_use]
pub fn memory_per_thread_kb(before: u64, after: u64, threads: u32) -> i64 {
    if threads == 0 {
        return 0;
    }
    let delta = i64::try_from(after).unwrap_or(i64::MAX)
        - i64::try_from(before).unwrap_or(i64::MAX);
    (delta / i64::from(threads) / 1024).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stack_policy::StackQuirk;
    use threadgauge_common::ProbeLimits;

    fn small_config(stack_size_kb: u32, safety_cap: u32) -> ProbeConfig {
        ProbeConfig {
            stack_size_kb,
            limits: ProbeLimits {
                batch_size: 25,
                safety_cap,
                min_free_heap_mb: 0,
                progress_every: 50,
                batch_pause: Duration::from_millis(1),
                join_timeout: Duration::from_millis(200),
                cleanup_budget: Duration::from_secs(5),
                settle_delay: Duration::from_millis(5),
            },
        }
    }

    #[test]
    fn test_stop_reason_precedence() {
        assert_eq!(resolve_stop_reason(true, true, true), StopReason::Cancelled);
        assert_eq!(resolve_stop_reason(false, true, true), StopReason::SafetyCap);
        assert_eq!(resolve_stop_reason(false, false, true), StopReason::LowHeap);
        assert_eq!(resolve_stop_reason(false, false, false), StopReason::CreationFailure);
    }

    #[test]
    fn test_memory_per_thread() {
        assert_eq!(memory_per_thread_kb(0, 10 * MB, 0), 0);
        assert_eq!(memory_per_thread_kb(MB, 11 * MB, 160), 64);
        // Shrinking resident memory is clamped
        assert_eq!(memory_per_thread_kb(10 * MB, MB, 10), 0);
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = small_config(0, 10);
        config.limits.batch_size = 0;
        let err = ThreadCapacityProbe::new(config).unwrap_err();
        assert!(err.is_config());

        let mut config = small_config(0, 10);
        config.limits.safety_cap = 0;
        assert!(ThreadCapacityProbe::new(config).is_err());
    }

    #[test]
    fn test_safety_cap_stops_run() {
        let probe = ThreadCapacityProbe::new(small_config(256, 120)).unwrap();
        let mut lines = Vec::new();
        let result = probe.run(&CancelToken::new(), |m| lines.push(m));

        assert_eq!(result.stop_reason, StopReason::SafetyCap);
        assert_eq!(result.max_threads, 120);
        assert_eq!(result.stack_size_kb, 256);
        assert_eq!(result.threads_reaped, 120);
        assert_eq!(result.threads_abandoned, 0);
        assert!(result.memory_per_thread_kb >= 0);
        assert!(lines.iter().any(|l| l.contains("Created 100 threads")));
        assert!(lines.first().unwrap().starts_with("Starting max thread test"));
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_low_heap_threshold() {
        let mut config = small_config(0, 1000);
        config.limits.min_free_heap_mb = u64::MAX / MB;
        let probe = ThreadCapacityProbe::new(config).unwrap();
        let result = probe.run(&CancelToken::new(), |_| {});

        assert_eq!(result.stop_reason, StopReason::LowHeap);
        assert_eq!(result.max_threads, 0);
        assert_eq!(result.memory_per_thread_kb, 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let probe = ThreadCapacityProbe::new(small_config(0, 1000)).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = probe.run(&cancel, |_| {});
        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.max_threads, 0);
    }

    #[test]
    fn test_stack_override_is_a_note() {
        let policy = StackSizePolicy::with_quirks(vec![StackQuirk {
            platform: Platform::Other,
            requested_kb: 384,
        }]);
        let probe = ThreadCapacityProbe::new(small_config(384, 30))
            .unwrap()
            .with_policy(policy)
            .with_platform(Platform::Other);
        let result = probe.run(&CancelToken::new(), |_| {});

        assert_eq!(result.stop_reason, StopReason::SafetyCap);
        assert!(result.stack_size_overridden());
        assert_eq!(result.stack_size_kb, 384);
        assert!(result.note().unwrap().contains("384 KB"));
    }
}

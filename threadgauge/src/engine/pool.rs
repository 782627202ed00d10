//! Run-scoped thread pool
//!
//! Every probe or load run owns exactly one [`ThreadPool`]. All of its threads
//! share one [`StopSignal`]; [`ThreadPool::shutdown`] raises it and reaps the
//! threads within a total time budget. A pool dropped without an explicit
//! shutdown (early return, panic in the caller) still raises the signal, so no
//! thread keeps running past the invocation that created it.

use log::{debug, warn};
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::thread_handle::{JoinOutcome, StopSignal, ThreadHandle, ThreadSpec};
use crate::domain::StackSizeKb;

/// Outcome of reaping a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub joined: u32,
    /// Joined threads whose body unwound
    pub panicked: u32,
    /// Threads still alive when the budget ran out (detached)
    pub abandoned: u32,
    pub elapsed: Duration,
}

impl CleanupReport {
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.abandoned > 0
    }
}

/// Owned, ordered collection of live threads for one run
#[derive(Debug)]
pub struct ThreadPool {
    prefix: String,
    stop: StopSignal,
    handles: Vec<ThreadHandle>,
    spawned: u64,
}

impl ThreadPool {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_capacity(prefix, 0)
    }

    #[must_use]
    pub fn with_capacity(prefix: impl Into<String>, capacity: usize) -> Self {
        Self {
            prefix: prefix.into(),
            stop: StopSignal::new(),
            handles: Vec::with_capacity(capacity),
            spawned: 0,
        }
    }

    /// Start one more thread named `<prefix>-<n>`.
    ///
    /// A panic inside the spawn path is folded into an `io::Error` so callers
    /// only ever deal with one failure type.
    ///
    /// # Errors
    /// Returns the OS error (or the converted panic) when the thread cannot be created
    pub fn spawn<F>(&mut self, stack_size: StackSizeKb, body: F) -> io::Result<()>
    where
        F: FnOnce(&StopSignal) + Send + 'static,
    {
        let spec = ThreadSpec::new(format!("{}-{}", self.prefix, self.spawned), stack_size);
        let stop = self.stop.clone();

        let handle = catch_unwind(AssertUnwindSafe(|| ThreadHandle::spawn(spec, stop, body)))
            .unwrap_or_else(|_| Err(io::Error::other("thread spawn panicked")))?;

        self.spawned += 1;
        self.handles.push(handle);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[must_use]
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Signal every thread, then join each with `join_timeout`, never spending
    /// more than `budget` in total. Threads still alive afterwards are detached.
    pub fn shutdown(&mut self, join_timeout: Duration, budget: Duration) -> CleanupReport {
        let started = Instant::now();
        self.signal_all();

        let mut report = CleanupReport::default();
        for mut handle in self.handles.drain(..) {
            let remaining = budget.saturating_sub(started.elapsed());
            let outcome = if remaining.is_zero() {
                // Out of budget: only collect threads that already exited
                if handle.is_finished() {
                    handle.join_timeout(Duration::ZERO)
                } else {
                    JoinOutcome::TimedOut
                }
            } else {
                handle.join_timeout(join_timeout.min(remaining))
            };

            match outcome {
                JoinOutcome::Joined => report.joined += 1,
                JoinOutcome::Panicked => {
                    report.joined += 1;
                    report.panicked += 1;
                }
                JoinOutcome::TimedOut => {
                    debug!("abandoning unresponsive thread {}", handle.name());
                    report.abandoned += 1;
                }
            }
        }
        report.elapsed = started.elapsed();

        if report.budget_exhausted() {
            warn!(
                "{} cleanup: {} threads joined, {} abandoned after {:.2}s",
                self.prefix,
                report.joined,
                report.abandoned,
                report.elapsed.as_secs_f64()
            );
        } else {
            debug!(
                "{} cleanup: {} threads joined in {:.2}s",
                self.prefix,
                report.joined,
                report.elapsed.as_secs_f64()
            );
        }
        report
    }

    fn signal_all(&self) {
        self.stop.raise();
        for handle in &self.handles {
            handle.unpark();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.signal_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::thread_handle::idle_until_stopped;
    use std::thread;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn test_spawn_and_shutdown() {
        let mut pool = ThreadPool::new("pool-test");
        for _ in 0..8 {
            pool.spawn(StackSizeKb(256), |s| idle_until_stopped(s, TICK)).unwrap();
        }
        assert_eq!(pool.len(), 8);

        let report = pool.shutdown(Duration::from_millis(200), Duration::from_secs(5));
        assert_eq!(report.joined, 8);
        assert_eq!(report.abandoned, 0);
        assert!(pool.is_empty());
        assert!(pool.stop_signal().is_raised());
    }

    #[test]
    fn test_budget_bounds_cleanup() {
        let mut pool = ThreadPool::new("pool-stuck");
        // Ignores the stop signal for a while
        for _ in 0..3 {
            pool.spawn(StackSizeKb::PLATFORM_DEFAULT, |_| thread::sleep(Duration::from_millis(800)))
                .unwrap();
        }

        let start = Instant::now();
        let report = pool.shutdown(Duration::from_millis(50), Duration::from_millis(120));
        assert!(start.elapsed() < Duration::from_millis(600));
        assert_eq!(report.abandoned, 3);
        assert!(report.budget_exhausted());
    }

    #[test]
    fn test_drop_signals_threads() {
        let stop = {
            let mut pool = ThreadPool::new("pool-drop");
            pool.spawn(StackSizeKb::PLATFORM_DEFAULT, |s| idle_until_stopped(s, TICK)).unwrap();
            pool.stop_signal().clone()
        };
        assert!(stop.is_raised());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_thread_names_use_prefix() {
        let mut pool = ThreadPool::new("tg-names");
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);
        pool.spawn(StackSizeKb::PLATFORM_DEFAULT, move |s| {
            // The OS-level name is applied before the body runs
            let _ = started_tx.send(());
            idle_until_stopped(s, TICK);
        })
        .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).expect("thread never started");

        let pid = std::process::id();
        let names: Vec<String> = std::fs::read_dir(format!("/proc/{pid}/task"))
            .unwrap()
            .filter_map(|e| {
                let tid = e.ok()?.file_name().to_string_lossy().to_string();
                std::fs::read_to_string(format!("/proc/{pid}/task/{tid}/comm")).ok()
            })
            .map(|c| c.trim().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "tg-names-0"));
        assert!(crate::sampling::procfs::read_self_status().unwrap().threads >= 2);

        pool.shutdown(Duration::from_millis(200), Duration::from_secs(2));
    }
}

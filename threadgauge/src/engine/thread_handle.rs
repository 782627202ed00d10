//! Thread handle with an explicit stop signal and bounded join
//!
//! `std::thread::JoinHandle::join` blocks without a limit, and a worker under
//! memory pressure may never be scheduled again. Each handle therefore carries
//! a completion channel: the worker holds the sender, so the channel
//! disconnects the moment the thread body returns or unwinds, and
//! [`ThreadHandle::join_timeout`] can wait on it with a deadline.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::domain::StackSizeKb;

/// Cooperative stop flag checked by worker bodies at fixed intervals
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How a new thread should be created
#[derive(Debug, Clone)]
pub struct ThreadSpec {
    pub name: String,
    pub stack_size: StackSizeKb,
}

impl ThreadSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, stack_size: StackSizeKb) -> Self {
        Self { name: name.into(), stack_size }
    }
}

/// Result of a bounded join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// The thread finished by unwinding
    Panicked,
    /// Still running when the timeout expired
    TimedOut,
}

/// A started OS thread that can be asked to stop and joined with a timeout
#[derive(Debug)]
pub struct ThreadHandle {
    name: String,
    handle: Option<JoinHandle<()>>,
    done: Receiver<()>,
    stop: StopSignal,
}

impl ThreadHandle {
    /// Start a thread running `body` with the given stop signal.
    ///
    /// # Errors
    /// Returns the OS error when the thread cannot be created (`EAGAIN` once
    /// the thread or memory limit is hit).
    pub fn spawn<F>(spec: ThreadSpec, stop: StopSignal, body: F) -> io::Result<Self>
    where
        F: FnOnce(&StopSignal) + Send + 'static,
    {
        let (done_tx, done_rx) = bounded::<()>(0);

        let mut builder = thread::Builder::new().name(spec.name.clone());
        if let Some(bytes) = spec.stack_size.bytes() {
            builder = builder.stack_size(bytes);
        }

        let signal = stop.clone();
        let handle = builder.spawn(move || {
            // Dropped on return or unwind, which disconnects `done`
            let _done = done_tx;
            body(&signal);
        })?;

        Ok(Self { name: spec.name, handle: Some(handle), done: done_rx, stop })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raise the stop signal and wake the thread if it is parked
    pub fn request_stop(&self) {
        self.stop.raise();
        self.unpark();
    }

    pub fn unpark(&self) {
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait up to `timeout` for the thread to exit.
    ///
    /// On [`JoinOutcome::TimedOut`] the handle stays usable and can be joined
    /// again later; dropping it detaches the thread.
    pub fn join_timeout(&mut self, timeout: Duration) -> JoinOutcome {
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => JoinOutcome::TimedOut,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => self.reap(),
        }
    }

    fn reap(&mut self) -> JoinOutcome {
        match self.handle.take().map(JoinHandle::join) {
            Some(Err(_)) => JoinOutcome::Panicked,
            Some(Ok(())) | None => JoinOutcome::Joined,
        }
    }
}

/// Body of an idle probe thread: park in short increments until stopped
pub fn idle_until_stopped(stop: &StopSignal, tick: Duration) {
    while !stop.is_raised() {
        thread::park_timeout(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_spawn_and_stop() {
        let stop = StopSignal::new();
        let mut handle = ThreadHandle::spawn(
            ThreadSpec::new("test-idle", StackSizeKb::PLATFORM_DEFAULT),
            stop,
            |s| idle_until_stopped(s, Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(handle.name(), "test-idle");

        // The long park tick is cut short by unpark
        let start = Instant::now();
        handle.request_stop();
        assert_eq!(handle.join_timeout(Duration::from_secs(2)), JoinOutcome::Joined);
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(handle.is_finished());
    }

    #[test]
    fn test_join_timeout_expires_for_running_thread() {
        let stop = StopSignal::new();
        let mut handle = ThreadHandle::spawn(
            ThreadSpec::new("test-slow", StackSizeKb(256)),
            stop.clone(),
            |s| idle_until_stopped(s, Duration::from_millis(10)),
        )
        .unwrap();

        assert_eq!(handle.join_timeout(Duration::from_millis(30)), JoinOutcome::TimedOut);

        stop.raise();
        assert_eq!(handle.join_timeout(Duration::from_secs(2)), JoinOutcome::Joined);
    }

    #[test]
    fn test_panicking_body_is_reported() {
        let mut handle = ThreadHandle::spawn(
            ThreadSpec::new("test-panic", StackSizeKb::PLATFORM_DEFAULT),
            StopSignal::new(),
            |_| panic!("boom"),
        )
        .unwrap();
        assert_eq!(handle.join_timeout(Duration::from_secs(2)), JoinOutcome::Panicked);
    }

    #[test]
    fn test_thread_name_is_applied() {
        let (tx, rx) = bounded(1);
        let mut handle = ThreadHandle::spawn(
            ThreadSpec::new("named-worker", StackSizeKb::PLATFORM_DEFAULT),
            StopSignal::new(),
            move |_| {
                let _ = tx.send(thread::current().name().map(str::to_string));
            },
        )
        .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("named-worker"));
        assert_eq!(handle.join_timeout(Duration::from_secs(2)), JoinOutcome::Joined);
    }
}

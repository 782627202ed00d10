//! Background execution of a probe or load run
//!
//! A [`Task`] runs one component on a dedicated thread and hands the invoking
//! context a cancellation token plus a single ordered event channel. The
//! invoking context never blocks on the run: it polls [`Task::try_event`] (TUI)
//! or waits with [`Task::wait`] (headless CLI, tests).

use crossbeam_channel::{unbounded, Receiver};
use log::debug;
use std::thread::{self, JoinHandle};

use threadgauge_common::{LoadResult, ProbeResult};

use super::cancel::CancelToken;
use super::load::LoadGenerator;
use super::probe::ThreadCapacityProbe;
use super::progress::{channel_sink, RunEvent};
use crate::domain::{GaugeError, GaugeResult, RunKind};

/// Handle to a run executing in the background.
///
/// Dropping the handle cancels the run; its threads are still reaped by the
/// background thread.
#[derive(Debug)]
pub struct Task<T> {
    kind: RunKind,
    token: CancelToken,
    events: Receiver<RunEvent<T>>,
    handle: Option<JoinHandle<()>>,
}

impl Task<ProbeResult> {
    /// Start `probe` on a background thread.
    ///
    /// # Errors
    /// Returns an error if the background thread itself cannot be created
    pub fn spawn_probe(probe: ThreadCapacityProbe) -> GaugeResult<Self> {
        Self::spawn(RunKind::Probe, "probe-runner", move |cancel, on_progress| {
            probe.run(cancel, on_progress)
        })
    }
}

impl Task<LoadResult> {
    /// Start `generator` on a background thread.
    ///
    /// # Errors
    /// Returns an error if the background thread itself cannot be created
    pub fn spawn_load(generator: LoadGenerator) -> GaugeResult<Self> {
        Self::spawn(RunKind::Stress, "stress-runner", move |cancel, on_progress| {
            generator.run(cancel, on_progress)
        })
    }
}

impl<T: Send + 'static> Task<T> {
    fn spawn<F>(kind: RunKind, name: &str, job: F) -> GaugeResult<Self>
    where
        F: FnOnce(&CancelToken, &mut dyn FnMut(String)) -> T + Send + 'static,
    {
        let token = CancelToken::new();
        let (tx, rx) = unbounded();

        let worker_token = token.clone();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let mut on_progress = channel_sink(tx.clone());
            let result = job(&worker_token, &mut on_progress);
            // Sent last: every progress line is already queued ahead of it
            let _ = tx.send(RunEvent::Finished(result));
        })?;

        debug!("started background {kind}");
        Ok(Self { kind, token, events: rx, handle: Some(handle) })
    }
}

impl<T> Task<T> {
    #[must_use]
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Ordered progress/result stream
    #[must_use]
    pub fn events(&self) -> &Receiver<RunEvent<T>> {
        &self.events
    }

    /// Next pending event without blocking
    #[must_use]
    pub fn try_event(&self) -> Option<RunEvent<T>> {
        self.events.try_recv().ok()
    }

    /// Whether the background thread has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the result arrives, passing progress lines to `on_progress`.
    ///
    /// # Errors
    /// Returns [`GaugeError::RunAborted`] if the background thread died
    /// without producing a result
    pub fn wait(mut self, mut on_progress: impl FnMut(String)) -> GaugeResult<T> {
        let outcome = loop {
            match self.events.recv() {
                Ok(RunEvent::Progress(line)) => on_progress(line),
                Ok(RunEvent::Finished(result)) => break Ok(result),
                Err(_) => break Err(GaugeError::RunAborted(self.kind.to_string())),
            }
        };
        if let Some(handle) = self.handle.take() {
            // The runner exits right after sending the result
            let _ = handle.join();
        }
        outcome
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        if self.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            self.token.cancel();
        }
    }
}

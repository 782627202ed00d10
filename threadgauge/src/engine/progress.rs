//! Progress reporting
//!
//! Components report human-readable progress through a plain `FnMut(String)`
//! callback. Messages carry no timestamp; the consumer stamps them on arrival.
//! [`RunEvent`] is the envelope used when a run executes as a background task:
//! progress and the final result travel on the same channel, so the result is
//! always the last thing a consumer sees.

use crossbeam_channel::Sender;
use log::debug;

/// Message from a background run to its consumer
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent<T> {
    /// Human-readable progress line
    Progress(String),
    /// Terminal result, sent after every progress line and after cleanup
    Finished(T),
}

/// Wraps the caller's callback and mirrors every line to the debug log
pub(crate) struct Progress<F: FnMut(String)> {
    sink: F,
}

impl<F: FnMut(String)> Progress<F> {
    pub(crate) fn new(sink: F) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("progress: {message}");
        (self.sink)(message);
    }
}

/// Callback that forwards progress lines into a task channel.
///
/// A disconnected consumer is not an error: the run keeps going and finishes
/// its cleanup.
pub(crate) fn channel_sink<T>(tx: Sender<RunEvent<T>>) -> impl FnMut(String) {
    move |message| {
        let _ = tx.send(RunEvent::Progress(message));
    }
}

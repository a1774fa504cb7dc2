use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Coalesces bursts of input into a single delivery.
///
/// Each [`push`](Debouncer::push) cancels the pending delivery and schedules a
/// new one after `wait` of quiet; only the last value of a burst is sent.
/// Must be used from inside a Tokio runtime.
pub struct Debouncer<T> {
    wait: Duration,
    output: UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(wait: Duration, output: UnboundedSender<T>) -> Self {
        Self {
            wait,
            output,
            pending: None,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Schedule `value`, replacing anything still waiting.
    pub fn push(&mut self, value: T) {
        self.cancel();
        let wait = self.wait;
        let output = self.output.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            // Receiver gone means nobody is listening any more.
            let _ = output.send(value);
        }));
    }

    /// Drop the pending delivery, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

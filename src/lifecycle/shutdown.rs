//! Cancellation signal for retry loops.
//!
//! Callers pass a receiver from `subscribe` to `execute_until_shutdown`, which
//! races every attempt and backoff wait against it. Either outcome of `recv()`
//! ends the loop with `RetryError::Cancelled`:
//! - `Ok(())` after `trigger`
//! - `Err(Closed)` once the `Shutdown` value is dropped, so an abandoned
//!   coordinator never leaves a loop retrying forever

use tokio::sync::broadcast;

/// One-shot cancellation broadcast shared by all in-flight retry loops.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        // A single slot is enough: the first signal is terminal.
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for one retry loop. Subscribe before the loop starts; a
    /// receiver created after `trigger` does not see the signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Cancel every loop currently subscribed. Returns how many were reached.
    pub fn trigger(&self) -> usize {
        let reached = self.tx.send(()).unwrap_or(0);
        tracing::info!(loops = reached, "Cancelling retry loops");
        reached
    }

    /// Number of retry loops still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

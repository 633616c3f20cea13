//! Shutdown coordination for the stub server.
//!
//! The signal handler holds one clone and triggers it; `StubServer::run`
//! holds a receiver and stops accepting connections when it fires. Requests
//! already in flight, including ones parked in `X-Stub-Delay`, run to
//! completion.

use tokio::sync::broadcast;

/// One-shot stop signal shared between the signal handler and the server.
///
/// Clones share the same channel, so any clone can trigger every receiver.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Harmless when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Receivers not yet dropped; zero once the server has stopped.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

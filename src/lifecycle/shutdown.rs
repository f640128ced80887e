//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// Broadcast handle used to stop the serving loop.
///
/// The server subscribes before it starts accepting connections;
/// `trigger` tells it to stop. Production wiring also stops on Ctrl+C,
/// tests call `trigger` for deterministic teardown.
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

    /// Tell every subscribed task to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

//! Player event bus.
//!
//! One-to-many broadcast of [`PlayerEvent`]s; the application layer
//! subscribes and receives every event emitted after subscription.

use tokio::sync::broadcast;
use tonearm_core::PlayerEvent;

/// Broadcast bus for player events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Events emitted with no subscribers are dropped.
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

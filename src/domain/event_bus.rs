//! Broadcast channel for ticket events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Services publish
//! a [`TicketEvent`] after each committed mutation and every WebSocket
//! connection subscribes to receive the ones for the events it watches.

use tokio::sync::broadcast;

use super::TicketEvent;

/// Broadcast bus for [`TicketEvent`]s.
///
/// When the ring buffer is full the oldest events are dropped for lagging
/// receivers; publishing never blocks a request.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TicketEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that got the event; zero when
    /// nobody is listening.
    pub fn publish(&self, event: TicketEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

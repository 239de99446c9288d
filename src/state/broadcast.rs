//! Per-game broadcast hub assigning strictly increasing sequence numbers.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub for one game's event stream.
///
/// Sequence numbers are assigned here, by the publisher, so ordering does not
/// depend on any transport guarantee: consecutive committed mutations of one
/// game always carry consecutive numbers and subscribers detect gaps.
pub struct GameHub {
    sequence: AtomicU64,
    sender: broadcast::Sender<ServerEvent>,
}

impl GameHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sequence: AtomicU64::new(0),
            sender,
        }
    }

    /// Sequence number of the most recently published event (0 before any).
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Reserve the next sequence number.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    ///
    /// A send error only means no subscriber is connected; committed state
    /// must never depend on delivery.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_strictly_increasing() {
        let hub = GameHub::new(8);
        assert_eq!(hub.current_sequence(), 0);
        assert_eq!(hub.next_sequence(), 1);
        assert_eq!(hub.next_sequence(), 2);
        assert_eq!(hub.current_sequence(), 2);
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = GameHub::new(8);
        let mut receiver = hub.subscribe();

        hub.publish(ServerEvent {
            event: Some("game.clock_updated".into()),
            data: "{}".into(),
        });

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("game.clock_updated"));
    }
}

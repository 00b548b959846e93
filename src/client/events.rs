//! Broadcast channel for transcript changes.
//!
//! [`TranscriptEvents`] wraps a [`tokio::sync::broadcast`] channel. Every
//! transcript mutation publishes a [`TranscriptEvent`] so a UI layer can
//! redraw without polling.

use tokio::sync::broadcast;

use super::message::ChatMessage;

/// A change to the visible transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// A room's persisted transcript was loaded after joining.
    Loaded {
        /// Room entered.
        room: String,
        /// Number of restored messages.
        count: usize,
    },
    /// A message was appended (own or peer).
    Appended(ChatMessage),
    /// The transcript was emptied (join in progress or leave).
    Cleared,
}

/// Broadcast bus for [`TranscriptEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct TranscriptEvents {
    sender: broadcast::Sender<TranscriptEvent>,
}

impl TranscriptEvents {
    /// Creates a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    pub fn publish(&self, event: TranscriptEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.sender.subscribe()
    }
}

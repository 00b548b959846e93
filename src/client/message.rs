//! Chat messages as held in a client transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::RelayFrame;

/// Who wrote a message, from the local client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Composed by this client.
    Mine,
    /// Relayed from another member of the room.
    Peer,
}

/// Local delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Handed to the relay; no acknowledgement exists.
    Sent,
    /// Received from the relay.
    Received,
}

/// One entry of a room transcript.
///
/// Identity is the `id` alone: two messages with the same `id` are the
/// same logical message whatever their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Globally unique, client-generated identifier.
    pub id: String,
    /// Message body.
    pub text: String,
    /// Composition time for own messages, receipt time for peer messages.
    pub timestamp: DateTime<Utc>,
    /// Author relative to this client.
    pub origin: Origin,
    /// Local delivery status.
    pub status: DeliveryStatus,
}

impl ChatMessage {
    /// Creates an own message with a fresh UUID v4 identifier.
    #[must_use]
    pub fn outgoing(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            timestamp: Utc::now(),
            origin: Origin::Mine,
            status: DeliveryStatus::Sent,
        }
    }

    /// Creates a peer message stamped with the local receipt time.
    #[must_use]
    pub fn received(frame: RelayFrame) -> Self {
        Self {
            id: frame.id,
            text: frame.text,
            timestamp: Utc::now(),
            origin: Origin::Peer,
            status: DeliveryStatus::Received,
        }
    }

    /// Returns `true` if this client composed the message.
    #[must_use]
    pub fn is_mine(&self) -> bool {
        self.origin == Origin::Mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_ids_are_unique() {
        let a = ChatMessage::outgoing("hi");
        let b = ChatMessage::outgoing("hi");
        assert_ne!(a.id, b.id);
        assert!(a.is_mine());
        assert_eq!(a.status, DeliveryStatus::Sent);
    }

    #[test]
    fn received_keeps_sender_id() {
        let msg = ChatMessage::received(RelayFrame {
            text: "yo".to_string(),
            id: "m1".to_string(),
        });
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.text, "yo");
        assert_eq!(msg.origin, Origin::Peer);
        assert_eq!(msg.status, DeliveryStatus::Received);
    }
}

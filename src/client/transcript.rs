//! Ordered, de-duplicating message list for one room.

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Insertion-ordered sequence of messages.
///
/// Serializes as a plain JSON array, which is also the persisted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` unconditionally.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends `message` unless one with the same `id` is already present
    /// anywhere in the transcript.
    ///
    /// Returns `true` if the message was appended.
    pub fn merge(&mut self, message: ChatMessage) -> bool {
        if self.contains(&message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Returns `true` if a message with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Returns the messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the transcript holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<ChatMessage>> for Transcript {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::client::message::Origin;
    use crate::protocol::RelayFrame;

    fn peer(id: &str, text: &str) -> ChatMessage {
        ChatMessage::received(RelayFrame {
            text: text.to_string(),
            id: id.to_string(),
        })
    }

    #[test]
    fn duplicate_id_keeps_first_text() {
        let mut transcript = Transcript::new();
        assert!(transcript.merge(peer("m1", "first")));
        assert!(!transcript.merge(peer("m1", "second")));

        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript.messages().first().map(|m| m.text.as_str()),
            Some("first")
        );
    }

    #[test]
    fn dedup_checks_whole_transcript() {
        let mut transcript = Transcript::new();
        assert!(transcript.merge(peer("m1", "a")));
        assert!(transcript.merge(peer("m2", "b")));
        assert!(transcript.merge(peer("m3", "c")));
        assert!(!transcript.merge(peer("m1", "again")));
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn own_message_blocks_echo_with_same_id() {
        let mut transcript = Transcript::new();
        let own = ChatMessage::outgoing("hi");
        let id = own.id.clone();
        transcript.push(own);

        assert!(!transcript.merge(peer(&id, "hi")));
        assert!(transcript.messages().iter().all(|m| m.origin == Origin::Mine));
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::outgoing("one"));
        transcript.merge(peer("p1", "two"));
        transcript.push(ChatMessage::outgoing("three"));

        let Ok(json) = serde_json::to_string(&transcript) else {
            panic!("serialization failed");
        };
        assert!(json.starts_with('['));
        let Ok(restored) = serde_json::from_str::<Transcript>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(restored, transcript);
    }

    #[test]
    fn clear_empties() {
        let mut transcript = Transcript::from(vec![peer("m1", "a")]);
        assert!(!transcript.is_empty());
        transcript.clear();
        assert!(transcript.is_empty());
    }
}

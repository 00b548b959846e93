//! Transport-independent client session logic.
//!
//! [`SessionState`] owns the room membership, the visible transcript and
//! its persistence. Every mutation is written back to the store under the
//! room's key before the method returns.

use super::events::{TranscriptEvent, TranscriptEvents};
use super::message::ChatMessage;
use super::store::{KeyValueStore, transcript_key};
use super::transcript::Transcript;
use crate::error::RelayError;
use crate::protocol::{ClientFrame, RelayFrame};

/// Room, transcript and store of one client.
#[derive(Debug)]
pub struct SessionState<S> {
    store: S,
    room: Option<String>,
    transcript: Transcript,
    events: TranscriptEvents,
}

impl<S: KeyValueStore> SessionState<S> {
    /// Creates an unjoined session persisting into `store`.
    #[must_use]
    pub fn new(store: S, events: TranscriptEvents) -> Self {
        Self {
            store,
            room: None,
            transcript: Transcript::new(),
            events,
        }
    }

    /// Returns the joined room, if any.
    #[must_use]
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Returns the visible transcript.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Starts a join: forgets the current room and empties the in-memory
    /// transcript. The previous room's persisted transcript is kept.
    pub fn begin_join(&mut self) {
        self.room = None;
        self.transcript.clear();
        self.events.publish(TranscriptEvent::Cleared);
    }

    /// Completes a join: marks `room` as joined and restores its persisted
    /// transcript.
    ///
    /// A persisted value that does not parse is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Store`] if the store cannot be read or written.
    pub fn enter_room(&mut self, room: &str) -> Result<(), RelayError> {
        let key = transcript_key(room);
        self.transcript = match self.store.get(&key)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(%room, error = %err, "discarding unreadable transcript");
                Transcript::new()
            }),
            None => Transcript::new(),
        };
        self.room = Some(room.to_string());
        self.persist()?;

        self.events.publish(TranscriptEvent::Loaded {
            room: room.to_string(),
            count: self.transcript.len(),
        });
        Ok(())
    }

    /// Records a locally composed message and returns the frame to send.
    ///
    /// Blank input (after trimming) is ignored and yields `Ok(None)`. The
    /// message text itself is kept untrimmed.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotJoined`] outside a room, or
    /// [`RelayError::Store`] if persisting fails (the message stays in the
    /// in-memory transcript).
    pub fn compose(&mut self, text: &str) -> Result<Option<(ChatMessage, ClientFrame)>, RelayError> {
        if self.room.is_none() {
            return Err(RelayError::NotJoined);
        }
        if text.trim().is_empty() {
            return Ok(None);
        }

        let message = ChatMessage::outgoing(text);
        let frame = ClientFrame::Chat {
            message: message.text.clone(),
            id: message.id.clone(),
        };
        self.transcript.push(message.clone());
        self.events.publish(TranscriptEvent::Appended(message.clone()));
        self.persist()?;

        Ok(Some((message, frame)))
    }

    /// Merges a relayed frame into the transcript.
    ///
    /// Returns `Ok(true)` if the message was new. Frames arriving while no
    /// room is joined and frames whose `id` is already present are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Store`] if persisting fails.
    pub fn receive(&mut self, frame: RelayFrame) -> Result<bool, RelayError> {
        if self.room.is_none() {
            return Ok(false);
        }

        let message = ChatMessage::received(frame);
        if !self.transcript.merge(message.clone()) {
            tracing::debug!(id = %message.id, "ignoring duplicate message");
            return Ok(false);
        }
        self.events.publish(TranscriptEvent::Appended(message));
        self.persist()?;
        Ok(true)
    }

    /// Leaves the room: clears the transcript and deletes its persisted copy.
    ///
    /// No-op if no room is joined.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Store`] if the persisted entry cannot be removed.
    pub fn leave(&mut self) -> Result<(), RelayError> {
        let Some(room) = self.room.take() else {
            return Ok(());
        };
        self.transcript.clear();
        self.events.publish(TranscriptEvent::Cleared);
        self.store.remove(&transcript_key(&room))
    }

    fn persist(&self) -> Result<(), RelayError> {
        let Some(room) = self.room.as_deref() else {
            return Ok(());
        };
        let json = serde_json::to_string(&self.transcript)?;
        self.store.set(&transcript_key(room), &json)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::client::message::Origin;
    use crate::client::store::{FileStore, MemoryStore};
    use tokio_test::assert_ok;

    fn make_state() -> SessionState<MemoryStore> {
        SessionState::new(MemoryStore::new(), TranscriptEvents::new(16))
    }

    fn relay(id: &str, text: &str) -> RelayFrame {
        RelayFrame {
            text: text.to_string(),
            id: id.to_string(),
        }
    }

    fn joined(room: &str) -> SessionState<MemoryStore> {
        let mut state = make_state();
        state.begin_join();
        assert_ok!(state.enter_room(room));
        state
    }

    #[test]
    fn compose_echoes_locally_and_builds_chat_frame() {
        let mut state = joined("alpha");

        let Ok(Some((message, frame))) = state.compose("hi") else {
            panic!("compose should produce a frame");
        };
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(message.origin, Origin::Mine);
        assert_eq!(
            frame,
            ClientFrame::Chat {
                message: "hi".to_string(),
                id: message.id.clone(),
            }
        );
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut state = joined("alpha");
        assert!(matches!(state.compose("   \n"), Ok(None)));
        assert!(state.transcript().is_empty());
    }

    #[test]
    fn compose_requires_room() {
        let mut state = make_state();
        assert!(matches!(state.compose("hi"), Err(RelayError::NotJoined)));
    }

    #[test]
    fn duplicate_relay_frames_yield_one_entry() {
        let mut state = joined("alpha");
        assert!(matches!(state.receive(relay("m1", "first")), Ok(true)));
        assert!(matches!(state.receive(relay("m1", "second")), Ok(false)));

        let texts: Vec<&str> = state
            .transcript()
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, ["first"]);
    }

    #[test]
    fn receive_outside_room_is_ignored() {
        let mut state = make_state();
        assert!(matches!(state.receive(relay("m1", "x")), Ok(false)));
        assert!(state.transcript().is_empty());
    }

    #[test]
    fn transcript_survives_rejoin() {
        let mut state = joined("alpha");
        assert_ok!(state.compose("one"));
        assert_ok!(state.receive(relay("p1", "two")));
        let before = state.transcript().clone();

        state.begin_join();
        assert!(state.transcript().is_empty());
        assert_ok!(state.enter_room("alpha"));
        assert_eq!(state.transcript(), &before);
    }

    #[test]
    fn transcript_reloads_from_disk_in_a_fresh_session() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir should be creatable");
        };
        let Ok(store) = FileStore::open(dir.path()) else {
            panic!("store should open");
        };
        let mut first = SessionState::new(store, TranscriptEvents::new(8));
        first.begin_join();
        assert_ok!(first.enter_room("alpha"));
        assert_ok!(first.compose("one"));
        assert_ok!(first.receive(relay("p1", "two")));
        let before = first.transcript().clone();
        drop(first);

        let Ok(store) = FileStore::open(dir.path()) else {
            panic!("store should reopen");
        };
        let mut second = SessionState::new(store, TranscriptEvents::new(8));
        second.begin_join();
        assert_ok!(second.enter_room("alpha"));
        assert_eq!(second.transcript().len(), 2);
        assert_eq!(second.transcript(), &before);
    }

    #[test]
    fn rooms_do_not_bleed_into_each_other() {
        let mut state = joined("alpha");
        assert_ok!(state.compose("alpha only"));

        state.begin_join();
        assert_ok!(state.enter_room("beta"));
        assert!(state.transcript().is_empty());
        assert_eq!(state.room(), Some("beta"));
    }

    #[test]
    fn leave_clears_and_forgets_persisted_copy() {
        let mut state = joined("alpha");
        assert_ok!(state.compose("hi"));
        assert!(matches!(state.store().get("chatMessages_alpha"), Ok(Some(_))));

        assert_ok!(state.leave());
        assert!(state.room().is_none());
        assert!(state.transcript().is_empty());
        assert!(matches!(state.store().get("chatMessages_alpha"), Ok(None)));
    }

    #[test]
    fn unreadable_persisted_transcript_starts_empty() {
        let store = MemoryStore::new();
        assert_ok!(store.set("chatMessages_alpha", "{not json"));
        let mut state = SessionState::new(store, TranscriptEvents::new(4));

        assert_ok!(state.enter_room("alpha"));
        assert!(state.transcript().is_empty());
    }

    #[tokio::test]
    async fn mutations_publish_events() {
        let events = TranscriptEvents::new(16);
        let mut rx = events.subscribe();
        let mut state = SessionState::new(MemoryStore::new(), events);

        state.begin_join();
        assert_ok!(state.enter_room("alpha"));
        assert_ok!(state.receive(relay("m1", "yo")));

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen.first(), Some(TranscriptEvent::Cleared)));
        assert!(matches!(
            seen.get(1),
            Some(TranscriptEvent::Loaded { room, count: 0 }) if room == "alpha"
        ));
        assert!(matches!(
            seen.get(2),
            Some(TranscriptEvent::Appended(m)) if m.id == "m1"
        ));
    }
}

//! WebSocket-backed client session.
//!
//! [`ClientSession`] pairs a [`SessionState`] with one relay connection.
//! The socket is split into a writer task fed by an unbounded channel and
//! a reader task that merges relay frames into the shared state. Sending
//! is fire-and-forget: no acknowledgement exists and nothing is retried.
//! A dropped connection is not re-established; the caller joins again.
//!
//! Store access can block (a [`super::FileStore`] writes to disk), so every
//! state operation that persists runs on tokio's blocking pool.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::events::{TranscriptEvent, TranscriptEvents};
use super::message::ChatMessage;
use super::state::SessionState;
use super::store::KeyValueStore;
use crate::error::RelayError;
use crate::protocol::{ClientFrame, RelayFrame};

/// Live socket of a joined session.
#[derive(Debug)]
struct Link {
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
}

impl Link {
    /// Asks the writer to send a close frame and stops reading.
    fn close(self) {
        let _ = self.outbound.send(Message::Close(None));
        self.reader.abort();
    }
}

type SharedState<S> = Arc<Mutex<SessionState<S>>>;

/// Runs `op` against the shared state on the blocking pool.
async fn run_blocking<S, T, F>(state: &SharedState<S>, op: F) -> Result<T, RelayError>
where
    S: KeyValueStore + 'static,
    T: Send + 'static,
    F: FnOnce(&mut SessionState<S>) -> Result<T, RelayError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut guard)
    })
    .await?
}

/// Client side of the relay protocol.
#[derive(Debug)]
pub struct ClientSession<S> {
    state: SharedState<S>,
    events: TranscriptEvents,
    link: Option<Link>,
}

impl<S: KeyValueStore + 'static> ClientSession<S> {
    /// Creates an unjoined session persisting transcripts into `store`.
    #[must_use]
    pub fn new(store: S, event_capacity: usize) -> Self {
        let events = TranscriptEvents::new(event_capacity);
        Self {
            state: Arc::new(Mutex::new(SessionState::new(store, events.clone()))),
            events,
            link: None,
        }
    }

    /// Connects to `url` and joins `room`.
    ///
    /// Any previous connection is closed first and the visible transcript
    /// is emptied. Once the socket is open the `join` frame is sent and the
    /// room's persisted transcript is restored.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::EmptyRoomName`] for a blank room name,
    /// [`RelayError::Transport`] if the connection cannot be opened or the
    /// join frame cannot be sent (the session stays unjoined), or
    /// [`RelayError::Store`] if the transcript cannot be restored.
    pub async fn join(&mut self, url: &str, room: &str) -> Result<(), RelayError> {
        if room.trim().is_empty() {
            return Err(RelayError::EmptyRoomName);
        }

        if let Some(link) = self.link.take() {
            link.close();
        }
        run_blocking(&self.state, |state| {
            state.begin_join();
            Ok(())
        })
        .await?;

        let (stream, _) = connect_async(url).await?;
        let (mut sink, mut source) = stream.split();
        sink.send(Message::text(ClientFrame::join(room).to_json()?))
            .await?;

        let entered = room.to_owned();
        run_blocking(&self.state, move |state| state.enter_room(&entered)).await?;
        tracing::info!(%room, "joined room");

        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(msg) = queue.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(err) = sink.send(msg).await {
                    tracing::warn!(error = %err, "relay send failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let state = Arc::clone(&self.state);
        let reader = tokio::spawn(async move {
            while let Some(msg) = source.next().await {
                let raw = match msg {
                    Ok(Message::Text(text)) => text.as_str().to_owned(),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(_) => continue,
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::warn!(error = %err, "relay connection failed");
                        break;
                    }
                };
                let frame = match RelayFrame::parse(&raw) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::debug!(error = %err, "ignoring unrecognized frame");
                        continue;
                    }
                };
                if let Err(err) = run_blocking(&state, move |state| state.receive(frame)).await {
                    tracing::warn!(error = %err, "failed to persist received message");
                }
            }
            tracing::info!("relay connection closed");
        });

        self.link = Some(Link { outbound, reader });
        Ok(())
    }

    /// Sends `text` to the room.
    ///
    /// The message is appended to the transcript before anything goes on
    /// the wire. Returns the recorded message, or `None` for blank input.
    /// Transmit failures are logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotJoined`] outside a room or
    /// [`RelayError::Store`] if the transcript cannot be persisted.
    pub async fn send(&self, text: &str) -> Result<Option<ChatMessage>, RelayError> {
        let text = text.to_owned();
        let composed = run_blocking(&self.state, move |state| state.compose(&text)).await?;
        let Some((message, frame)) = composed else {
            return Ok(None);
        };

        let delivered = match &self.link {
            Some(link) => link.outbound.send(Message::text(frame.to_json()?)).is_ok(),
            None => false,
        };
        if !delivered {
            tracing::warn!(id = %message.id, "relay connection gone, message not sent");
        }
        Ok(Some(message))
    }

    /// Leaves the room: closes the socket, clears the transcript and
    /// deletes the room's persisted copy.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Store`] if the persisted copy cannot be removed.
    pub async fn leave(&mut self) -> Result<(), RelayError> {
        if let Some(link) = self.link.take() {
            link.close();
        }
        run_blocking(&self.state, SessionState::leave).await
    }

    /// Closes the socket without touching the transcript or its persisted
    /// copy.
    pub fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            link.close();
        }
    }

    /// Returns a snapshot of the visible transcript.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.lock_state().transcript().messages().to_vec()
    }

    /// Returns the joined room, if any.
    pub async fn room(&self) -> Option<String> {
        self.lock_state().room().map(str::to_owned)
    }

    /// Returns `true` while the relay connection is still being read.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|link| !link.reader.is_finished())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to transcript changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.events.subscribe()
    }
}

impl<S> Drop for ClientSession<S> {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            link.close();
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::client::store::MemoryStore;
    use tokio_test::assert_ok;

    /// Store whose writes stall the calling thread.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    impl KeyValueStore for SlowStore {
        fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), RelayError> {
            std::thread::sleep(self.delay);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), RelayError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn slow_store_writes_do_not_stall_the_runtime() {
        let store = SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_millis(200),
        };
        let state: SharedState<SlowStore> = Arc::new(Mutex::new(SessionState::new(
            store,
            TranscriptEvents::new(8),
        )));
        assert_ok!(
            run_blocking(&state, |state| {
                state.begin_join();
                state.enter_room("alpha")
            })
            .await
        );

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        let composed = run_blocking(&state, |state| state.compose("hello")).await;
        ticker.abort();

        let Ok(Some((message, _))) = composed else {
            panic!("compose should persist and return the message");
        };
        assert_eq!(message.text, "hello");
        assert!(ticks.load(Ordering::Relaxed) >= 5);
    }

    #[tokio::test]
    async fn unjoined_send_is_rejected_without_a_connection() {
        let session = ClientSession::new(MemoryStore::new(), 8);
        let result = session.send("hi").await;
        assert!(matches!(result, Err(RelayError::NotJoined)));
        assert!(!session.is_connected());
        assert_eq!(session.room().await, None);
    }
}

//! Relay dispatcher: classifies inbound frames and fans chat out.
//!
//! Per connection the dispatcher tracks two states, *unjoined* and
//! *joined(room)*, both stored in the [`ConnectionRegistry`]. A `join`
//! frame moves the connection into a room (replacing any earlier one); a
//! `chat` frame is relayed to every other member of the sender's room and
//! never echoed back to the sender.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;

use crate::domain::{ConnectionId, ConnectionRegistry, Delivery, PeerHandle};
use crate::error::RelayError;
use crate::protocol::{ClientFrame, RelayFrame};

/// What the dispatcher did with an accepted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The sender is now a member of `room`.
    Joined {
        /// Room joined.
        room: String,
        /// Room the sender left implicitly, if any.
        previous: Option<String>,
    },
    /// A chat message was fanned out.
    Relayed {
        /// Sender's room.
        room: String,
        /// Peers whose outbox accepted the frame.
        delivered: usize,
        /// Peers whose outbox was full or closed.
        dropped: usize,
    },
}

/// Routes frames from any connection against a shared registry.
#[derive(Debug, Clone)]
pub struct RelayDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl RelayDispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this dispatcher mutates.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handles one raw frame received from `sender`.
    ///
    /// # Errors
    ///
    /// Returns a frame error from [`ClientFrame::parse`], or
    /// [`RelayError::ChatBeforeJoin`] for `chat` from an unjoined
    /// connection. Callers drop the frame and keep the connection open.
    pub async fn dispatch(&self, sender: &PeerHandle, raw: &str) -> Result<Dispatch, RelayError> {
        match ClientFrame::parse(raw)? {
            ClientFrame::Join { room_id } => {
                let previous = self.registry.join(sender.clone(), room_id.clone()).await;
                Ok(Dispatch::Joined {
                    room: room_id,
                    previous,
                })
            }
            ClientFrame::Chat { message, id } => {
                self.relay(sender.id(), RelayFrame { text: message, id })
                    .await
            }
        }
    }

    /// Fans `frame` out to every peer in the sender's room.
    async fn relay(&self, sender: ConnectionId, frame: RelayFrame) -> Result<Dispatch, RelayError> {
        let targets = self
            .registry
            .fan_out_targets(sender)
            .await
            .ok_or(RelayError::ChatBeforeJoin)?;

        let payload = Utf8Bytes::from(serde_json::to_string(&frame)?);
        let mut delivered = 0;
        let mut dropped = 0;

        for peer in targets.peers {
            match peer.try_deliver(payload.clone()) {
                Delivery::Queued => delivered += 1,
                Delivery::Full => {
                    dropped += 1;
                    tracing::warn!(connection = %peer.id(), "peer outbox full, dropping frame");
                }
                Delivery::Closed => {
                    dropped += 1;
                    tracing::debug!(connection = %peer.id(), "peer closing, dropping frame");
                }
            }
        }

        Ok(Dispatch::Relayed {
            room: targets.room,
            delivered,
            dropped,
        })
    }

    /// Forgets `connection` after its transport closed, whatever its state.
    pub async fn disconnect(&self, connection: ConnectionId) {
        if let Some(room) = self.registry.remove(connection).await {
            tracing::debug!(%connection, %room, "connection left room");
        }
    }
}

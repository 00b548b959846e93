//! Wire protocol shared by the relay and its clients.
//!
//! Client → server frames are a `{ "type", "payload" }` envelope. The relay
//! answers with exactly one frame kind, [`RelayFrame`], which carries no
//! `type` field: clients recognize it by shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

/// Frame sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Sets or replaces the sender's room membership.
    Join {
        /// Room to join.
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// Relays a message to every other member of the sender's room.
    Chat {
        /// Message text.
        message: String,
        /// Client-generated message identifier.
        id: String,
    },
}

/// Loose envelope used for tolerant decoding.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    payload: Value,
}

impl ClientFrame {
    /// Builds a `join` frame.
    #[must_use]
    pub fn join(room_id: impl Into<String>) -> Self {
        Self::Join {
            room_id: room_id.into(),
        }
    }

    /// Decodes a raw client frame.
    ///
    /// Unknown fields are ignored so newer clients can add them freely.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedFrame`] for invalid JSON,
    /// [`RelayError::UnknownFrameType`] for a missing or unrecognized
    /// `type`, and [`RelayError::MissingField`] when a required payload
    /// field is absent, not a string, or (for `roomId`) empty.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let envelope: Envelope = serde_json::from_str(raw)?;

        match envelope.kind.as_deref() {
            Some("join") => {
                let room_id = string_field(&envelope.payload, "roomId")
                    .filter(|room| !room.is_empty())
                    .ok_or(RelayError::MissingField("roomId"))?;
                Ok(Self::Join { room_id })
            }
            Some("chat") => {
                let message = string_field(&envelope.payload, "message")
                    .ok_or(RelayError::MissingField("message"))?;
                let id = string_field(&envelope.payload, "id")
                    .ok_or(RelayError::MissingField("id"))?;
                Ok(Self::Chat { message, id })
            }
            _ => Err(RelayError::UnknownFrameType(envelope.kind)),
        }
    }

    /// Serializes the frame to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedFrame`] if serialization fails.
    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Frame fanned out by the relay to room peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFrame {
    /// Message text, exactly as the sender supplied it.
    pub text: String,
    /// Sender-assigned message identifier, never rewritten by the relay.
    pub id: String,
}

impl RelayFrame {
    /// Decodes a relay frame received by a client.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedFrame`] if the frame is not a JSON
    /// object with string `text` and `id` fields.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(raw)?)
    }
}

//! Client session: message identity, de-duplicated transcript, per-room
//! persistence and the relay connection.
//!
//! [`SessionState`] holds the protocol rules and can be driven without a
//! network. [`ClientSession`] wires it to a relay over WebSocket.

pub mod events;
pub mod message;
pub mod session;
pub mod state;
pub mod store;
pub mod transcript;

pub use events::{TranscriptEvent, TranscriptEvents};
pub use message::{ChatMessage, DeliveryStatus, Origin};
pub use session::ClientSession;
pub use state::SessionState;
pub use store::{FileStore, KeyValueStore, MemoryStore, transcript_key};
pub use transcript::Transcript;

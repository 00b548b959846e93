//! WebSocket layer: upgrade, per-connection loop, frame dispatch.
//!
//! The relay endpoint accepts `join` and `chat` frames and fans chat out
//! to the other members of the sender's room.

pub mod connection;
pub mod dispatcher;
pub mod handler;

pub use dispatcher::{Dispatch, RelayDispatcher};

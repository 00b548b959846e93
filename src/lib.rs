//! # room-relay
//!
//! Room-scoped chat relay over WebSocket, plus the client session that
//! talks to it.
//!
//! Clients join a named room and exchange short text messages with every
//! other client currently in that room. The relay keeps only the
//! `connection → room` relation; messages pass through it without being
//! stored. Clients give every message an identifier, de-duplicate on it,
//! and persist their transcript per room.
//!
//! ## Architecture
//!
//! ```text
//! ClientSession (client/)
//!     │  join / chat frames (protocol)
//!     ▼
//! WS Handler + connection loop (ws/)
//!     │
//!     ├── RelayDispatcher (ws/)
//!     │
//!     └── ConnectionRegistry (domain/)
//!     │
//!     ▼  relay frames to room peers
//! ClientSession (client/)
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod ws;

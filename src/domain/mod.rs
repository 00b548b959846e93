//! Domain layer: connection identity, peer handles and the room registry.
//!
//! This module contains the server-side state of the relay: the stable
//! identifier assigned to every accepted socket, the outbound handle used
//! to push frames to it, and the registry mapping connections to rooms.

pub mod connection_id;
pub mod peer;
pub mod registry;

pub use connection_id::ConnectionId;
pub use peer::{Delivery, PeerHandle};
pub use registry::{ConnectionRegistry, FanOutTargets};

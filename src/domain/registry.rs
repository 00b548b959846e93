//! Connection registry: which live connection is in which room.
//!
//! [`ConnectionRegistry`] holds the `connection → room` relation behind a
//! single [`tokio::sync::RwLock`]. Every read or write of the relation is
//! serialized through that lock; no network I/O ever happens while it is
//! held. Fan-out callers take a snapshot of the member set and send after
//! the guard is dropped.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use super::{ConnectionId, PeerHandle};

/// One row of the membership relation.
#[derive(Debug, Clone)]
struct Membership {
    room: String,
    peer: PeerHandle,
}

/// Snapshot of the peers a chat frame should be fanned out to.
#[derive(Debug)]
pub struct FanOutTargets {
    /// Room the sender is currently in.
    pub room: String,
    /// Every other connection in that room at snapshot time.
    pub peers: Vec<PeerHandle>,
}

/// In-memory map from live connection to its current room.
///
/// # Concurrency
///
/// - One coarse lock covers `join`, `room_of`, `members_of` and `remove`.
/// - A connection removed by [`ConnectionRegistry::remove`] never appears
///   in a member snapshot taken afterwards.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    members: RwLock<HashMap<ConnectionId, Membership>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `peer` in `room`, replacing any previous membership.
    ///
    /// Returns the room the connection was in before, if any.
    pub async fn join(&self, peer: PeerHandle, room: impl Into<String>) -> Option<String> {
        let membership = Membership {
            room: room.into(),
            peer,
        };
        let mut map = self.members.write().await;
        map.insert(membership.peer.id(), membership)
            .map(|previous| previous.room)
    }

    /// Returns the room `connection` is in, if it has joined one.
    pub async fn room_of(&self, connection: ConnectionId) -> Option<String> {
        let map = self.members.read().await;
        map.get(&connection).map(|m| m.room.clone())
    }

    /// Returns every connection in `room` other than `excluding`.
    ///
    /// The sequence is a snapshot taken under the lock; iterating it does
    /// not hold the lock. Order is unspecified.
    pub async fn members_of(
        &self,
        room: &str,
        excluding: ConnectionId,
    ) -> std::vec::IntoIter<PeerHandle> {
        let map = self.members.read().await;
        collect_peers(&map, room, excluding).into_iter()
    }

    /// Resolves the sender's room and its peers in one lock acquisition.
    ///
    /// Returns `None` if `sender` has not joined a room.
    pub async fn fan_out_targets(&self, sender: ConnectionId) -> Option<FanOutTargets> {
        let map = self.members.read().await;
        let room = map.get(&sender)?.room.clone();
        let peers = collect_peers(&map, &room, sender);
        Some(FanOutTargets { room, peers })
    }

    /// Drops `connection` from the registry. No-op if absent.
    ///
    /// Returns the room it was in, if any.
    pub async fn remove(&self, connection: ConnectionId) -> Option<String> {
        let mut map = self.members.write().await;
        map.remove(&connection).map(|m| m.room)
    }

    /// Returns the number of joined connections.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Returns `true` if no connection has joined a room.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Returns the number of distinct rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        let map = self.members.read().await;
        map.values()
            .map(|m| m.room.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

fn collect_peers(
    map: &HashMap<ConnectionId, Membership>,
    room: &str,
    excluding: ConnectionId,
) -> Vec<PeerHandle> {
    map.values()
        .filter(|m| m.room == room && m.peer.id() != excluding)
        .map(|m| m.peer.clone())
        .collect()
}

//! Outbound side of a live connection.

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::ConnectionId;

/// Result of handing one frame to a peer's outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The frame was queued for the peer's writer task.
    Queued,
    /// The peer's outbox is full; the frame was dropped.
    Full,
    /// The peer's writer task is gone (socket mid-close).
    Closed,
}

/// Handle used to push serialized frames to one connection.
///
/// Cloning is cheap; all clones feed the same writer task. Pushing never
/// waits on the network.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: ConnectionId,
    outbox: mpsc::Sender<Utf8Bytes>,
}

impl PeerHandle {
    /// Creates a handle for connection `id` writing into `outbox`.
    #[must_use]
    pub const fn new(id: ConnectionId, outbox: mpsc::Sender<Utf8Bytes>) -> Self {
        Self { id, outbox }
    }

    /// Returns the connection this handle belongs to.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues `frame` without blocking.
    pub fn try_deliver(&self, frame: Utf8Bytes) -> Delivery {
        match self.outbox.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_frame_reaches_outbox() {
        let (tx, mut rx) = mpsc::channel(4);
        let peer = PeerHandle::new(ConnectionId::new(), tx);

        assert_eq!(peer.try_deliver(Utf8Bytes::from("hello")), Delivery::Queued);
        let Some(frame) = rx.recv().await else {
            panic!("expected a frame");
        };
        assert_eq!(frame.as_str(), "hello");
    }

    #[test]
    fn full_outbox_drops_frame() {
        let (tx, _rx) = mpsc::channel(1);
        let peer = PeerHandle::new(ConnectionId::new(), tx);

        assert_eq!(peer.try_deliver(Utf8Bytes::from("a")), Delivery::Queued);
        assert_eq!(peer.try_deliver(Utf8Bytes::from("b")), Delivery::Full);
    }

    #[test]
    fn closed_outbox_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let peer = PeerHandle::new(ConnectionId::new(), tx);

        assert_eq!(peer.try_deliver(Utf8Bytes::from("a")), Delivery::Closed);
    }
}

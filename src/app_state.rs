//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::ConnectionRegistry;
use crate::ws::RelayDispatcher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Frame dispatcher shared by every connection.
    pub dispatcher: Arc<RelayDispatcher>,
    /// Capacity of each connection's outbound frame queue.
    pub outbox_capacity: usize,
}

impl AppState {
    /// Builds state around a fresh, empty registry.
    #[must_use]
    pub fn new(outbox_capacity: usize) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            dispatcher: Arc::new(RelayDispatcher::new(registry)),
            outbox_capacity,
        }
    }

    /// Returns the connection registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.dispatcher.registry()
    }
}

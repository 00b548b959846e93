//! Per-connection read/write loop.
//!
//! Each accepted socket is split in two. A writer task drains the
//! connection's bounded outbox into the sink, so a slow peer only ever
//! backs up its own queue. The read loop hands every inbound frame to the
//! shared [`RelayDispatcher`] and cleans up the registry entry when the
//! transport goes away.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::dispatcher::{Dispatch, RelayDispatcher};
use crate::domain::{ConnectionId, PeerHandle};

/// Runs the read/write loop for a single WebSocket connection.
///
/// Returns once the client closes, the stream errors, or the writer task
/// can no longer reach the socket.
pub async fn run_connection(
    socket: WebSocket,
    dispatcher: Arc<RelayDispatcher>,
    outbox_capacity: usize,
) {
    let connection = ConnectionId::new();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbox, mut inbox) = mpsc::channel::<Utf8Bytes>(outbox_capacity.max(1));
    let peer = PeerHandle::new(connection, outbox);

    tracing::debug!(%connection, "ws connection opened");

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = inbox.recv().await {
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&dispatcher, &peer, text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => handle_frame(&dispatcher, &peer, text).await,
                        Err(_) => tracing::debug!(%connection, "dropping non-utf8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%connection, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    dispatcher.disconnect(connection).await;
    writer.abort();

    tracing::debug!(%connection, "ws connection closed");
}

/// Dispatches one frame, logging the outcome. Errors never reach the client.
async fn handle_frame(dispatcher: &RelayDispatcher, peer: &PeerHandle, raw: &str) {
    let connection = peer.id();
    match dispatcher.dispatch(peer, raw).await {
        Ok(Dispatch::Joined { room, previous }) => {
            tracing::info!(%connection, %room, ?previous, "connection joined room");
        }
        Ok(Dispatch::Relayed {
            room,
            delivered,
            dropped,
        }) => {
            tracing::debug!(%connection, %room, delivered, dropped, "chat relayed");
        }
        Err(err) if err.is_silent_drop() => {
            tracing::debug!(
                %connection,
                code = err.error_code(),
                error = %err,
                "dropping frame"
            );
        }
        Err(err) => {
            tracing::warn!(
                %connection,
                code = err.error_code(),
                error = %err,
                "frame handling failed"
            );
        }
    }
}

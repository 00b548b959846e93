//! Terminal chat client.
//!
//! Usage: `chat_client <room>`. Lines typed on stdin are sent to the room;
//! `/leave` leaves the room (dropping its saved transcript) and exits,
//! `/quit` exits and keeps the transcript for the next join.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use room_relay::client::{ChatMessage, ClientSession, FileStore, TranscriptEvent};
use room_relay::config::ClientConfig;

fn render(message: &ChatMessage) {
    let who = if message.is_mine() { "me" } else { "peer" };
    println!(
        "[{}] {who}: {}",
        message.timestamp.format("%H:%M:%S"),
        message.text
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let room = std::env::args()
        .nth(1)
        .context("usage: chat_client <room>")?;
    let config = ClientConfig::from_env()?;
    let store = FileStore::open(&config.transcript_dir)
        .with_context(|| format!("opening {}", config.transcript_dir.display()))?;

    let mut session = ClientSession::new(store, config.event_capacity);
    session
        .join(&config.relay_url, &room)
        .await
        .with_context(|| format!("joining {room} at {}", config.relay_url))?;

    for message in session.transcript().await {
        render(&message);
    }

    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TranscriptEvent::Appended(message)) if !message.is_mine() => render(&message),
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => tracing::warn!(lagged = n, "display fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/leave" => {
                session.leave().await?;
                break;
            }
            _ => {
                if !session.is_connected() {
                    eprintln!("connection lost; restart to rejoin {room}");
                    break;
                }
                session.send(&line).await?;
            }
        }
    }

    session.disconnect();
    printer.abort();
    Ok(())
}

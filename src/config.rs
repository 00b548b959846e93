//! Relay and client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::RelayError;

/// Relay server configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the relay to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Frames queued per connection before further frames to it are dropped.
    pub outbound_queue_capacity: usize,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `LISTEN_ADDR` is set but cannot be
    /// parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();

        let raw_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let listen_addr = raw_addr
            .parse()
            .map_err(|_| RelayError::Config(format!("LISTEN_ADDR={raw_addr}")))?;

        let outbound_queue_capacity = parse_env("OUTBOUND_QUEUE_CAPACITY", 256);

        Ok(Self {
            listen_addr,
            outbound_queue_capacity,
        })
    }
}

/// Terminal client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the relay.
    pub relay_url: String,

    /// Directory holding persisted room transcripts.
    pub transcript_dir: PathBuf,

    /// Capacity of the transcript event channel.
    pub event_capacity: usize,
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `RELAY_URL` does not use the
    /// `ws` or `wss` scheme.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();

        let relay_url =
            std::env::var("RELAY_URL").unwrap_or_else(|_| "ws://127.0.0.1:8080".to_string());
        if !(relay_url.starts_with("ws://") || relay_url.starts_with("wss://")) {
            return Err(RelayError::Config(format!("RELAY_URL={relay_url}")));
        }

        let transcript_dir = std::env::var("TRANSCRIPT_DIR")
            .map_or_else(|_| PathBuf::from(".chat-transcripts"), PathBuf::from);

        let event_capacity = parse_env("TRANSCRIPT_EVENT_CAPACITY", 256);

        Ok(Self {
            relay_url,
            transcript_dir,
            event_capacity,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

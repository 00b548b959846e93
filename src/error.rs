//! Relay error types with stable numeric codes.
//!
//! [`RelayError`] is the central error type for the crate. None of these
//! errors ever reach a peer over the wire: the server logs them and drops
//! the offending frame, the client surfaces them to its caller.

use tokio_tungstenite::tungstenite;

/// Crate-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category                   |
/// |-----------|----------------------------|
/// | 1000–1999 | Malformed frames           |
/// | 2000–2999 | Protocol state violations  |
/// | 3000–3999 | Client transport / storage |
/// | 4000–4999 | Configuration              |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The frame was not valid JSON.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// The frame carried no `type`, or one this protocol does not know.
    #[error("unknown frame type: {0:?}")]
    UnknownFrameType(Option<String>),

    /// A recognized frame was missing a required payload field.
    #[error("frame is missing required field `{0}`")]
    MissingField(&'static str),

    /// A `chat` frame arrived from a connection that never joined a room.
    #[error("chat received before join")]
    ChatBeforeJoin,

    /// A room name was empty or whitespace only.
    #[error("room name must not be empty")]
    EmptyRoomName,

    /// The client session has no joined room.
    #[error("session has not joined a room")]
    NotJoined,

    /// The WebSocket transport failed.
    #[error("transport error: {0}")]
    Transport(#[source] Box<tungstenite::Error>),

    /// The transcript store failed to read or write.
    #[error("transcript store error: {0}")]
    Store(#[from] std::io::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    StoreTask(#[from] tokio::task::JoinError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedFrame(_) => 1001,
            Self::UnknownFrameType(_) => 1002,
            Self::MissingField(_) => 1003,
            Self::ChatBeforeJoin => 2001,
            Self::EmptyRoomName => 2002,
            Self::NotJoined => 2003,
            Self::Transport(_) => 3001,
            Self::Store(_) => 3002,
            Self::StoreTask(_) => 3003,
            Self::Config(_) => 4001,
        }
    }

    /// Returns `true` for errors the relay drops without closing the
    /// connection (malformed frames and protocol state violations).
    #[must_use]
    pub const fn is_silent_drop(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame(_)
                | Self::UnknownFrameType(_)
                | Self::MissingField(_)
                | Self::ChatBeforeJoin
        )
    }
}

impl From<tungstenite::Error> for RelayError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

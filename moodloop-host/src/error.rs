//! Host error types.

use moodloop_core::MoodloopError;
use moodloop_core::engine::TurnRejected;
use thiserror::Error;

/// Errors surfaced by the host layer.
#[derive(Debug, Error)]
pub enum HostError {
    /// Core failure (persistence, serialization, configuration).
    #[error(transparent)]
    Core(#[from] MoodloopError),

    /// The conversation state machine refused the request.
    #[error("Turn rejected: {0}")]
    Turn(#[from] TurnRejected),

    /// Invalid host configuration.
    #[error("Host configuration error: {0}")]
    Config(String),

    /// The request needs the session idle, but a conversation is running.
    #[error("A conversation is in progress")]
    Busy,
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, HostError>;

//! Error types for the moodloop core library.
//!
//! Only configuration and persistence can fail. Gameplay paths (turns,
//! retrieval, decay) resolve bad input to documented defaults instead.

use thiserror::Error;

/// Top-level error type for fallible moodloop operations.
#[derive(Error, Debug)]
pub enum MoodloopError {
    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A decoded snapshot is internally inconsistent.
    #[error("Invalid memory snapshot: {0}")]
    InvalidSnapshot(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MoodloopError>;

//! Voice error types.

use thiserror::Error;

/// Errors that can occur while turning a request into speech.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The speech backend rejected or failed the request.
    #[error("Speech synthesis failed: {0}")]
    Backend(String),

    /// The request ran past its deadline while being synthesised.
    #[error("Speech synthesis timed out after {0}ms")]
    Timeout(u64),

    /// The speech backend is unavailable.
    #[error("Speech backend unavailable: {0}")]
    Unavailable(String),

    /// The dispatcher task panicked or was cancelled.
    #[error("Voice dispatcher stopped abnormally: {0}")]
    Dispatcher(String),
}

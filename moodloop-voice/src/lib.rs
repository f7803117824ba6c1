//! # moodloop-voice — out-of-band speech for moodloop characters
//!
//! The conversation engine must never wait on speech synthesis. This crate
//! gives it a [`VoiceQueue`] to hand lines to (through the core
//! `SpeechSink` trait) and a [`VoiceDispatcher`] that speaks them later on a
//! tokio task:
//!
//! ```text
//! ConversationEngine ─▶ VoiceQueue (priority + deadline + back-pressure)
//!                            │
//!                            ▼
//!                     VoiceDispatcher ─▶ VoiceBackend (TTS, logging, ...)
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]

pub mod dispatcher;
pub mod error;
pub mod queue;

pub use dispatcher::{DispatchStats, LogBackend, VoiceBackend, VoiceDispatcher};
pub use error::VoiceError;
pub use queue::{QueueStats, SpeechPriority, VoiceQueue, VoiceRequest};

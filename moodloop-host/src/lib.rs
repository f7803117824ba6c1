//! # moodloop-host — running moodloop inside a game or app
//!
//! Glue between `moodloop-core` and whatever hosts it:
//!
//! ```text
//!  input ──▶ Session ──(mutex)──▶ ConversationEngine + Character
//!              │  ▲                    │ reactions     │ speech
//!   ticker ────┘  │                    ▼               ▼
//!                 └── drain_events ◀ EventBuffer    VoiceQueue ─▶ VoiceDispatcher
//! ```
//!
//! ## Modules
//!
//! - `session`: mutex-guarded session, autosave and the decay ticker
//! - `components`: per-character host state and stats
//! - `events`: UI / animation events
//! - `dialogue`: template dialogue with seeded variation
//! - `config`: host TOML configuration
//! - `telemetry`: `tracing` subscriber setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod events;
pub mod session;
pub mod telemetry;

pub use config::HostConfig;
pub use error::HostError;
pub use events::{EventBuffer, HostEvent};
pub use session::{Session, Ticker, spawn_ticker};

//! # Moodloop Core Library
//!
//! Engine-agnostic conversation simulation for a single game character.
//!
//! A player tries to persuade the character (a child facing bedtime,
//! homework, dinner and so on) through a short multi-turn conversation.
//! Each turn the character:
//!
//! - **Feels**: the player's approach moves its [`EmotionalState`]
//!   (mood, relationship, trust, stress, autonomy, respect).
//! - **Remembers**: the turn is stored in a two-tier [`MemoryStore`], and
//!   the most relevant earlier memory colours the reply.
//! - **Answers**: a [`Policy`] (a rule cascade or a learned model) picks one
//!   of eight response categories; three of them end the conversation.
//!
//! The [`ConversationEngine`] drives that loop. Everything outside the
//! simulation (dialogue wording, speech synthesis, animation) sits behind
//! the narrow traits in [`collaborators`], so the engine never blocks on I/O.
//!
//! ## Performance Contract
//!
//! - One turn (classify, update, recall, decide, record): < 50μs
//! - Memory retrieval over a full store (100 memories): < 20μs
//! - Character save (100 memories, bincode): < 1ms

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod character;
pub mod classifier;
pub mod collaborators;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod memory;
pub mod observation;
pub mod persistence;
pub mod policy;
pub mod reward;
pub mod sentiment;
pub mod types;

pub use character::Character;
pub use config::MoodloopConfig;
pub use emotion::EmotionalState;
pub use engine::{ConversationEngine, TurnOutcome, TurnRejected};
pub use error::MoodloopError;
pub use memory::MemoryStore;
pub use policy::Policy;
pub use types::*;

//! The simulated character: identity, emotional state, memory and clock.
//!
//! A [`Character`] is the single owner of its [`EmotionalState`] and
//! [`MemoryStore`]. The conversation engine borrows it mutably for one call
//! at a time, and the host's tick loop borrows it for decay, so the two can
//! never interleave mid-update.

use serde::{Deserialize, Serialize};

use crate::config::MoodloopConfig;
use crate::emotion::EmotionalState;
use crate::memory::MemoryStore;
use crate::types::{CharacterId, SimClock};

/// Everything that makes up one character. Serialisable as a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Persistence key.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Emotional state (single owner).
    pub state: EmotionalState,
    /// Memories and patterns (single owner).
    pub memory: MemoryStore,
    /// Simulation clock, advanced by the host tick.
    pub clock: SimClock,
}

impl Character {
    /// Fresh character with a new id.
    #[must_use]
    pub fn new(name: impl Into<String>, config: &MoodloopConfig) -> Self {
        Self::with_id(CharacterId::new(), name, config)
    }

    /// Fresh character with a known id.
    #[must_use]
    pub fn with_id(id: CharacterId, name: impl Into<String>, config: &MoodloopConfig) -> Self {
        Self {
            id,
            name: name.into(),
            state: EmotionalState::from_config(&config.emotion),
            memory: MemoryStore::new(config.memory.clone()),
            clock: SimClock::default(),
        }
    }

    /// One host tick: advance the clock by `dt` seconds, then decay.
    pub fn tick(&mut self, dt: f32) {
        self.clock.advance(dt);
        self.state.decay(dt);
    }
}

//! Per-character host state.

use moodloop_core::{Character, Emotion};

/// A character as the host holds it: the simulation state plus whether the
/// host is currently simulating it.
#[derive(Debug, Clone)]
pub struct CharacterSlot {
    /// The simulated character.
    pub character: Character,
    /// Whether decay ticks apply. Hosts switch this off for characters
    /// that are off-screen or paused.
    pub active: bool,
}

/// Snapshot of a slot for debug overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotStats {
    /// Memories in the short-term ring.
    pub short_term: usize,
    /// Memories in the long-term store.
    pub long_term: usize,
    /// Current emotion.
    pub emotion: Emotion,
    /// Current mood.
    pub mood: f32,
    /// Current relationship.
    pub relationship: f32,
    /// Simulation time in milliseconds.
    pub sim_millis: u64,
}

impl CharacterSlot {
    /// Active slot around `character`.
    #[must_use]
    pub fn new(character: Character) -> Self {
        Self {
            character,
            active: true,
        }
    }

    /// Runtime statistics.
    #[must_use]
    pub fn stats(&self) -> SlotStats {
        let c = &self.character;
        SlotStats {
            short_term: c.memory.short_term_len(),
            long_term: c.memory.long_term_len(),
            emotion: c.state.current_emotion(),
            mood: c.state.mood(),
            relationship: c.state.relationship(),
            sim_millis: c.clock.millis(),
        }
    }

    /// Decay tick. Returns the emotion before and after when it changed.
    /// Inactive slots are left alone.
    pub fn tick(&mut self, dt: f32) -> Option<(Emotion, Emotion)> {
        if !self.active {
            return None;
        }
        let before = self.character.state.current_emotion();
        self.character.tick(dt);
        let after = self.character.state.current_emotion();
        (before != after).then_some((before, after))
    }
}

#[cfg(test)]
mod tests {
    use moodloop_core::MoodloopConfig;

    use super::*;

    #[test]
    fn inactive_slots_do_not_decay() {
        let mut config = MoodloopConfig::default();
        config.emotion.initial_mood = 60.0;
        config.emotion.initial_relationship = 50.0;
        let mut slot = CharacterSlot::new(Character::new("Maya", &config));
        slot.active = false;
        assert_eq!(slot.tick(10.0), None);
        assert_eq!(slot.stats().sim_millis, 0);
    }

    #[test]
    fn tick_reports_emotion_changes() {
        let mut config = MoodloopConfig::default();
        config.emotion.initial_mood = 60.0;
        config.emotion.initial_relationship = 50.0;
        let mut slot = CharacterSlot::new(Character::new("Maya", &config));
        assert_eq!(slot.stats().emotion, Emotion::Happy);

        // 2 mood points per second: 60 → 40 crosses the Happy threshold.
        assert_eq!(slot.tick(10.0), Some((Emotion::Happy, Emotion::Neutral)));
        assert_eq!(slot.tick(0.1), None);
        assert_eq!(slot.stats().sim_millis, 10_100);
    }
}

//! Emotional state of a simulated character.
//!
//! Eight clamped scalars plus two streak counters. The discrete
//! [`Emotion`] label is recomputed after every mutation and can't be set
//! from outside, so it always matches the scalars.
//!
//! ```text
//! relationship, mood          -100 ..= 100
//! trust, stress, autonomy,
//! respect, tiredness, hunger     0 ..= 100
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EmotionConfig;
use crate::types::Emotion;

const SIGNED_RANGE: (f32, f32) = (-100.0, 100.0);
const UNSIGNED_RANGE: (f32, f32) = (0.0, 100.0);

/// Width of the vector returned by [`EmotionalState::to_observation_vector`].
pub const STATE_OBSERVATION_LEN: usize = 11;

/// Plain snapshot of the eight scalars. Used to build a state and to read
/// one back out. Values are clamped when turned into an [`EmotionalState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionLevels {
    /// Affinity toward the counterpart.
    pub relationship: f32,
    /// Short-term affect.
    pub mood: f32,
    /// Trust in the counterpart.
    pub trust: f32,
    /// Stress.
    pub stress: f32,
    /// Need for autonomy. Trait-like and slow to change.
    pub autonomy_need: f32,
    /// Respect the character feels it is getting.
    pub respect_received: f32,
    /// Situational tiredness.
    pub tiredness: f32,
    /// Situational hunger.
    pub hunger: f32,
}

impl Default for EmotionLevels {
    fn default() -> Self {
        Self::from_config(&EmotionConfig::default())
    }
}

impl EmotionLevels {
    /// Starting levels from configuration. Situational modifiers start at zero.
    #[must_use]
    pub fn from_config(config: &EmotionConfig) -> Self {
        Self {
            relationship: config.initial_relationship,
            mood: config.initial_mood,
            trust: config.initial_trust,
            stress: config.initial_stress,
            autonomy_need: config.initial_autonomy_need,
            respect_received: config.initial_respect,
            tiredness: 0.0,
            hunger: 0.0,
        }
    }

    fn clamped(self) -> Self {
        Self {
            relationship: clamp_to(self.relationship, SIGNED_RANGE),
            mood: clamp_to(self.mood, SIGNED_RANGE),
            trust: clamp_to(self.trust, UNSIGNED_RANGE),
            stress: clamp_to(self.stress, UNSIGNED_RANGE),
            autonomy_need: clamp_to(self.autonomy_need, UNSIGNED_RANGE),
            respect_received: clamp_to(self.respect_received, UNSIGNED_RANGE),
            tiredness: clamp_to(self.tiredness, UNSIGNED_RANGE),
            hunger: clamp_to(self.hunger, UNSIGNED_RANGE),
        }
    }
}

/// Rates used by [`EmotionalState::apply_interaction`] and [`EmotionalState::decay`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionTuning {
    /// Mood points relaxed toward zero per second.
    pub mood_decay_per_second: f32,
    /// Stress floor for decay.
    pub stress_floor: f32,
    /// Trust gained per respectful interaction.
    pub trust_gain_respectful: f32,
    /// Trust lost per disrespectful interaction.
    pub trust_loss_disrespectful: f32,
}

impl Default for EmotionTuning {
    fn default() -> Self {
        Self::from_config(&EmotionConfig::default())
    }
}

impl EmotionTuning {
    /// Rates from configuration.
    #[must_use]
    pub fn from_config(config: &EmotionConfig) -> Self {
        Self {
            mood_decay_per_second: config.mood_decay_per_second.max(0.0),
            stress_floor: clamp_to(config.stress_floor, UNSIGNED_RANGE),
            trust_gain_respectful: config.trust_gain_respectful,
            trust_loss_disrespectful: config.trust_loss_disrespectful,
        }
    }
}

/// The character's psychological state. Mutated in place by its single owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StateRepr", into = "StateRepr")]
pub struct EmotionalState {
    levels: EmotionLevels,
    consecutive_negative: u32,
    consecutive_positive: u32,
    current_emotion: Emotion,
    tuning: EmotionTuning,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self::new(EmotionLevels::default(), EmotionTuning::default())
    }
}

impl EmotionalState {
    /// Build a state from (clamped) levels.
    #[must_use]
    pub fn new(levels: EmotionLevels, tuning: EmotionTuning) -> Self {
        let mut state = Self {
            levels: levels.clamped(),
            consecutive_negative: 0,
            consecutive_positive: 0,
            current_emotion: Emotion::Neutral,
            tuning,
        };
        state.recompute();
        state
    }

    /// Fresh state from configuration.
    #[must_use]
    pub fn from_config(config: &EmotionConfig) -> Self {
        Self::new(EmotionLevels::from_config(config), EmotionTuning::from_config(config))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Apply one interaction's deltas.
    ///
    /// Relationship, mood and respect are clamp-added. The sign of
    /// `mood_delta` extends one streak and resets the other; a zero delta
    /// leaves both alone. Trust moves by the configured gain or loss
    /// depending on `was_respectful`.
    pub fn apply_interaction(
        &mut self,
        relationship_delta: f32,
        mood_delta: f32,
        respect_delta: f32,
        was_respectful: bool,
    ) {
        let l = &mut self.levels;
        l.relationship = clamp_to(l.relationship + finite(relationship_delta), SIGNED_RANGE);
        l.mood = clamp_to(l.mood + finite(mood_delta), SIGNED_RANGE);
        l.respect_received =
            clamp_to(l.respect_received + finite(respect_delta), UNSIGNED_RANGE);

        let mood_delta = finite(mood_delta);
        if mood_delta > 0.0 {
            self.consecutive_positive = self.consecutive_positive.saturating_add(1);
            self.consecutive_negative = 0;
        } else if mood_delta < 0.0 {
            self.consecutive_negative = self.consecutive_negative.saturating_add(1);
            self.consecutive_positive = 0;
        }

        let trust_delta = if was_respectful {
            self.tuning.trust_gain_respectful
        } else {
            -self.tuning.trust_loss_disrespectful
        };
        l.trust = clamp_to(l.trust + trust_delta, UNSIGNED_RANGE);

        self.recompute();
    }

    /// Relax mood toward zero and stress toward its floor.
    ///
    /// Driven by the simulation clock, once per host tick, independent of
    /// conversation pace. Neither value overshoots its target.
    pub fn decay(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let step = self.tuning.mood_decay_per_second * dt;
        let l = &mut self.levels;

        l.mood = if l.mood > 0.0 {
            (l.mood - step).max(0.0)
        } else {
            (l.mood + step).min(0.0)
        };

        let floor = self.tuning.stress_floor;
        if l.stress > floor {
            l.stress = (l.stress - step * 0.5).max(floor);
        }

        self.recompute();
    }

    /// Clamp-add to stress.
    pub fn adjust_stress(&mut self, delta: f32) {
        self.levels.stress = clamp_to(self.levels.stress + finite(delta), UNSIGNED_RANGE);
        self.recompute();
    }

    /// Clamp-add to trust.
    pub fn adjust_trust(&mut self, delta: f32) {
        self.levels.trust = clamp_to(self.levels.trust + finite(delta), UNSIGNED_RANGE);
        self.recompute();
    }

    /// Clamp-add to relationship.
    pub fn adjust_relationship(&mut self, delta: f32) {
        self.levels.relationship =
            clamp_to(self.levels.relationship + finite(delta), SIGNED_RANGE);
        self.recompute();
    }

    /// Mood-only adjustment (memory influence). Streaks and trust are untouched.
    pub fn nudge_mood(&mut self, delta: f32) {
        self.levels.mood = clamp_to(self.levels.mood + finite(delta), SIGNED_RANGE);
        self.recompute();
    }

    /// Replace the situational modifiers.
    pub fn set_situation(&mut self, tiredness: f32, hunger: f32) {
        self.levels.tiredness = clamp_to(finite(tiredness), UNSIGNED_RANGE);
        self.levels.hunger = clamp_to(finite(hunger), UNSIGNED_RANGE);
        self.recompute();
    }

    // ------------------------------------------------------------------
    // Derivation
    // ------------------------------------------------------------------

    /// Severity-first cascade; the first matching rule wins. The order is
    /// part of the contract: boundary states classify differently if it
    /// changes.
    #[must_use]
    pub fn derive_emotion(&self) -> Emotion {
        let l = &self.levels;
        if l.mood > 50.0 && l.relationship > 30.0 {
            Emotion::Happy
        } else if l.mood > 20.0 && l.respect_received > 60.0 {
            Emotion::Receptive
        } else if l.mood < -50.0 && l.stress > 60.0 {
            Emotion::Angry
        } else if l.mood < -30.0 && l.autonomy_need > 70.0 && l.respect_received < 40.0 {
            Emotion::Defiant
        } else if l.mood < -20.0 {
            Emotion::Annoyed
        } else if l.trust < 30.0 && l.stress > 50.0 {
            Emotion::Anxious
        } else if l.relationship < -40.0 {
            Emotion::Sad
        } else {
            Emotion::Neutral
        }
    }

    fn recompute(&mut self) {
        self.current_emotion = self.derive_emotion();
    }

    /// Normalised view for an external learner: the eight scalars divided by
    /// 100, the streaks divided by 10 and the emotion ordinal divided by 8.
    #[must_use]
    pub fn to_observation_vector(&self) -> [f32; STATE_OBSERVATION_LEN] {
        let l = &self.levels;
        [
            l.relationship / 100.0,
            l.mood / 100.0,
            l.trust / 100.0,
            l.stress / 100.0,
            l.autonomy_need / 100.0,
            l.respect_received / 100.0,
            l.tiredness / 100.0,
            l.hunger / 100.0,
            self.consecutive_negative as f32 / 10.0,
            self.consecutive_positive as f32 / 10.0,
            self.current_emotion.ordinal() as f32 / 8.0,
        ]
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Copy of all eight scalars.
    #[must_use]
    pub fn levels(&self) -> EmotionLevels {
        self.levels
    }

    /// Current emotion label.
    #[must_use]
    pub fn current_emotion(&self) -> Emotion {
        self.current_emotion
    }

    /// Relationship (-100..100).
    #[must_use]
    pub fn relationship(&self) -> f32 {
        self.levels.relationship
    }

    /// Mood (-100..100).
    #[must_use]
    pub fn mood(&self) -> f32 {
        self.levels.mood
    }

    /// Trust (0..100).
    #[must_use]
    pub fn trust(&self) -> f32 {
        self.levels.trust
    }

    /// Stress (0..100).
    #[must_use]
    pub fn stress(&self) -> f32 {
        self.levels.stress
    }

    /// Autonomy need (0..100).
    #[must_use]
    pub fn autonomy_need(&self) -> f32 {
        self.levels.autonomy_need
    }

    /// Respect received (0..100).
    #[must_use]
    pub fn respect_received(&self) -> f32 {
        self.levels.respect_received
    }

    /// Tiredness (0..100).
    #[must_use]
    pub fn tiredness(&self) -> f32 {
        self.levels.tiredness
    }

    /// Hunger (0..100).
    #[must_use]
    pub fn hunger(&self) -> f32 {
        self.levels.hunger
    }

    /// Length of the current negative-mood streak.
    #[must_use]
    pub fn consecutive_negative(&self) -> u32 {
        self.consecutive_negative
    }

    /// Length of the current positive-mood streak.
    #[must_use]
    pub fn consecutive_positive(&self) -> u32 {
        self.consecutive_positive
    }
}

/// Serialized form. The emotion label is not stored; it is re-derived on load.
#[derive(Serialize, Deserialize)]
struct StateRepr {
    levels: EmotionLevels,
    #[serde(default)]
    consecutive_negative: u32,
    #[serde(default)]
    consecutive_positive: u32,
    #[serde(default)]
    tuning: EmotionTuning,
}

impl From<StateRepr> for EmotionalState {
    fn from(repr: StateRepr) -> Self {
        let mut state = Self::new(repr.levels, repr.tuning);
        state.consecutive_negative = repr.consecutive_negative;
        state.consecutive_positive = repr.consecutive_positive;
        state
    }
}

impl From<EmotionalState> for StateRepr {
    fn from(state: EmotionalState) -> Self {
        Self {
            levels: state.levels,
            consecutive_negative: state.consecutive_negative,
            consecutive_positive: state.consecutive_positive,
            tuning: state.tuning,
        }
    }
}

fn finite(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn clamp_to(v: f32, (lo, hi): (f32, f32)) -> f32 {
    finite(v).clamp(lo, hi)
}

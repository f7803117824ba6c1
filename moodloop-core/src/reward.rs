//! Reward shaping for training an external policy.
//!
//! Kept apart from the response policy so it can be replaced or switched
//! off without touching how responses are chosen. The engine only calls
//! into it when a model is attached.

use crate::config::RewardConfig;
use crate::types::{Emotion, PlayerAction, ResponseKind};

/// One processed turn, as seen by a reward model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Turn number (1-based).
    pub turn: u32,
    /// What the player did.
    pub action: PlayerAction,
    /// How the character answered.
    pub response: ResponseKind,
    /// Emotion the response was chosen under.
    pub emotion: Emotion,
    /// Mood the response was chosen under.
    pub mood: f32,
    /// Mood change caused by the turn.
    pub mood_delta: f32,
    /// Relationship change caused by the turn.
    pub relationship_delta: f32,
}

/// How a conversation ended, as seen by a reward model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    /// Turns played.
    pub turns: u32,
    /// Relationship at the end.
    pub final_relationship: f32,
    /// Whether the character complied at some point.
    pub complied: bool,
}

/// Scores transitions and finished episodes.
pub trait RewardModel: Send {
    /// Reward for a single turn.
    fn step_reward(&self, transition: &Transition) -> f32;

    /// Extra reward when a conversation ends.
    fn episode_reward(&self, summary: &EpisodeSummary) -> f32;
}

/// Whether `response` fits the character's emotion.
///
/// | response | consistent with |
/// |----------|-----------------|
/// | Compliant | Happy, Receptive, or mood > 30 |
/// | NegotiateCalm | Receptive, Neutral |
/// | Sarcastic | Annoyed |
/// | Angry | Angry, or mood < −40 |
/// | Dismissive | Neutral, Annoyed |
/// | EmotionalPlead | Sad, Anxious |
/// | Defiant | Defiant, Annoyed |
/// | ReasonableRefusal | Neutral, Receptive |
#[must_use]
pub fn is_consistent(response: ResponseKind, emotion: Emotion, mood: f32) -> bool {
    use Emotion as E;
    match response {
        ResponseKind::Compliant => matches!(emotion, E::Happy | E::Receptive) || mood > 30.0,
        ResponseKind::NegotiateCalm => matches!(emotion, E::Receptive | E::Neutral),
        ResponseKind::Sarcastic => emotion == E::Annoyed,
        ResponseKind::Angry => emotion == E::Angry || mood < -40.0,
        ResponseKind::Dismissive => matches!(emotion, E::Neutral | E::Annoyed),
        ResponseKind::EmotionalPlead => matches!(emotion, E::Sad | E::Anxious),
        ResponseKind::Defiant => matches!(emotion, E::Defiant | E::Annoyed),
        ResponseKind::ReasonableRefusal => matches!(emotion, E::Neutral | E::Receptive),
    }
}

/// Consistency bonus per turn plus compliance and relationship terms at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedReward {
    config: RewardConfig,
}

impl ShapedReward {
    /// Build from configuration constants. `config.enabled` is not consulted
    /// here; it only decides whether the engine attaches a model at all.
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }
}

impl Default for ShapedReward {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}

impl RewardModel for ShapedReward {
    fn step_reward(&self, t: &Transition) -> f32 {
        if is_consistent(t.response, t.emotion, t.mood) {
            self.config.consistency_bonus
        } else {
            -self.config.inconsistency_penalty
        }
    }

    fn episode_reward(&self, summary: &EpisodeSummary) -> f32 {
        let mut reward = 0.0;
        if summary.complied {
            reward += self.config.compliance_reward;
        }
        if summary.final_relationship > 0.0 {
            reward += self.config.positive_relationship_bonus;
        } else if summary.final_relationship < 0.0 {
            reward -= self.config.poor_relationship_penalty;
        }
        reward
    }
}

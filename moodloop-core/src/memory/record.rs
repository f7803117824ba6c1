//! Memory records — what the character remembers about an interaction.
//!
//! A [`Memory`] never changes after creation. How often it has been
//! recalled is tracked by the owning store in a separate table.

use serde::{Deserialize, Serialize};

use crate::types::{Emotion, MemoryId, ScenarioId, SimTimestamp};

/// What kind of moment a memory captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryKind {
    /// The player promised something.
    Promise,
    /// The player went back on a promise.
    BrokenPromise,
    /// The player used the same approach in the same scenario again.
    RepeatedAction,
    /// A moment that felt good.
    PositiveMoment,
    /// A broken promise from someone the character was close to.
    Betrayal,
    /// The character did what was asked.
    Achievement,
    /// The player laid down the law.
    Punishment,
    /// The player offered something in return.
    Reward,
    /// An unremarkable exchange.
    Conversation,
    /// The character lost its temper.
    EmotionalOutburst,
}

impl MemoryKind {
    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Promise => "promise",
            Self::BrokenPromise => "broken_promise",
            Self::RepeatedAction => "repeated_action",
            Self::PositiveMoment => "positive_moment",
            Self::Betrayal => "betrayal",
            Self::Achievement => "achievement",
            Self::Punishment => "punishment",
            Self::Reward => "reward",
            Self::Conversation => "conversation",
            Self::EmotionalOutburst => "emotional_outburst",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a caller supplies to record a memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDraft {
    /// Kind of moment.
    pub kind: MemoryKind,
    /// Free-text description.
    pub content: String,
    /// Emotional weight, clamped to [-1, 1].
    pub emotional_weight: f32,
    /// Scenario it happened in.
    pub scenario: ScenarioId,
    /// Emotion the character had at the time.
    pub emotion: Emotion,
    /// Relationship level at the time.
    pub relationship: f32,
}

/// A single remembered interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Store-local identifier.
    pub id: MemoryId,
    /// Kind of moment.
    pub kind: MemoryKind,
    /// Free-text description.
    pub content: String,
    /// How this felt (-1.0 to +1.0).
    pub emotional_weight: f32,
    /// When it happened (sim time).
    pub created_at: SimTimestamp,
    /// Set once at creation when |weight| exceeds the importance threshold.
    pub is_important: bool,
    /// Scenario at creation.
    pub scenario: ScenarioId,
    /// Emotion at creation.
    pub emotion: Emotion,
    /// Relationship at creation.
    pub relationship: f32,
}

impl Memory {
    /// Finalise a draft. All fields are set here, before the store makes
    /// the memory visible to retrieval.
    #[must_use]
    pub fn from_draft(
        id: MemoryId,
        draft: MemoryDraft,
        created_at: SimTimestamp,
        importance_threshold: f32,
    ) -> Self {
        let weight = if draft.emotional_weight.is_finite() {
            draft.emotional_weight.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            id,
            kind: draft.kind,
            content: draft.content,
            emotional_weight: weight,
            created_at,
            is_important: weight.abs() > importance_threshold,
            scenario: draft.scenario,
            emotion: draft.emotion,
            relationship: if draft.relationship.is_finite() {
                draft.relationship.clamp(-100.0, 100.0)
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(weight: f32) -> MemoryDraft {
        MemoryDraft {
            kind: MemoryKind::Conversation,
            content: "talked about the dishes".into(),
            emotional_weight: weight,
            scenario: ScenarioId::FamilyDinner,
            emotion: Emotion::Neutral,
            relationship: 250.0,
        }
    }

    #[test]
    fn importance_is_strictly_above_threshold() {
        let at = SimTimestamp::now(0);
        assert!(!Memory::from_draft(MemoryId(0), draft(0.7), at, 0.7).is_important);
        assert!(Memory::from_draft(MemoryId(1), draft(-0.71), at, 0.7).is_important);
    }

    #[test]
    fn weight_and_relationship_are_clamped() {
        let m = Memory::from_draft(MemoryId(0), draft(-4.0), SimTimestamp::now(0), 0.7);
        assert_eq!(m.emotional_weight, -1.0);
        assert_eq!(m.relationship, 100.0);
    }
}

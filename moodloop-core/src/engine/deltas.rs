//! Per-action emotional deltas and per-turn memory classification.

use crate::memory::record::MemoryKind;
use crate::types::{PlayerAction, ResponseKind};

/// What one player action does to the character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionDeltas {
    /// Relationship change.
    pub relationship: f32,
    /// Mood change (before situational amplification).
    pub mood: f32,
    /// Respect-received change.
    pub respect: f32,
    /// Stress change.
    pub stress: f32,
    /// Whether the approach counts as respectful (drives trust).
    pub respectful: bool,
}

const fn deltas(relationship: f32, mood: f32, respect: f32, stress: f32, respectful: bool) -> ActionDeltas {
    ActionDeltas {
        relationship,
        mood,
        respect,
        stress,
        respectful,
    }
}

/// The fixed delta table.
#[must_use]
pub fn deltas_for(action: PlayerAction) -> ActionDeltas {
    match action {
        PlayerAction::Authoritarian => deltas(-5.0, -10.0, -8.0, 10.0, false),
        PlayerAction::Empathetic => deltas(8.0, 6.0, 10.0, -5.0, true),
        PlayerAction::Logical => deltas(2.0, 2.0, 5.0, 0.0, true),
        PlayerAction::Bribe => deltas(3.0, 5.0, -2.0, -2.0, false),
        PlayerAction::GuiltTrip => deltas(-6.0, -8.0, -6.0, 8.0, false),
        PlayerAction::Humor => deltas(5.0, 7.0, 3.0, -4.0, true),
        PlayerAction::Listen => deltas(10.0, 8.0, 12.0, -6.0, true),
    }
}

/// Tired or hungry characters take bad news harder: a negative mood delta
/// is scaled by `1 + (tiredness + hunger) / 400`. Positive deltas pass through.
#[must_use]
pub fn amplify_mood_delta(mood_delta: f32, tiredness: f32, hunger: f32) -> f32 {
    if mood_delta < 0.0 {
        mood_delta * (1.0 + (tiredness + hunger) / 400.0)
    } else {
        mood_delta
    }
}

/// Most negative weight an outburst may carry.
const OUTBURST_WEIGHT_CAP: f32 = -0.8;

/// What kind of memory a turn leaves behind. First match wins.
#[must_use]
pub fn turn_memory_kind(
    action: PlayerAction,
    response: ResponseKind,
    pattern_count: u32,
    repeated_threshold: u32,
    mood_delta: f32,
) -> MemoryKind {
    if response == ResponseKind::Angry {
        MemoryKind::EmotionalOutburst
    } else if pattern_count >= repeated_threshold {
        MemoryKind::RepeatedAction
    } else if action == PlayerAction::Authoritarian {
        MemoryKind::Punishment
    } else if action == PlayerAction::Bribe {
        MemoryKind::Reward
    } else if response == ResponseKind::Compliant {
        MemoryKind::Achievement
    } else if mood_delta > 0.0 {
        MemoryKind::PositiveMoment
    } else {
        MemoryKind::Conversation
    }
}

/// Emotional weight of a turn: `clamp(moodΔ/20 + relationshipΔ/40, −1, 1)`,
/// with outbursts capped at −0.8.
#[must_use]
pub fn turn_memory_weight(kind: MemoryKind, mood_delta: f32, relationship_delta: f32) -> f32 {
    let weight = (mood_delta / 20.0 + relationship_delta / 40.0).clamp(-1.0, 1.0);
    if kind == MemoryKind::EmotionalOutburst {
        weight.min(OUTBURST_WEIGHT_CAP)
    } else {
        weight
    }
}

// ---------------------------------------------------------------------------
// Promises
// ---------------------------------------------------------------------------

/// Relationship above which a broken promise is remembered as a betrayal.
pub const BETRAYAL_RELATIONSHIP: f32 = 30.0;

/// Weight of a promise memory.
pub const PROMISE_WEIGHT: f32 = 0.4;

/// What breaking a promise costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrokenPromiseCost {
    /// Memory kind left behind.
    pub kind: MemoryKind,
    /// Its emotional weight.
    pub weight: f32,
    /// Trust change.
    pub trust: f32,
    /// Relationship change.
    pub relationship: f32,
}

/// Cost of breaking a promise at the given relationship level.
#[must_use]
pub fn broken_promise_cost(relationship: f32) -> BrokenPromiseCost {
    if relationship > BETRAYAL_RELATIONSHIP {
        BrokenPromiseCost {
            kind: MemoryKind::Betrayal,
            weight: -0.9,
            trust: -20.0,
            relationship: -15.0,
        }
    } else {
        BrokenPromiseCost {
            kind: MemoryKind::BrokenPromise,
            weight: -0.6,
            trust: -10.0,
            relationship: -5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respectful_actions_match_table() {
        let respectful: Vec<_> = PlayerAction::ALL
            .into_iter()
            .filter(|a| deltas_for(*a).respectful)
            .collect();
        assert_eq!(
            respectful,
            vec![
                PlayerAction::Empathetic,
                PlayerAction::Logical,
                PlayerAction::Humor,
                PlayerAction::Listen
            ]
        );
    }

    #[test]
    fn amplification_only_hits_negative_deltas() {
        assert!((amplify_mood_delta(-10.0, 100.0, 100.0) + 15.0).abs() < 1e-6);
        assert_eq!(amplify_mood_delta(8.0, 100.0, 100.0), 8.0);
        assert_eq!(amplify_mood_delta(-10.0, 0.0, 0.0), -10.0);
    }

    #[test]
    fn memory_kind_precedence() {
        use PlayerAction as A;
        use ResponseKind as R;
        assert_eq!(turn_memory_kind(A::Listen, R::Angry, 9, 3, 5.0), MemoryKind::EmotionalOutburst);
        assert_eq!(turn_memory_kind(A::Authoritarian, R::Sarcastic, 3, 3, -5.0), MemoryKind::RepeatedAction);
        assert_eq!(turn_memory_kind(A::Authoritarian, R::Compliant, 1, 3, -5.0), MemoryKind::Punishment);
        assert_eq!(turn_memory_kind(A::Bribe, R::Compliant, 1, 3, 5.0), MemoryKind::Reward);
        assert_eq!(turn_memory_kind(A::Logical, R::Compliant, 1, 3, 0.0), MemoryKind::Achievement);
        assert_eq!(turn_memory_kind(A::Humor, R::Dismissive, 1, 3, 7.0), MemoryKind::PositiveMoment);
        assert_eq!(turn_memory_kind(A::Humor, R::Dismissive, 1, 3, 0.0), MemoryKind::Conversation);
    }

    #[test]
    fn outburst_weight_is_capped() {
        assert!((turn_memory_weight(MemoryKind::EmotionalOutburst, 5.0, 0.0) + 0.8).abs() < 1e-6);
        assert!((turn_memory_weight(MemoryKind::Conversation, 8.0, 10.0) - 0.65).abs() < 1e-6);
        assert_eq!(turn_memory_weight(MemoryKind::Punishment, -40.0, -40.0), -1.0);
    }

    #[test]
    fn betrayal_needs_a_close_relationship() {
        assert_eq!(broken_promise_cost(30.0).kind, MemoryKind::BrokenPromise);
        assert_eq!(broken_promise_cost(31.0).kind, MemoryKind::Betrayal);
    }
}

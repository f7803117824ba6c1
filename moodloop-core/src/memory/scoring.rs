//! Per-factor relevance scoring for memory retrieval.
//!
//! ```text
//! score = 0.3 · [same scenario]
//!       + recent_bias · e^(−days_since · decay)
//!       + emotional_bias · |weight|
//!       + 0.1 · times_recalled
//!       + 0.2 · [same emotion]
//! ```

use crate::config::MemoryConfig;
use crate::memory::record::Memory;
use crate::types::{Emotion, ScenarioId, SimTimestamp};

const SCENARIO_MATCH: f32 = 0.3;
const RECALL_WEIGHT: f32 = 0.1;
const EMOTION_MATCH: f32 = 0.2;

/// Weights for the tunable terms of the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceWeights {
    /// Weight of the recency term.
    pub recent_bias: f32,
    /// Weight of emotional intensity.
    pub emotional_bias: f32,
    /// Recency decay constant per simulated day.
    pub decay_per_day: f32,
}

impl RelevanceWeights {
    /// Weights from memory configuration.
    #[must_use]
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            recent_bias: config.recent_bias,
            emotional_bias: config.emotional_bias,
            decay_per_day: config.recency_decay_per_day,
        }
    }
}

/// What the character is currently looking for.
#[derive(Debug, Clone, Copy)]
pub struct RecallContext {
    /// Active scenario.
    pub scenario: ScenarioId,
    /// Current emotion.
    pub emotion: Emotion,
    /// Current sim time.
    pub now: SimTimestamp,
}

/// Breakdown of a relevance score into its terms (useful for debugging).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    /// Scenario match term.
    pub scenario: f32,
    /// Recency term.
    pub recency: f32,
    /// Emotional intensity term.
    pub emotional: f32,
    /// Recall frequency term.
    pub recall: f32,
    /// Emotion match term.
    pub emotion: f32,
}

impl ScoreBreakdown {
    /// Sum of all terms.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.scenario + self.recency + self.emotional + self.recall + self.emotion
    }
}

/// Compute the full score breakdown for a single memory.
#[must_use]
pub fn compute_breakdown(
    memory: &Memory,
    times_recalled: u32,
    context: &RecallContext,
    weights: &RelevanceWeights,
) -> ScoreBreakdown {
    ScoreBreakdown {
        scenario: if memory.scenario == context.scenario { SCENARIO_MATCH } else { 0.0 },
        recency: weights.recent_bias * recency_factor(memory, &context.now, weights.decay_per_day),
        emotional: weights.emotional_bias * memory.emotional_weight.abs(),
        recall: RECALL_WEIGHT * times_recalled as f32,
        emotion: if memory.emotion == context.emotion { EMOTION_MATCH } else { 0.0 },
    }
}

/// `e^(−days_since · decay)`, 1.0 for a memory created right now.
fn recency_factor(memory: &Memory, now: &SimTimestamp, decay_per_day: f32) -> f32 {
    let days = now.days_since(&memory.created_at);
    (-days * f64::from(decay_per_day)).exp() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::{MemoryDraft, MemoryKind};
    use crate::types::MemoryId;

    const DAY_MS: u64 = 86_400_000;

    fn memory(weight: f32, scenario: ScenarioId, emotion: Emotion) -> Memory {
        Memory::from_draft(
            MemoryId(0),
            MemoryDraft {
                kind: MemoryKind::Conversation,
                content: String::new(),
                emotional_weight: weight,
                scenario,
                emotion,
                relationship: 0.0,
            },
            SimTimestamp::now(0),
            0.7,
        )
    }

    fn weights() -> RelevanceWeights {
        RelevanceWeights::from_config(&MemoryConfig::default())
    }

    #[test]
    fn fresh_exact_match_scores_every_term() {
        let m = memory(-0.5, ScenarioId::Bedtime, Emotion::Sad);
        let ctx = RecallContext {
            scenario: ScenarioId::Bedtime,
            emotion: Emotion::Sad,
            now: SimTimestamp::now(0),
        };
        let b = compute_breakdown(&m, 2, &ctx, &weights());
        assert!((b.scenario - 0.3).abs() < 1e-6);
        assert!((b.recency - 0.2).abs() < 1e-6);
        assert!((b.emotional - 0.15).abs() < 1e-6);
        assert!((b.recall - 0.2).abs() < 1e-6);
        assert!((b.emotion - 0.2).abs() < 1e-6);
        assert!((b.total() - 1.05).abs() < 1e-5);
    }

    #[test]
    fn recency_decays_over_days() {
        let m = memory(0.0, ScenarioId::Bedtime, Emotion::Neutral);
        let at = |days: u64| RecallContext {
            scenario: ScenarioId::CleanRoom,
            emotion: Emotion::Happy,
            now: SimTimestamp::now(days * DAY_MS),
        };
        let r1 = compute_breakdown(&m, 0, &at(1), &weights()).recency;
        let r10 = compute_breakdown(&m, 0, &at(10), &weights()).recency;
        assert!(r1 > r10);
        assert!((r10 - 0.2 * (-1.0_f32).exp()).abs() < 1e-5);
    }
}

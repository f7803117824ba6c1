//! Pattern memory — how the character feels about the player's habits.
//!
//! One entry per `(action, scenario)` pair with a running count and an
//! incrementally averaged emotional impact.

use serde::{Deserialize, Serialize};

use crate::types::{PlayerAction, ScenarioId};

/// Running statistics for one `(action, scenario)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternMemory {
    /// The player's approach.
    pub action: PlayerAction,
    /// Where it was used.
    pub scenario: ScenarioId,
    /// How many times it has been seen.
    pub count: u32,
    /// Mean emotional weight over those times.
    pub mean_weight: f32,
}

impl PatternMemory {
    /// First sighting.
    #[must_use]
    pub fn new(action: PlayerAction, scenario: ScenarioId, weight: f32) -> Self {
        Self {
            action,
            scenario,
            count: 1,
            mean_weight: weight,
        }
    }

    /// Fold in another sighting: `mean' = (mean·(n−1) + weight) / n` with
    /// `n` the post-increment count.
    pub fn observe(&mut self, weight: f32) {
        self.count = self.count.saturating_add(1);
        let n = self.count as f32;
        self.mean_weight = (self.mean_weight * (n - 1.0) + weight) / n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_mean_matches_batch_mean() {
        let weights = [0.5, -0.25, 1.0, 0.0];
        let mut p = PatternMemory::new(PlayerAction::Bribe, ScenarioId::CleanRoom, weights[0]);
        for w in &weights[1..] {
            p.observe(*w);
        }
        assert_eq!(p.count, 4);
        assert!((p.mean_weight - 0.3125).abs() < 1e-6);
    }
}

//! Fixed-width observation vector for external learned policies.
//!
//! ```text
//! [ 0..11) emotional state   (see EmotionalState::to_observation_vector)
//! [11..19) memory statistics (see MemoryStore::observation_vector)
//! [19..25) scenario one-hot  (ScenarioId::index)
//! [25..32) last action one-hot (PlayerAction::index, all zero before the first turn)
//! ```

use crate::emotion::{EmotionalState, STATE_OBSERVATION_LEN};
use crate::memory::{MEMORY_OBSERVATION_LEN, MemoryStore};
use crate::types::{PlayerAction, ScenarioId, SimTimestamp};

const SCENARIO_OFFSET: usize = STATE_OBSERVATION_LEN + MEMORY_OBSERVATION_LEN;
const ACTION_OFFSET: usize = SCENARIO_OFFSET + ScenarioId::ALL.len();

/// Total width of an [`ObservationVector`].
pub const OBSERVATION_LEN: usize = ACTION_OFFSET + PlayerAction::ALL.len();

/// The assembled vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationVector(pub [f32; OBSERVATION_LEN]);

impl ObservationVector {
    /// Assemble from the character's state and memory.
    #[must_use]
    pub fn assemble(
        state: &EmotionalState,
        memory: &MemoryStore,
        scenario: ScenarioId,
        last_action: Option<PlayerAction>,
        now: &SimTimestamp,
    ) -> Self {
        let mut v = [0.0; OBSERVATION_LEN];
        v[..STATE_OBSERVATION_LEN].copy_from_slice(&state.to_observation_vector());
        v[STATE_OBSERVATION_LEN..SCENARIO_OFFSET].copy_from_slice(&memory.observation_vector(now));
        v[SCENARIO_OFFSET + scenario.index()] = 1.0;
        if let Some(action) = last_action {
            v[ACTION_OFFSET + action.index()] = 1.0;
        }
        Self(v)
    }

    /// View as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

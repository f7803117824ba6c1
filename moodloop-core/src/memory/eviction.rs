//! Short-term → long-term eviction rules.
//!
//! ```text
//! ┌──────────────┐ evict oldest ┌──────────────┐ evict weakest ┌──────────┐
//! │ Short-term   │─────────────▶│ Long-term    │──────────────▶│ Forgotten│
//! │ ring (N₁)    │  important   │ store (N₂)   │ (recalls,|w|) │          │
//! └──────────────┘  or recalled └──────────────┘               └──────────┘
//!         │ otherwise
//!         └──────────────────────────────────────────────────────▶ Forgotten
//! ```

use ordered_float::OrderedFloat;

use crate::memory::record::Memory;

/// Ordering key for long-term retention. **Lower** keys are evicted first.
pub type RetentionKey = (u32, OrderedFloat<f32>);

/// Retention key for a memory: `(times_recalled, |weight|)`.
#[must_use]
pub fn retention_key(memory: &Memory, times_recalled: u32) -> RetentionKey {
    (times_recalled, OrderedFloat(memory.emotional_weight.abs()))
}

/// Whether a memory leaving the short-term ring moves to long-term storage
/// instead of being forgotten.
#[must_use]
pub fn should_promote(memory: &Memory, times_recalled: u32, recall_threshold: u32) -> bool {
    memory.is_important || times_recalled > recall_threshold
}

/// Index of the entry to drop from an over-full long-term store. Ties go to
/// the oldest entry (the first one in `keys`).
#[must_use]
pub fn weakest_index(keys: impl IntoIterator<Item = RetentionKey>) -> Option<usize> {
    let mut weakest: Option<(usize, RetentionKey)> = None;
    for (i, key) in keys.into_iter().enumerate() {
        match weakest {
            Some((_, w)) if key >= w => {}
            _ => weakest = Some((i, key)),
        }
    }
    weakest.map(|(i, _)| i)
}

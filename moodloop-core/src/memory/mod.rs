//! Memory store — what a character remembers about the player.
//!
//! Memories live in an id-keyed arena. The short-term ring and the
//! long-term store hold ids into it, and recall counts are kept in a
//! parallel table so the records themselves stay immutable.
//!
//! ```text
//! record() ─▶ short-term ring (N₁) ─evict─▶ long-term store (N₂) ─evict─▶ ∅
//!                      └──── relevant_memory() scans both, oldest first
//! ```
//!
//! [`MemoryStore::relevant_memory`] has a write side effect: a successful
//! retrieval bumps the recall count of the returned memory, which in turn
//! makes it more likely to be promoted and retained.

pub mod eviction;
pub mod pattern;
pub mod record;
pub mod scoring;

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::MemoryConfig;
use crate::error::MoodloopError;
use crate::types::{MemoryId, PlayerAction, ScenarioId, SimTimestamp};

use self::eviction::{retention_key, should_promote, weakest_index};
use self::pattern::PatternMemory;
use self::record::{Memory, MemoryDraft, MemoryKind};
use self::scoring::{RecallContext, RelevanceWeights, compute_breakdown};

/// Width of the vector returned by [`MemoryStore::observation_vector`].
pub const MEMORY_OBSERVATION_LEN: usize = 8;

/// A memory handed back by [`MemoryStore::relevant_memory`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecalledMemory {
    /// The memory itself.
    pub memory: Memory,
    /// Recall count after this retrieval.
    pub times_recalled: u32,
    /// Relevance score it won with.
    pub score: f32,
}

/// Bounded short/long-term memory with relevance-scored retrieval and
/// per-`(action, scenario)` pattern statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MemorySnapshot", into = "MemorySnapshot")]
pub struct MemoryStore {
    config: MemoryConfig,
    next_id: u64,
    arena: BTreeMap<MemoryId, Memory>,
    recalls: BTreeMap<MemoryId, u32>,
    short_term: VecDeque<MemoryId>,
    long_term: Vec<MemoryId>,
    patterns: BTreeMap<(PlayerAction, ScenarioId), PatternMemory>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl MemoryStore {
    /// Empty store with the given capacities and scoring weights.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            next_id: 0,
            arena: BTreeMap::new(),
            recalls: BTreeMap::new(),
            short_term: VecDeque::new(),
            long_term: Vec::new(),
            patterns: BTreeMap::new(),
        }
    }

    /// Configuration the store was built with.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Record a memory. The record is fully built before it is inserted, so
    /// retrieval never sees a half-written memory.
    pub fn record(&mut self, draft: MemoryDraft, now: SimTimestamp) -> MemoryId {
        let id = MemoryId(self.next_id);
        self.next_id += 1;

        let memory = Memory::from_draft(id, draft, now, self.config.importance_threshold);
        tracing::trace!(
            memory = %id,
            kind = %memory.kind,
            weight = memory.emotional_weight,
            important = memory.is_important,
            "memory recorded"
        );
        self.arena.insert(id, memory);
        self.recalls.insert(id, 0);
        self.short_term.push_back(id);

        self.enforce_bounds();
        id
    }

    fn enforce_bounds(&mut self) {
        while self.short_term.len() > self.config.short_term_capacity {
            let Some(oldest) = self.short_term.pop_front() else {
                break;
            };
            let promote = self.arena.get(&oldest).is_some_and(|m| {
                should_promote(m, self.recall_count(oldest), self.config.promote_recall_threshold)
            });
            if promote {
                self.long_term.push(oldest);
            } else {
                self.forget(oldest);
            }
        }

        while self.long_term.len() > self.config.long_term_capacity {
            let keys = self.long_term.iter().map(|id| {
                self.arena
                    .get(id)
                    .map_or_else(Default::default, |m| retention_key(m, self.recall_count(*id)))
            });
            let Some(index) = weakest_index(keys) else {
                break;
            };
            let evicted = self.long_term.remove(index);
            self.forget(evicted);
        }
    }

    fn forget(&mut self, id: MemoryId) {
        self.arena.remove(&id);
        self.recalls.remove(&id);
        tracing::trace!(memory = %id, "memory forgotten");
    }

    /// Count another use of `action` in `scenario`, folding `weight` into the
    /// running mean. Returns the post-increment count.
    pub fn record_pattern(&mut self, action: PlayerAction, scenario: ScenarioId, weight: f32) -> u32 {
        let weight = if weight.is_finite() { weight } else { 0.0 };
        let entry = self
            .patterns
            .entry((action, scenario))
            .and_modify(|p| p.observe(weight))
            .or_insert_with(|| PatternMemory::new(action, scenario, weight));
        entry.count
    }

    /// Drop every memory and pattern and restart ids from zero.
    pub fn clear(&mut self) {
        *self = Self::new(self.config.clone());
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// Highest-scoring memory for `context`, without touching recall counts.
    ///
    /// Scans short-term oldest→newest, then long-term. Ties go to the first
    /// memory scanned. The threshold is not applied here.
    #[must_use]
    pub fn best_match(&self, context: &RecallContext) -> Option<(MemoryId, f32)> {
        let weights = RelevanceWeights::from_config(&self.config);
        let mut best: Option<(MemoryId, f32)> = None;
        for id in self.scan_order() {
            let Some(memory) = self.arena.get(&id) else {
                continue;
            };
            let score = compute_breakdown(memory, self.recall_count(id), context, &weights).total();
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((id, score));
            }
        }
        best
    }

    /// The most relevant memory if its score exceeds the relevance threshold.
    ///
    /// **Side effect:** a successful retrieval increments the returned
    /// memory's recall count.
    pub fn relevant_memory(&mut self, context: &RecallContext) -> Option<RecalledMemory> {
        let (id, score) = self.best_match(context)?;
        if score <= self.config.relevance_threshold {
            return None;
        }
        let memory = self.arena.get(&id)?.clone();
        let count = self.recalls.entry(id).or_insert(0);
        *count = count.saturating_add(1);
        tracing::debug!(memory = %id, kind = %memory.kind, score, times_recalled = *count, "memory recalled");
        Some(RecalledMemory {
            memory,
            times_recalled: *count,
            score,
        })
    }

    fn scan_order(&self) -> impl Iterator<Item = MemoryId> + '_ {
        self.short_term.iter().chain(self.long_term.iter()).copied()
    }

    fn recall_count(&self, id: MemoryId) -> u32 {
        self.recalls.get(&id).copied().unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Short-term memories, oldest first.
    pub fn short_term(&self) -> impl Iterator<Item = &Memory> + '_ {
        self.short_term.iter().filter_map(|id| self.arena.get(id))
    }

    /// Long-term memories in promotion order.
    pub fn long_term(&self) -> impl Iterator<Item = &Memory> + '_ {
        self.long_term.iter().filter_map(|id| self.arena.get(id))
    }

    /// Look a memory up by id.
    #[must_use]
    pub fn get(&self, id: MemoryId) -> Option<&Memory> {
        self.arena.get(&id)
    }

    /// Recall count for a stored memory.
    #[must_use]
    pub fn times_recalled(&self, id: MemoryId) -> Option<u32> {
        self.recalls.get(&id).copied()
    }

    /// Pattern statistics for one `(action, scenario)` pair.
    #[must_use]
    pub fn pattern(&self, action: PlayerAction, scenario: ScenarioId) -> Option<&PatternMemory> {
        self.patterns.get(&(action, scenario))
    }

    /// All pattern statistics.
    pub fn patterns(&self) -> impl Iterator<Item = &PatternMemory> + '_ {
        self.patterns.values()
    }

    /// Number of memories in the short-term ring.
    #[must_use]
    pub fn short_term_len(&self) -> usize {
        self.short_term.len()
    }

    /// Number of memories in the long-term store.
    #[must_use]
    pub fn long_term_len(&self) -> usize {
        self.long_term.len()
    }

    /// Total stored memories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.short_term.len() + self.long_term.len()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Eight aggregate statistics for an external learner, in this order:
    ///
    /// | slot | value |
    /// |------|-------|
    /// | 0 | mean weight of the newest `recent_window` short-term memories |
    /// | 1 | broken promises (incl. betrayals) / 5, capped at 1 |
    /// | 2 | positive moments / 10, capped at 1 |
    /// | 3 | punishments / 10, capped at 1 |
    /// | 4 | predictability: largest pattern count / total pattern count |
    /// | 5 | load: stored memories / (N₁ + N₂) |
    /// | 6 | most-recalled memory: 1 if important else \|weight\| |
    /// | 7 | days since the last positive moment / 30, capped at 1 (1 if none) |
    #[must_use]
    pub fn observation_vector(&self, now: &SimTimestamp) -> [f32; MEMORY_OBSERVATION_LEN] {
        let window = self.config.recent_window.min(self.short_term.len());
        let mean_recent = if window == 0 {
            0.0
        } else {
            let sum: f32 = self
                .short_term
                .iter()
                .rev()
                .take(window)
                .filter_map(|id| self.arena.get(id))
                .map(|m| m.emotional_weight)
                .sum();
            sum / window as f32
        };

        let count_kind = |pred: fn(MemoryKind) -> bool| {
            self.scan_order()
                .filter_map(|id| self.arena.get(&id))
                .filter(|m| pred(m.kind))
                .count() as f32
        };
        let broken = count_kind(|k| matches!(k, MemoryKind::BrokenPromise | MemoryKind::Betrayal));
        let positive = count_kind(|k| k == MemoryKind::PositiveMoment);
        let punishments = count_kind(|k| k == MemoryKind::Punishment);

        let total_patterns: u64 = self.patterns.values().map(|p| u64::from(p.count)).sum();
        let predictability = self
            .patterns
            .values()
            .map(|p| p.count)
            .max()
            .filter(|_| total_patterns > 0)
            .map_or(0.0, |max| max as f32 / total_patterns as f32);

        let capacity = self.config.short_term_capacity + self.config.long_term_capacity;
        let load = if capacity == 0 {
            0.0
        } else {
            self.len() as f32 / capacity as f32
        };

        let mut most_recalled: Option<(u32, &Memory)> = None;
        for id in self.scan_order() {
            let Some(memory) = self.arena.get(&id) else {
                continue;
            };
            let recalls = self.recall_count(id);
            if most_recalled.is_none_or(|(best, _)| recalls > best) {
                most_recalled = Some((recalls, memory));
            }
        }
        let recalled_importance = most_recalled.map_or(0.0, |(_, m)| {
            if m.is_important {
                1.0
            } else {
                m.emotional_weight.abs()
            }
        });

        let last_positive = self
            .scan_order()
            .filter_map(|id| self.arena.get(&id))
            .filter(|m| m.kind == MemoryKind::PositiveMoment)
            .max_by_key(|m| m.created_at.millis);
        let since_positive = last_positive.map_or(1.0, |m| {
            ((now.days_since(&m.created_at) / 30.0) as f32).min(1.0)
        });

        [
            mean_recent,
            (broken / 5.0).min(1.0),
            (positive / 10.0).min(1.0),
            (punishments / 10.0).min(1.0),
            predictability,
            load,
            recalled_importance,
            since_positive,
        ]
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Capture the full contents as a plain value.
    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot {
        let stored = |id: &MemoryId| {
            self.arena.get(id).map(|m| StoredMemory {
                memory: m.clone(),
                times_recalled: self.recall_count(*id),
            })
        };
        MemorySnapshot {
            config: self.config.clone(),
            next_id: self.next_id,
            short_term: self.short_term.iter().filter_map(stored).collect(),
            long_term: self.long_term.iter().filter_map(stored).collect(),
            patterns: self.patterns.values().copied().collect(),
        }
    }

    /// Replace the contents with a snapshot's. The store keeps its own
    /// configuration and trims the restored contents to its capacities.
    ///
    /// # Errors
    ///
    /// Returns [`MoodloopError::InvalidSnapshot`] if the snapshot holds
    /// duplicate ids or ids at or above its `next_id`. The store is left
    /// untouched in that case.
    pub fn restore(&mut self, snapshot: MemorySnapshot) -> crate::error::Result<()> {
        let config = self.config.clone();
        let mut restored = Self::try_from(snapshot)?;
        restored.config = config;
        restored.enforce_bounds();
        *self = restored;
        Ok(())
    }
}

/// A memory together with its recall count, as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMemory {
    /// The record.
    pub memory: Memory,
    /// Times it has been recalled.
    pub times_recalled: u32,
}

/// Serialisable value form of a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Capacities and scoring weights.
    #[serde(default)]
    pub config: MemoryConfig,
    /// Next id to hand out.
    pub next_id: u64,
    /// Short-term ring, oldest first.
    pub short_term: Vec<StoredMemory>,
    /// Long-term store in promotion order.
    pub long_term: Vec<StoredMemory>,
    /// Pattern statistics.
    #[serde(default)]
    pub patterns: Vec<PatternMemory>,
}

impl From<MemoryStore> for MemorySnapshot {
    fn from(store: MemoryStore) -> Self {
        store.snapshot()
    }
}

impl TryFrom<MemorySnapshot> for MemoryStore {
    type Error = MoodloopError;

    fn try_from(snapshot: MemorySnapshot) -> Result<Self, Self::Error> {
        let next_id = snapshot.next_id;
        let mut store = Self::new(snapshot.config);
        store.next_id = next_id;

        let insert = |entry: StoredMemory, store: &mut Self| -> Result<MemoryId, MoodloopError> {
            let id = entry.memory.id;
            if id.0 >= next_id {
                return Err(MoodloopError::InvalidSnapshot(format!(
                    "memory {id} is not below next_id {next_id}"
                )));
            }
            if store.arena.insert(id, entry.memory).is_some() {
                return Err(MoodloopError::InvalidSnapshot(format!("duplicate memory {id}")));
            }
            store.recalls.insert(id, entry.times_recalled);
            Ok(id)
        };

        for entry in snapshot.short_term {
            let id = insert(entry, &mut store)?;
            store.short_term.push_back(id);
        }
        for entry in snapshot.long_term {
            let id = insert(entry, &mut store)?;
            store.long_term.push(id);
        }
        for pattern in snapshot.patterns {
            store.patterns.insert((pattern.action, pattern.scenario), pattern);
        }
        Ok(store)
    }
}

//! Configuration for the moodloop simulation.
//!
//! Maps directly to `moodloop.toml`. Every section and field has a default,
//! so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodloopConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Emotional model tuning.
    #[serde(default)]
    pub emotion: EmotionConfig,
    /// Memory capacities and relevance scoring.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Conversation pacing.
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Which response policy drives the character.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Reward shaping (training mode only).
    #[serde(default)]
    pub reward: RewardConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Out-of-band speech request settings.
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl MoodloopConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MoodloopError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::MoodloopError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Emotional model tuning and the levels a fresh character starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionConfig {
    /// Starting relationship (-100..100).
    #[serde(default)]
    pub initial_relationship: f32,
    /// Starting mood (-100..100).
    #[serde(default)]
    pub initial_mood: f32,
    /// Starting trust (0..100).
    #[serde(default = "default_50")]
    pub initial_trust: f32,
    /// Starting stress (0..100).
    #[serde(default = "default_30")]
    pub initial_stress: f32,
    /// Starting autonomy need (0..100). Trait-like, usually high.
    #[serde(default = "default_80")]
    pub initial_autonomy_need: f32,
    /// Starting respect received (0..100).
    #[serde(default = "default_50")]
    pub initial_respect: f32,
    /// Mood points relaxed toward zero per simulated second.
    #[serde(default = "default_2_0")]
    pub mood_decay_per_second: f32,
    /// Stress never decays below this value.
    #[serde(default = "default_10")]
    pub stress_floor: f32,
    /// Trust gained from a respectful interaction.
    #[serde(default = "default_2_0")]
    pub trust_gain_respectful: f32,
    /// Trust lost from a disrespectful interaction.
    #[serde(default = "default_5_0")]
    pub trust_loss_disrespectful: f32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            initial_relationship: 0.0,
            initial_mood: 0.0,
            initial_trust: 50.0,
            initial_stress: 30.0,
            initial_autonomy_need: 80.0,
            initial_respect: 50.0,
            mood_decay_per_second: 2.0,
            stress_floor: 10.0,
            trust_gain_respectful: 2.0,
            trust_loss_disrespectful: 5.0,
        }
    }
}

/// Memory capacities and relevance-scoring weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Short-term ring buffer bound (N₁).
    #[serde(default = "default_20_usize")]
    pub short_term_capacity: usize,
    /// Long-term store bound (N₂).
    #[serde(default = "default_50_usize")]
    pub long_term_capacity: usize,
    /// Memories with |weight| above this are flagged important at creation.
    #[serde(default = "default_0_7")]
    pub importance_threshold: f32,
    /// Evicted short-term memories recalled more than this many times are promoted.
    #[serde(default = "default_2_u32")]
    pub promote_recall_threshold: u32,
    /// Weight of the recency term in the relevance score.
    #[serde(default = "default_0_2")]
    pub recent_bias: f32,
    /// Weight of |emotional weight| in the relevance score.
    #[serde(default = "default_0_3")]
    pub emotional_bias: f32,
    /// Exponential recency decay constant, per simulated day.
    #[serde(default = "default_0_1")]
    pub recency_decay_per_day: f32,
    /// A memory is only returned when its score exceeds this.
    #[serde(default = "default_0_3")]
    pub relevance_threshold: f32,
    /// How many of the newest short-term memories feed the mean-weight observation.
    #[serde(default = "default_5_usize")]
    pub recent_window: usize,
    /// Pattern count at which a turn is remembered as a repeated action.
    #[serde(default = "default_3_u32")]
    pub repeated_action_threshold: u32,
    /// Mood points a recalled memory adds per unit of its emotional weight.
    #[serde(default = "default_5_0")]
    pub memory_mood_influence: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_capacity: 20,
            long_term_capacity: 50,
            importance_threshold: 0.7,
            promote_recall_threshold: 2,
            recent_bias: 0.2,
            emotional_bias: 0.3,
            recency_decay_per_day: 0.1,
            relevance_threshold: 0.3,
            recent_window: 5,
            repeated_action_threshold: 3,
            memory_mood_influence: 5.0,
        }
    }
}

/// Conversation pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// A conversation ends after this many turns even without a terminal response.
    #[serde(default = "default_10_u32")]
    pub max_turns: u32,
    /// Scale negative mood deltas up when the character is tired or hungry.
    #[serde(default = "default_true")]
    pub situational_amplification: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: 10,
            situational_amplification: true,
        }
    }
}

/// Which policy variant picks responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Deterministic rule cascade.
    #[default]
    RuleBased,
    /// Externally supplied learned policy (falls back to rules when absent).
    Learned,
}

/// Policy selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Policy variant.
    #[serde(default)]
    pub mode: PolicyMode,
}

/// Reward-shaping constants. These were tuned for one training run and are
/// configuration, not invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Attach a reward model to the engine.
    #[serde(default)]
    pub enabled: bool,
    /// Per-turn bonus when the response fits the emotion.
    #[serde(default = "default_0_1")]
    pub consistency_bonus: f32,
    /// Per-turn penalty when it doesn't.
    #[serde(default = "default_0_05")]
    pub inconsistency_penalty: f32,
    /// End-of-episode bonus when the character complied.
    #[serde(default = "default_1_0")]
    pub compliance_reward: f32,
    /// End-of-episode bonus for a positive final relationship.
    #[serde(default = "default_0_5")]
    pub positive_relationship_bonus: f32,
    /// End-of-episode penalty for a negative final relationship.
    #[serde(default = "default_0_5")]
    pub poor_relationship_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            consistency_bonus: 0.1,
            inconsistency_penalty: 0.05,
            compliance_reward: 1.0,
            positive_relationship_bonus: 0.5,
            poor_relationship_penalty: 0.5,
        }
    }
}

/// On-disk encoding of memory snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    /// Human-readable JSON (debugging, hand edits).
    #[default]
    Json,
    /// MessagePack.
    Msgpack,
    /// Bincode.
    Bincode,
}

/// Persistence / save configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Snapshot encoding.
    #[serde(default)]
    pub format: SnapshotFormat,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Number of save backups to keep.
    #[serde(default = "default_3_u32")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            format: SnapshotFormat::Json,
            wal_mode: true,
            checksum_enabled: true,
            backup_count: 3,
        }
    }
}

/// Out-of-band speech request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Requests beyond this depth are dropped.
    #[serde(default = "default_32_usize")]
    pub max_queue_size: usize,
    /// A speech request not started within this many ms is discarded.
    #[serde(default = "default_3000")]
    pub speech_deadline_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 32,
            speech_deadline_ms: 3000,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_0_05() -> f32 { 0.05 }
fn default_0_1() -> f32 { 0.1 }
fn default_0_2() -> f32 { 0.2 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_7() -> f32 { 0.7 }
fn default_1_0() -> f32 { 1.0 }
fn default_2_0() -> f32 { 2.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_10() -> f32 { 10.0 }
fn default_30() -> f32 { 30.0 }
fn default_50() -> f32 { 50.0 }
fn default_80() -> f32 { 80.0 }
fn default_2_u32() -> u32 { 2 }
fn default_3_u32() -> u32 { 3 }
fn default_10_u32() -> u32 { 10 }
fn default_5_usize() -> usize { 5 }
fn default_20_usize() -> usize { 20 }
fn default_32_usize() -> usize { 32 }
fn default_50_usize() -> usize { 50 }
fn default_3000() -> u64 { 3000 }

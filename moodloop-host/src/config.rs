//! Host configuration: the core sections plus a `[host]` table.
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [memory]
//! short_term_capacity = 30
//!
//! [host]
//! character_name = "Maya"
//! tick_rate_hz = 10.0
//! autosave_every_turns = 5
//! save_path = "saves.db"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use moodloop_core::MoodloopConfig;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Everything a host reads from its config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Simulation settings (`[general]`, `[emotion]`, `[memory]`, ...).
    #[serde(flatten)]
    pub core: MoodloopConfig,
    /// Host-only settings.
    #[serde(default)]
    pub host: HostSection,
}

/// The `[host]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSection {
    /// Name given to a freshly created character.
    #[serde(default = "default_character_name")]
    pub character_name: String,
    /// Decay ticks per second.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f32,
    /// Save after this many turns. 0 disables autosave.
    #[serde(default)]
    pub autosave_every_turns: u32,
    /// Seed for dialogue wording; `None` picks one from entropy.
    #[serde(default)]
    pub dialogue_seed: Option<u64>,
    /// Save database. No saving when unset.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            character_name: default_character_name(),
            tick_rate_hz: default_tick_rate_hz(),
            autosave_every_turns: 0,
            dialogue_seed: None,
            save_path: None,
        }
    }
}

impl HostSection {
    /// Time between decay ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz))
    }
}

impl HostConfig {
    /// Parse and validate a TOML string.
    ///
    /// # Errors
    /// Returns [`HostError::Config`] if the TOML is invalid or a value is out
    /// of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| HostError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(moodloop_core::MoodloopError::from)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        let hz = self.host.tick_rate_hz;
        if !hz.is_finite() || hz <= 0.0 || hz > 1000.0 {
            return Err(HostError::Config(format!("tick_rate_hz must be in (0, 1000], got {hz}")));
        }
        if self.core.conversation.max_turns == 0 {
            return Err(HostError::Config("conversation.max_turns must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_character_name() -> String { "Maya".to_string() }
fn default_tick_rate_hz() -> f32 { 10.0 }

#[cfg(test)]
mod tests {
    use moodloop_core::config::SnapshotFormat;

    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = HostConfig::from_toml("").expect("parse");
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.host.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn core_sections_sit_beside_host_table() {
        let config = HostConfig::from_toml(
            r#"
            [memory]
            short_term_capacity = 30

            [persistence]
            format = "bincode"

            [host]
            character_name = "Theo"
            autosave_every_turns = 3
            dialogue_seed = 7
            "#,
        )
        .expect("parse");
        assert_eq!(config.core.memory.short_term_capacity, 30);
        assert_eq!(config.core.persistence.format, SnapshotFormat::Bincode);
        assert_eq!(config.host.character_name, "Theo");
        assert_eq!(config.host.autosave_every_turns, 3);
        assert_eq!(config.host.dialogue_seed, Some(7));
        assert!((config.host.tick_rate_hz - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_bad_tick_rate() {
        assert!(matches!(
            HostConfig::from_toml("[host]\ntick_rate_hz = 0.0"),
            Err(HostError::Config(_))
        ));
        assert!(HostConfig::from_toml("[host\n").is_err());
    }
}

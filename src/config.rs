//! Persistence configuration
//!
//! Loaded from the `[persistence]` table of a TOML file or built in code.
//! Every field has a default, so an empty table is a valid config.

use crate::constants::persistence::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_MAX_BACKOFF_TICKS, DEFAULT_MAX_QUEUE_SIZE,
    DEFAULT_SAVES_PER_TICK,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Distinct chunks the save queue holds before a forced drain
    pub max_queue_size: usize,
    /// Writes issued per tick at most
    pub saves_per_tick: usize,
    /// Optional wall-clock cap on one tick's drain, in milliseconds.
    /// At least one write is always attempted.
    pub tick_time_budget_ms: Option<u64>,
    /// Consecutive failed writes before saves pause; 0 disables backoff
    pub failure_threshold: u32,
    /// Longest pause, in ticks
    pub max_backoff_ticks: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            saves_per_tick: DEFAULT_SAVES_PER_TICK,
            tick_time_budget_ms: None,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            max_backoff_ticks: DEFAULT_MAX_BACKOFF_TICKS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    persistence: PersistenceConfig,
}

impl PersistenceConfig {
    /// Parse the `[persistence]` table of a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text).context("PersistenceConfig: invalid TOML")?;
        file.persistence.validate()?;
        Ok(file.persistence)
    }

    /// Load from a TOML file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("PersistenceConfig: cannot read {}", path.display()))?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "[PersistenceConfig] Loaded {} (queue={}, saves_per_tick={})",
            path.display(),
            config.max_queue_size,
            config.saves_per_tick
        );
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_queue_size == 0 {
            return Err(anyhow::anyhow!(
                "PersistenceConfig: max_queue_size cannot be 0"
            ));
        }

        if self.saves_per_tick == 0 {
            return Err(anyhow::anyhow!(
                "PersistenceConfig: saves_per_tick cannot be 0, the queue would never drain"
            ));
        }

        if self.tick_time_budget_ms == Some(0) {
            return Err(anyhow::anyhow!(
                "PersistenceConfig: tick_time_budget_ms must be positive (omit it for no limit)"
            ));
        }

        if self.failure_threshold > 0 && self.max_backoff_ticks == 0 {
            return Err(anyhow::anyhow!(
                "PersistenceConfig: max_backoff_ticks cannot be 0 while backoff is enabled"
            ));
        }

        Ok(())
    }

    pub fn tick_time_budget(&self) -> Option<Duration> {
        self.tick_time_budget_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PersistenceConfig::default();
        assert_eq!(config.max_queue_size, 64);
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_time_budget(), None);
    }

    #[test]
    fn test_parse_partial_table() {
        let config = PersistenceConfig::from_toml_str(
            r#"
            [persistence]
            saves_per_tick = 2
            tick_time_budget_ms = 4
            "#,
        )
        .expect("valid config");
        assert_eq!(config.saves_per_tick, 2);
        assert_eq!(config.tick_time_budget(), Some(Duration::from_millis(4)));
        assert_eq!(config.max_queue_size, 64);

        let empty = PersistenceConfig::from_toml_str("").expect("empty document");
        assert_eq!(empty, PersistenceConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(PersistenceConfig::from_toml_str("[persistence]\nsaves_per_tick = 0").is_err());
        assert!(PersistenceConfig::from_toml_str("[persistence]\nmax_queue_size = 0").is_err());
        assert!(PersistenceConfig::from_toml_str("[persistence]\ntick_time_budget_ms = 0").is_err());
        assert!(PersistenceConfig::from_toml_str("[persistence]\nsaves_per_tick = \"x\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temporary directory for test");
        let path = temp_dir.path().join("world.toml");
        std::fs::write(&path, "[persistence]\nmax_queue_size = 8\n").expect("write config");

        let config = PersistenceConfig::load(&path).expect("valid file");
        assert_eq!(config.max_queue_size, 8);
        assert!(PersistenceConfig::load(temp_dir.path().join("missing.toml")).is_err());
    }
}

//! Configuration file support for Flexion.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/flexion/config.toml`.

use crate::types::MuscleGroup;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Recovery behaviour configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Per-muscle recovery-hour overrides, keyed by canonical muscle key
    #[serde(default)]
    pub overrides: HashMap<String, f64>,

    /// Refresh interval for the live countdown view, in seconds
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            tick_seconds: default_tick_seconds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("flexion")
}

fn default_tick_seconds() -> u64 {
    1
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("flexion").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Configured recovery-hour override for a muscle, if any.
    ///
    /// Non-positive overrides are ignored.
    pub fn recovery_override(&self, muscle: MuscleGroup) -> Option<f64> {
        self.recovery
            .overrides
            .get(muscle.key())
            .copied()
            .filter(|h| *h > 0.0)
    }

    /// Live-countdown refresh interval, clamped to the supported 1-60 s range
    pub fn tick_seconds(&self) -> u64 {
        self.recovery.tick_seconds.clamp(1, 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.recovery.overrides.is_empty());
        assert_eq!(config.tick_seconds(), 1);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.recovery.overrides.insert("quads".into(), 96.0);

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            parsed.recovery_override(MuscleGroup::Quads),
            Some(96.0)
        );
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[recovery]
tick_seconds = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tick_seconds(), 30);
        assert!(config.recovery.overrides.is_empty()); // default
    }

    #[test]
    fn test_tick_seconds_clamps() {
        let toml_str = r#"
[recovery]
tick_seconds = 900
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tick_seconds(), 60);
    }

    #[test]
    fn test_non_positive_override_is_ignored() {
        let mut config = Config::default();
        config.recovery.overrides.insert("chest".into(), 0.0);
        assert_eq!(config.recovery_override(MuscleGroup::Chest), None);
    }
}

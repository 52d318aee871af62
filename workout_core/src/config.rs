//! Configuration file support for the workout logger.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/workout-logger/config.toml`.

use crate::types::Category;
use crate::{Error, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub time: TimeConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub exercises: ExercisesConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root of the `YYYY/MM/DD.jsonl` log store
    #[serde(default = "default_db_dir")]
    pub db_dir: PathBuf,

    /// Where ingestion bookkeeping (processed message ids) lives
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            db_dir: default_db_dir(),
            state_dir: default_state_dir(),
        }
    }
}

/// Timestamp localization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Fixed UTC offset applied to every stored timestamp, e.g. `-08:00`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

/// Git integration for the log store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_auto_commit")]
    pub auto_commit: bool,

    #[serde(default)]
    pub auto_push: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            auto_commit: default_auto_commit(),
            auto_push: false,
        }
    }
}

/// User-defined exercise added to the built-in catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CustomExercise {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Exercise catalog extensions
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ExercisesConfig {
    #[serde(default)]
    pub custom: Vec<CustomExercise>,
}

// Default value functions
fn data_base_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("workout-logger")
}

fn default_db_dir() -> PathBuf {
    data_base_dir().join("db")
}

fn default_state_dir() -> PathBuf {
    data_base_dir().join("state")
}

fn default_utc_offset() -> String {
    "-08:00".into()
}

fn default_auto_commit() -> bool {
    true
}

/// Parse a `+HH:MM` / `-HH:MM` offset
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset> {
    value
        .trim()
        .parse::<FixedOffset>()
        .map_err(|e| Error::Config(format!("Invalid utc_offset '{}': {}", value, e)))
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
        config.utc_offset()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("workout-logger").join("config.toml")
    }

    /// The configured timezone as a fixed offset
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.time.utc_offset)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

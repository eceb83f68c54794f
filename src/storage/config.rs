use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Settings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Maximum number of recent clips to keep
    #[serde(default = "default_max_clips")]
    pub max_clips: usize,

    /// Maximum number of favorite clips to keep
    #[serde(default = "default_max_favorites")]
    pub max_favorites: usize,

    /// Pro tier: raises both caps' ceiling and enables semantic search
    #[serde(default)]
    pub is_pro: bool,

    /// Clipboard poll interval in milliseconds for the watch daemon
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Refresh interval in milliseconds for pinned (follow) list views
    #[serde(default = "default_follow_interval_ms")]
    pub follow_interval_ms: u64,

    /// Enable debug logging
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            max_clips: default_max_clips(),
            max_favorites: default_max_favorites(),
            is_pro: false,
            poll_interval_ms: default_poll_interval_ms(),
            follow_interval_ms: default_follow_interval_ms(),
            debug_logging: false,
        }
    }
}

impl GeneralConfig {
    /// Settings seeded into a fresh clip store
    pub fn initial_settings(&self) -> Settings {
        Settings {
            max_clips: self.max_clips,
            max_favorites: self.max_favorites,
            is_pro: self.is_pro,
        }
    }
}

/// Remote semantic search settings.
/// Search is disabled until both endpoint and api_key are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTTPS endpoint of the semantic search service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Bearer credential sent with every search request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            endpoint: None,
            api_key: None,
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

// Default value functions for serde
fn default_max_clips() -> usize {
    crate::models::store::FREE_MAX_CLIPS
}

fn default_max_favorites() -> usize {
    crate::models::store::FREE_MAX_FAVORITES
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_follow_interval_ms() -> u64 {
    1000
}

fn default_search_timeout_secs() -> u64 {
    30
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        use anyhow::Context;
        use std::fs;

        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!(
            "Config: max_clips={}, max_favorites={}, poll_interval={}ms",
            config.general.max_clips,
            config.general.max_favorites,
            config.general.poll_interval_ms
        );

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        let toml_str = toml::to_string_pretty(config)
            .with_context(|| "Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../clipmaster.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}

//! Configuration management for relcache

pub mod schema;

pub use schema::{Config, UnavailablePolicy};

use crate::error::{RelcacheError, RelcacheResult};
use schema::StorageConfig;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relcache")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relcache")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> RelcacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> RelcacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| RelcacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| RelcacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> RelcacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            RelcacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> RelcacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RelcacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved on-disk locations for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub cache_file: PathBuf,
    pub artifact_dir: PathBuf,
    pub history_log: PathBuf,
}

impl StoragePaths {
    /// Resolve locations from the `--state-dir` override, then config, then
    /// the platform state directory
    pub fn resolve(state_dir_override: Option<&Path>, storage: &StorageConfig) -> Self {
        let state_dir = state_dir_override
            .map(Path::to_path_buf)
            .or_else(|| storage.state_dir.clone())
            .unwrap_or_else(ConfigManager::state_dir);

        Self {
            cache_file: storage
                .cache_file
                .clone()
                .unwrap_or_else(|| state_dir.join("cache.json")),
            artifact_dir: storage
                .artifact_dir
                .clone()
                .unwrap_or_else(|| state_dir.join("artifacts")),
            history_log: state_dir.join("history.log"),
        }
    }

    /// Apply per-invocation file locations (`--cache-file`, `--artifact-dir`),
    /// which win over everything else
    pub fn with_overrides(mut self, cache_file: Option<&Path>, artifact_dir: Option<&Path>) -> Self {
        if let Some(path) = cache_file {
            self.cache_file = path.to_path_buf();
        }
        if let Some(path) = artifact_dir {
            self.artifact_dir = path.to_path_buf();
        }
        self
    }
}

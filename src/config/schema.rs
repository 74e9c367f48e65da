//! Configuration schema for relcache
//!
//! Configuration is stored at `~/.config/relcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Release notes source
    pub source: SourceConfig,

    /// Retry budget for the first fetch of a commit
    pub retry: RetryConfig,

    /// Where cache state lives
    pub storage: StorageConfig,

    /// How unavailable release notes are reported
    pub policy: PolicyConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Append every resolution to the history log
    pub history_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { history_log: true }
    }
}

/// Release notes source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the release notes document
    pub url: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Largest accepted document in bytes
    pub max_body_bytes: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
            max_body_bytes: crate::fetch::DEFAULT_BODY_LIMIT,
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first (1 = no retry)
    pub max_attempts: u32,

    /// Wait before the second attempt; doubles after each failure
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1000,
        }
    }
}

/// Storage locations. Unset paths derive from the state directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for cache state
    pub state_dir: Option<PathBuf>,

    /// Cache store document (default: `<state_dir>/cache.json`)
    pub cache_file: Option<PathBuf>,

    /// Artifact repository root (default: `<state_dir>/artifacts`)
    pub artifact_dir: Option<PathBuf>,
}

/// Severity of a commit without release notes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnavailablePolicy {
    /// Fail the build step
    #[default]
    Error,
    /// Print a warning and succeed
    Warn,
}

/// Reporting policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// What to do when a commit has no release notes
    pub on_unavailable: UnavailablePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[retry]"));
        assert!(toml.contains("on_unavailable = \"error\""));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 1000);
        assert!(config.source.url.is_none());
        assert_eq!(config.policy.on_unavailable, UnavailablePolicy::Error);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [source]
            url = "https://example.com/RELEASE_NOTES.txt"

            [policy]
            on_unavailable = "warn"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.source.url.as_deref(),
            Some("https://example.com/RELEASE_NOTES.txt")
        );
        assert_eq!(config.source.timeout_secs, 30); // default preserved
        assert_eq!(config.policy.on_unavailable, UnavailablePolicy::Warn);
    }
}

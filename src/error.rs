//! Error types for relcache
//!
//! All modules use `RelcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for relcache operations
pub type RelcacheResult<T> = Result<T, RelcacheError>;

/// All errors that can occur in relcache
#[derive(Error, Debug)]
pub enum RelcacheError {
    // Input errors
    #[error("Commit identifier must not be empty")]
    EmptyCommit,

    #[error("Invalid checksum '{value}': {reason}")]
    InvalidChecksum { value: String, reason: String },

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("No release notes source configured")]
    SourceNotConfigured,

    // Cache store errors
    #[error("Cache store {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Failed to read cache store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Artifact errors
    #[error("Failed to write artifact {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("Artifact {0} does not match its checksum")]
    ArtifactTampered(String),

    // Resolution outcomes surfaced to the pipeline
    #[error("Release notes fetch failed for commit {commit} after {attempts} attempt(s); recorded as unavailable")]
    FetchFailed { commit: String, attempts: u32 },

    #[error("Release notes unavailable for commit {commit} (recorded by an earlier build)")]
    Unavailable { commit: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl RelcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache store write error
    pub fn store_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StoreWrite {
            path: path.into(),
            source,
        }
    }

    /// Whether this error reports a missing release notes artifact
    /// rather than a malfunction
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::Unavailable { .. })
    }

    /// Process exit code reported to the invoking pipeline
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::FetchFailed { .. } => 2,
            Self::Unavailable { .. } => 3,
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::FetchFailed { .. } | Self::Unavailable { .. } => Some(
                "No new fetch will be attempted for this commit. Remove its entry from the cache file to retry.",
            ),
            Self::StoreCorrupt { .. } => Some(
                "Repair or delete the cache file by hand; relcache will not overwrite it.",
            ),
            Self::SourceNotConfigured => {
                Some("Pass --source <URL> or run: relcache config set source.url <URL>")
            }
            Self::ArtifactTampered(_) => {
                Some("The stored file was modified after download. Restore it from a backup.")
            }
            _ => None,
        }
    }
}

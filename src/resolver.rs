//! Commit resolution protocol
//!
//! [`Resolver::resolve`] is the single entry point the build pipeline calls.
//! A commit is resolved once and the outcome is remembered forever:
//!
//! 1. A recorded checksum or unavailable marker is returned as-is, without
//!    touching the network.
//! 2. Otherwise the source is fetched with retry. Success stores the
//!    artifact and records its checksum; an exhausted retry budget records
//!    the unavailable marker.
//!
//! The cache store is only written once a final outcome is known, so a
//! resolution cancelled mid-retry leaves the commit unresolved.

use crate::cache::{ArtifactRepository, CacheRecord, CacheStore, Checksum, CommitId};
use crate::error::{RelcacheError, RelcacheResult};
use crate::fetch::Fetcher;
use crate::retry::{fetch_with_retry, RetryPolicy, Sleeper, TokioSleeper};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of resolving one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An earlier build stored release notes for this commit
    CachedWithArtifact(Checksum),
    /// An earlier build recorded the notes as unavailable
    CachedUnavailable,
    /// Fetched and stored during this call
    FreshArtifact(Checksum),
    /// Retries exhausted during this call; now recorded as unavailable
    FetchFailed { attempts: u32, reason: String },
}

impl Outcome {
    /// Checksum of the artifact, when there is one
    pub fn checksum(&self) -> Option<&Checksum> {
        match self {
            Self::CachedWithArtifact(sum) | Self::FreshArtifact(sum) => Some(sum),
            _ => None,
        }
    }

    /// Whether the outcome came from the cache without a fetch
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::CachedWithArtifact(_) | Self::CachedUnavailable)
    }

    /// Short machine-friendly label
    pub fn label(&self) -> &'static str {
        match self {
            Self::CachedWithArtifact(_) => "cached",
            Self::CachedUnavailable => "cached-unavailable",
            Self::FreshArtifact(_) => "fresh",
            Self::FetchFailed { .. } => "fetch-failed",
        }
    }

    fn from_record(record: CacheRecord) -> RelcacheResult<Self> {
        match record {
            CacheRecord::Resolved(sum) => Ok(Self::CachedWithArtifact(sum)),
            CacheRecord::ResolvedUnavailable => Ok(Self::CachedUnavailable),
            CacheRecord::Unresolved => Err(RelcacheError::Internal(
                "cache store reported an unresolved commit after recording it".to_string(),
            )),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CachedWithArtifact(sum) => write!(f, "cached artifact {}", sum),
            Self::CachedUnavailable => write!(f, "cached as unavailable"),
            Self::FreshArtifact(sum) => write!(f, "fetched artifact {}", sum),
            Self::FetchFailed { attempts, reason } => {
                write!(f, "fetch failed after {} attempt(s): {}", attempts, reason)
            }
        }
    }
}

/// Composes cache store, artifact repository and retrying fetcher
pub struct Resolver {
    store: CacheStore,
    artifacts: ArtifactRepository,
    fetcher: Arc<dyn Fetcher>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    source: String,
}

impl Resolver {
    /// Create a resolver that sleeps on the tokio timer between attempts
    pub fn new(
        store: CacheStore,
        artifacts: ArtifactRepository,
        fetcher: Arc<dyn Fetcher>,
        policy: RetryPolicy,
        source: impl Into<String>,
    ) -> Self {
        Self {
            store,
            artifacts,
            fetcher,
            sleeper: Arc::new(TokioSleeper),
            policy,
            source: source.into(),
        }
    }

    /// Replace the backoff sleeper
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn artifacts(&self) -> &ArtifactRepository {
        &self.artifacts
    }

    /// Resolve a commit to its release notes outcome
    pub async fn resolve(&self, commit: &CommitId) -> RelcacheResult<Outcome> {
        match self.store.lookup(commit)? {
            CacheRecord::Resolved(sum) => {
                debug!("Cache hit for {}: {}", commit, sum.short());
                if !self.artifacts.exists(&sum) {
                    warn!(
                        "Artifact {} recorded for {} is missing from {}",
                        sum.short(),
                        commit,
                        self.artifacts.root().display()
                    );
                }
                return Ok(Outcome::CachedWithArtifact(sum));
            }
            CacheRecord::ResolvedUnavailable => {
                debug!("Cache hit for {}: unavailable", commit);
                return Ok(Outcome::CachedUnavailable);
            }
            CacheRecord::Unresolved => {}
        }

        info!("Cache miss for {}, fetching {}", commit, self.source);
        let fetched = fetch_with_retry(
            self.fetcher.as_ref(),
            self.sleeper.as_ref(),
            &self.source,
            &self.policy,
        )
        .await;

        match fetched {
            Ok(bytes) => {
                let sum = self.artifacts.store(&bytes)?;
                match self.store.record(commit, Some(sum.clone()))? {
                    CacheRecord::Resolved(recorded) if recorded == sum => {
                        info!("Resolved {} to {}", commit, sum.short());
                        Ok(Outcome::FreshArtifact(sum))
                    }
                    other => Outcome::from_record(other),
                }
            }
            Err(failure) => {
                warn!(
                    "Release notes for {} unavailable: {}. Recording permanently",
                    commit, failure
                );
                match self.store.record(commit, None)? {
                    CacheRecord::ResolvedUnavailable => Ok(Outcome::FetchFailed {
                        attempts: failure.attempts,
                        reason: failure.last.to_string(),
                    }),
                    other => Outcome::from_record(other),
                }
            }
        }
    }
}

//! Durable commit -> checksum mapping
//!
//! The whole mapping lives in one JSON document:
//!
//! ```json
//! { "abc123": "2cf24dba...", "def456": null }
//! ```
//!
//! A string value records a resolved commit, `null` records a commit whose
//! release notes were permanently unavailable, and absence means the commit
//! was never resolved. Every write re-reads the document, stages the new
//! content next to it and renames it into place, so an interrupted write
//! never leaves a truncated store behind.

use crate::cache::checksum::Checksum;
use crate::cache::staged_file_in;
use crate::error::{RelcacheError, RelcacheResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Opaque, non-empty source-control revision identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(String);

impl CommitId {
    /// Validate a commit identifier (surrounding whitespace is ignored)
    pub fn new(value: impl AsRef<str>) -> RelcacheResult<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RelcacheError::EmptyCommit);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the cache knows about a single commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRecord {
    /// Never fetched
    Unresolved,
    /// Fetched successfully; the artifact is stored under this checksum
    Resolved(Checksum),
    /// Fetch permanently failed; never retried
    ResolvedUnavailable,
}

impl CacheRecord {
    /// Whether the commit already has a final outcome
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    pub fn checksum(&self) -> Option<&Checksum> {
        match self {
            Self::Resolved(sum) => Some(sum),
            _ => None,
        }
    }

    /// Short machine-friendly label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved(_) => "resolved",
            Self::ResolvedUnavailable => "unavailable",
        }
    }
}

impl From<Option<Checksum>> for CacheRecord {
    fn from(value: Option<Checksum>) -> Self {
        match value {
            Some(sum) => Self::Resolved(sum),
            None => Self::ResolvedUnavailable,
        }
    }
}

impl fmt::Display for CacheRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(sum) => write!(f, "resolved ({})", sum),
            other => f.write_str(other.label()),
        }
    }
}

/// In-memory copy of the persisted mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheIndex {
    /// `None` is the unavailable marker
    entries: BTreeMap<String, Option<Checksum>>,
    /// Entries that are neither a checksum nor null, kept verbatim
    unknown: Map<String, Value>,
}

impl CacheIndex {
    /// Look up a commit
    pub fn get(&self, commit: &CommitId) -> CacheRecord {
        match self.entries.get(commit.as_str()) {
            Some(value) => CacheRecord::from(value.clone()),
            None => CacheRecord::Unresolved,
        }
    }

    /// Insert or overwrite one entry
    pub fn insert(&mut self, commit: &CommitId, value: Option<Checksum>) {
        self.unknown.remove(commit.as_str());
        self.entries.insert(commit.as_str().to_string(), value);
    }

    /// Recorded commits in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, CacheRecord)> + '_ {
        self.entries
            .iter()
            .map(|(commit, value)| (commit.as_str(), CacheRecord::from(value.clone())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a commit whose own entry must be a checksum or null
    fn checked_get(&self, path: &Path, commit: &CommitId) -> RelcacheResult<CacheRecord> {
        match self.unknown.get(commit.as_str()) {
            Some(value) => Err(RelcacheError::StoreCorrupt {
                path: path.to_path_buf(),
                reason: format!("entry '{}' is neither a checksum nor null: {}", commit, value),
            }),
            None => Ok(self.get(commit)),
        }
    }

    fn parse(path: &Path, content: &str) -> RelcacheResult<Self> {
        let corrupt = |reason: String| RelcacheError::StoreCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value = serde_json::from_str(content).map_err(|e| corrupt(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(corrupt("expected a JSON object".to_string()));
        };

        let mut index = Self::default();
        for (commit, value) in map {
            match value {
                Value::Null => {
                    index.entries.insert(commit, None);
                }
                Value::String(digest) => match Checksum::parse(&digest) {
                    Ok(sum) => {
                        index.entries.insert(commit, Some(sum));
                    }
                    Err(_) => {
                        debug!("Preserving non-checksum cache entry '{}'", commit);
                        index.unknown.insert(commit, Value::String(digest));
                    }
                },
                other => {
                    debug!("Preserving unrecognized cache entry '{}'", commit);
                    index.unknown.insert(commit, other);
                }
            }
        }

        Ok(index)
    }

    fn to_json(&self) -> RelcacheResult<String> {
        let mut map = self.unknown.clone();
        for (commit, value) in &self.entries {
            let value = match value {
                Some(sum) => Value::String(sum.to_string()),
                None => Value::Null,
            };
            map.insert(commit.clone(), value);
        }

        let mut content = serde_json::to_string_pretty(&Value::Object(map))?;
        content.push('\n');
        Ok(content)
    }
}

/// File-backed cache store
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the persisted document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full mapping, creating an empty store on first use.
    ///
    /// An existing document that cannot be parsed is reported as
    /// [`RelcacheError::StoreCorrupt`] and left untouched.
    pub fn load(&self) -> RelcacheResult<CacheIndex> {
        if let Some(index) = self.read_existing()? {
            return Ok(index);
        }

        info!("Initializing empty cache store at {}", self.path.display());
        let index = CacheIndex::default();
        self.write_atomic(&index)?;
        Ok(index)
    }

    /// Look up a single commit.
    ///
    /// Other keys may hold anything; only this commit's own entry has to be
    /// a checksum or null.
    pub fn lookup(&self, commit: &CommitId) -> RelcacheResult<CacheRecord> {
        self.load()?.checked_get(&self.path, commit)
    }

    /// Insert or overwrite the entry for `commit` and persist the mapping.
    ///
    /// `None` records the unavailable marker.
    pub fn upsert(&self, commit: &CommitId, value: Option<Checksum>) -> RelcacheResult<()> {
        let mut index = self.read_existing()?.unwrap_or_default();
        index.insert(commit, value);
        self.write_atomic(&index)
    }

    /// Record a final outcome unless the commit already has one.
    ///
    /// Returns the record that ends up persisted, which is the earlier
    /// resolution if another writer got there first.
    pub fn record(&self, commit: &CommitId, value: Option<Checksum>) -> RelcacheResult<CacheRecord> {
        let mut index = self.read_existing()?.unwrap_or_default();

        let existing = index.checked_get(&self.path, commit)?;
        if existing.is_resolved() {
            warn!(
                "Commit {} was already recorded as {}; keeping it",
                commit, existing
            );
            return Ok(existing);
        }

        index.insert(commit, value);
        self.write_atomic(&index)?;
        Ok(index.get(commit))
    }

    fn read_existing(&self) -> RelcacheResult<Option<CacheIndex>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => CacheIndex::parse(&self.path, &content).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RelcacheError::StoreRead {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn write_atomic(&self, index: &CacheIndex) -> RelcacheResult<()> {
        let staged = self.stage(index)?;
        self.commit(staged)
    }

    /// Write the full document to a temporary file beside the store
    fn stage(&self, index: &CacheIndex) -> RelcacheResult<NamedTempFile> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| RelcacheError::store_write(dir, e))?;

        let content = index.to_json()?;
        let mut staged =
            staged_file_in(dir, ".relcache-").map_err(|e| RelcacheError::store_write(dir, e))?;

        staged
            .write_all(content.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| RelcacheError::store_write(staged.path(), e))?;

        Ok(staged)
    }

    /// Atomically replace the store with a staged document
    fn commit(&self, staged: NamedTempFile) -> RelcacheResult<()> {
        staged
            .persist(&self.path)
            .map_err(|e| RelcacheError::store_write(&self.path, e.error))?;
        debug!("Persisted cache store {}", self.path.display());
        Ok(())
    }
}

//! Content-addressed artifact repository
//!
//! Each distinct release notes document is stored once as
//! `<root>/<checksum>.txt`. Files are written once and never modified, so
//! commits with byte-identical notes share one file.

use crate::cache::checksum::Checksum;
use crate::cache::staged_file_in;
use crate::error::{RelcacheError, RelcacheResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension for stored artifacts
const ARTIFACT_EXT: &str = "txt";

/// Write-once store of downloaded documents, named by checksum
#[derive(Debug, Clone)]
pub struct ArtifactRepository {
    root: PathBuf,
}

impl ArtifactRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a document and return its checksum.
    ///
    /// A document that is already present is left alone.
    pub fn store(&self, bytes: &[u8]) -> RelcacheResult<Checksum> {
        let checksum = Checksum::of(bytes);
        let path = self.path(&checksum);

        if path.exists() {
            debug!("Artifact {} already stored", checksum.short());
            return Ok(checksum);
        }

        fs::create_dir_all(&self.root).map_err(|e| RelcacheError::ArtifactWrite {
            path: self.root.clone(),
            source: e,
        })?;

        let write_err = |source| RelcacheError::ArtifactWrite {
            path: path.clone(),
            source,
        };
        let mut staged = staged_file_in(&self.root, ".artifact-").map_err(write_err)?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(write_err)?;
        // Same bytes land under the same name, so a concurrent duplicate
        // write replacing ours is harmless.
        staged.persist(&path).map_err(|e| write_err(e.error))?;

        info!(
            "Stored artifact {} ({} bytes)",
            checksum.short(),
            bytes.len()
        );
        Ok(checksum)
    }

    /// Whether an artifact with this checksum is stored
    pub fn exists(&self, checksum: &Checksum) -> bool {
        self.path(checksum).is_file()
    }

    /// Deterministic location of an artifact, whether or not it exists
    pub fn path(&self, checksum: &Checksum) -> PathBuf {
        self.root
            .join(format!("{}.{}", checksum.as_str(), ARTIFACT_EXT))
    }

    /// Read a stored artifact
    pub fn read(&self, checksum: &Checksum) -> RelcacheResult<Vec<u8>> {
        let path = self.path(checksum);
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RelcacheError::ArtifactMissing(checksum.to_string()),
            _ => RelcacheError::io(format!("reading artifact {}", path.display()), e),
        })
    }

    /// Recompute the digest of a stored artifact and compare it to its name
    pub fn verify(&self, checksum: &Checksum) -> RelcacheResult<bool> {
        let bytes = self.read(checksum)?;
        Ok(Checksum::of(&bytes) == *checksum)
    }

    /// All stored artifacts, sorted by checksum
    pub fn list(&self) -> RelcacheResult<Vec<Checksum>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RelcacheError::io(
                    format!("reading artifact directory {}", self.root.display()),
                    e,
                ))
            }
        };

        let mut sums = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RelcacheError::io("reading artifact entry", e))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != ARTIFACT_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(sum) = Checksum::parse(stem) {
                sums.push(sum);
            }
        }

        sums.sort();
        Ok(sums)
    }
}

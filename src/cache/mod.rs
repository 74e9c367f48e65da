//! Commit-keyed cache of release notes
//!
//! Two pieces of durable state:
//!
//! - the cache store, one JSON document mapping commit -> checksum or null
//! - the artifact repository, one file per distinct document, named by checksum
//!
//! # Cache States
//!
//! | State | Stored as | Network |
//! |-------|-----------|---------|
//! | Unresolved | key absent | fetch with retry |
//! | Resolved | `"<checksum>"` | never |
//! | ResolvedUnavailable | `null` | never |
//!
//! Once a commit leaves `Unresolved` it never changes again.

pub mod artifact;
pub mod checksum;
pub mod store;

pub use artifact::ArtifactRepository;
pub use checksum::Checksum;
pub use store::{CacheIndex, CacheRecord, CacheStore, CommitId};

use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode of published cache files, before the umask
#[cfg(unix)]
const PUBLISHED_MODE: u32 = 0o644;

/// Create a temporary file in `dir` that is renamed into place once written.
///
/// tempfile creates owner-only files; published state gets regular file
/// permissions instead.
pub(crate) fn staged_file_in(dir: &Path, prefix: &str) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(".tmp");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(PUBLISHED_MODE));
    }

    builder.tempfile_in(dir)
}

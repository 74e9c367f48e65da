//! Artifact command - hand a stored document to the packaging step

use crate::cache::{ArtifactRepository, Checksum};
use crate::cli::args::ArtifactArgs;
use crate::config::StoragePaths;
use crate::error::{RelcacheError, RelcacheResult};

/// Execute the artifact command
pub async fn execute(args: ArtifactArgs, paths: &StoragePaths) -> RelcacheResult<()> {
    let checksum = Checksum::parse(args.checksum.trim())?;
    let artifacts = ArtifactRepository::new(&paths.artifact_dir);

    if !artifacts.exists(&checksum) {
        return Err(RelcacheError::ArtifactMissing(checksum.to_string()));
    }

    if args.verify && !artifacts.verify(&checksum)? {
        return Err(RelcacheError::ArtifactTampered(checksum.to_string()));
    }

    println!("{}", artifacts.path(&checksum).display());
    Ok(())
}

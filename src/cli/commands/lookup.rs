//! Lookup command - inspect one commit without fetching

use crate::cache::{ArtifactRepository, CacheRecord, CacheStore, CommitId};
use crate::cli::args::{LookupArgs, OutputFormat};
use crate::config::StoragePaths;
use crate::error::RelcacheResult;
use crate::ui::{self, UiContext};

/// Execute the lookup command
pub async fn execute(args: LookupArgs, paths: &StoragePaths) -> RelcacheResult<()> {
    let commit = CommitId::new(&args.commit)?;
    let store = CacheStore::new(&paths.cache_file);
    let artifacts = ArtifactRepository::new(&paths.artifact_dir);

    let record = store.lookup(&commit)?;
    let artifact = record.checksum().map(|sum| artifacts.path(sum));

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "commit": commit.as_str(),
                "state": record.label(),
                "checksum": record.checksum().map(|sum| sum.as_str()),
                "artifact": artifact.as_ref().map(|p| p.display().to_string()),
                "artifact_present": record.checksum().map(|sum| artifacts.exists(sum)),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => match record.checksum() {
            Some(sum) => println!("{} {}", record.label(), sum),
            None => println!("{}", record.label()),
        },
        OutputFormat::Text => {
            let ctx = UiContext::detect();
            ui::key_value(&ctx, "commit", commit.as_str());
            match &record {
                CacheRecord::Resolved(sum) => {
                    ui::key_value_status(&ctx, "state", record.label(), true);
                    ui::key_value(&ctx, "checksum", sum.as_str());
                    ui::key_value_status(
                        &ctx,
                        "artifact",
                        &artifacts.path(sum).display().to_string(),
                        artifacts.exists(sum),
                    );
                }
                CacheRecord::ResolvedUnavailable => {
                    ui::key_value_status(&ctx, "state", record.label(), false);
                    ui::remark(&ctx, "No fetch will be attempted for this commit");
                }
                CacheRecord::Unresolved => {
                    ui::key_value(&ctx, "state", record.label());
                    ui::remark(&ctx, "The next resolve will fetch release notes");
                }
            }
        }
    }

    Ok(())
}

//! List command - show every recorded commit

use crate::cache::{ArtifactRepository, CacheRecord, CacheStore};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::StoragePaths;
use crate::error::RelcacheResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, paths: &StoragePaths) -> RelcacheResult<()> {
    let store = CacheStore::new(&paths.cache_file);
    let artifacts = ArtifactRepository::new(&paths.artifact_dir);
    let index = store.load()?;

    let entries: Vec<(&str, CacheRecord)> = index.iter().collect();

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Text => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No commits recorded");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Text => print_table(&entries, artifacts.list()?.len()),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[(&str, CacheRecord)], artifact_count: usize) {
    println!(
        "{:<42} {:<12} {:<14}",
        style("COMMIT").bold(),
        style("STATE").bold(),
        style("CHECKSUM").bold()
    );
    println!("{}", "-".repeat(68));

    for (commit, record) in entries {
        let state = match record {
            CacheRecord::Resolved(_) => style(record.label()).green(),
            CacheRecord::ResolvedUnavailable => style(record.label()).yellow(),
            CacheRecord::Unresolved => style(record.label()).dim(),
        };
        let checksum = record.checksum().map(|sum| sum.short()).unwrap_or("-");

        println!("{:<42} {:<12} {:<14}", commit, state, checksum);
    }

    println!();
    println!(
        "{} commit(s), {} stored artifact(s)",
        entries.len(),
        artifact_count
    );
}

fn print_json(entries: &[(&str, CacheRecord)]) -> RelcacheResult<()> {
    let json: Vec<_> = entries
        .iter()
        .map(|(commit, record)| {
            serde_json::json!({
                "commit": commit,
                "state": record.label(),
                "checksum": record.checksum().map(|sum| sum.as_str()),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plain(entries: &[(&str, CacheRecord)]) {
    for (commit, _) in entries {
        println!("{}", commit);
    }
}

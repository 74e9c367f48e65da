//! Resolve command - the build pipeline's entry point

use crate::cache::{ArtifactRepository, CacheStore, Checksum, CommitId};
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::{Config, StoragePaths, UnavailablePolicy};
use crate::error::{RelcacheError, RelcacheResult};
use crate::fetch::HttpFetcher;
use crate::history::HistoryLog;
use crate::resolver::{Outcome, Resolver};
use crate::retry::RetryPolicy;
use crate::ui::{self, UiContext};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config, paths: &StoragePaths) -> RelcacheResult<()> {
    let ctx = UiContext::detect();
    let commit = CommitId::new(&args.commit)?;
    let store = CacheStore::new(&paths.cache_file);

    let source = match args.source.clone().or_else(|| config.source.url.clone()) {
        Some(source) => source,
        None => {
            // Replays never touch the network, so they work without a source
            if !store.lookup(&commit)?.is_resolved() {
                return Err(RelcacheError::SourceNotConfigured);
            }
            debug!("No source configured; {} is already resolved", commit);
            String::new()
        }
    };

    let policy = RetryPolicy::new(
        args.max_attempts.unwrap_or(config.retry.max_attempts),
        Duration::from_millis(
            args.initial_backoff_ms
                .unwrap_or(config.retry.initial_backoff_ms),
        ),
    )?;
    debug!(
        "Retry budget: {} attempt(s), {}ms initial backoff",
        policy.max_attempts(),
        policy.initial_backoff().as_millis()
    );

    let timeout_secs = args.timeout_secs.unwrap_or(config.source.timeout_secs);
    if timeout_secs == 0 {
        return Err(RelcacheError::User(
            "Request timeout must be at least 1 second".to_string(),
        ));
    }

    let resolver = Resolver::new(
        store,
        ArtifactRepository::new(&paths.artifact_dir),
        Arc::new(
            HttpFetcher::new(Duration::from_secs(timeout_secs))
                .with_body_limit(config.source.max_body_bytes),
        ),
        policy,
        source.clone(),
    );

    let outcome = resolver.resolve(&commit).await?;

    let history = HistoryLog::new(&paths.history_log, config.general.history_log);
    history
        .log(
            &format!("resolve.{}", outcome.label()),
            &serde_json::json!({
                "commit": commit.as_str(),
                "source": source,
                "checksum": outcome.checksum().map(Checksum::as_str),
            }),
        )
        .await;

    if let (Some(dest), Some(sum)) = (&args.emit, outcome.checksum()) {
        emit_artifact(resolver.artifacts(), sum, dest).await?;
    }

    report(&ctx, &commit, &outcome, resolver.artifacts(), args.format)?;

    let on_unavailable = if args.allow_unavailable {
        UnavailablePolicy::Warn
    } else {
        config.policy.on_unavailable
    };

    let failure = match outcome {
        Outcome::FetchFailed { attempts, .. } => RelcacheError::FetchFailed {
            commit: commit.to_string(),
            attempts,
        },
        Outcome::CachedUnavailable => RelcacheError::Unavailable {
            commit: commit.to_string(),
        },
        Outcome::CachedWithArtifact(_) | Outcome::FreshArtifact(_) => return Ok(()),
    };

    match on_unavailable {
        UnavailablePolicy::Error => Err(failure),
        UnavailablePolicy::Warn => {
            if args.format == OutputFormat::Text {
                ui::step_warn_hint(
                    &ctx,
                    &failure.to_string(),
                    failure.hint().unwrap_or_default(),
                );
            }
            Ok(())
        }
    }
}

/// Copy the artifact to the location the packaging step expects
async fn emit_artifact(
    artifacts: &ArtifactRepository,
    checksum: &Checksum,
    dest: &Path,
) -> RelcacheResult<()> {
    let bytes = artifacts.read(checksum)?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RelcacheError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::write(dest, bytes)
        .await
        .map_err(|e| RelcacheError::io(format!("writing {}", dest.display()), e))?;

    debug!("Copied artifact {} to {}", checksum.short(), dest.display());
    Ok(())
}

fn report(
    ctx: &UiContext,
    commit: &CommitId,
    outcome: &Outcome,
    artifacts: &ArtifactRepository,
    format: OutputFormat,
) -> RelcacheResult<()> {
    let artifact_path = outcome.checksum().map(|sum| artifacts.path(sum));

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "commit": commit.as_str(),
                "outcome": outcome.label(),
                "cached": outcome.is_cached(),
                "checksum": outcome.checksum().map(Checksum::as_str),
                "artifact": artifact_path.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            if let Some(sum) = outcome.checksum() {
                println!("{}", sum);
            }
        }
        OutputFormat::Text => match outcome {
            Outcome::FreshArtifact(sum) => {
                ui::step_ok_detail(ctx, &format!("Fetched release notes for {}", commit), "fresh");
                ui::key_value(ctx, "checksum", sum.as_str());
            }
            Outcome::CachedWithArtifact(sum) => {
                ui::step_ok_detail(ctx, &format!("Release notes for {}", commit), "cached");
                ui::key_value(ctx, "checksum", sum.as_str());
                if !artifacts.exists(sum) {
                    ui::step_warn(ctx, "Recorded artifact is missing from the repository");
                }
            }
            Outcome::FetchFailed { attempts, reason } => {
                ui::step_error_detail(
                    ctx,
                    &format!("Release notes fetch failed after {} attempt(s)", attempts),
                    reason,
                );
            }
            Outcome::CachedUnavailable => {
                ui::step_info(ctx, &format!("Release notes for {} recorded as unavailable", commit));
            }
        },
    }

    if format == OutputFormat::Text {
        if let Some(path) = artifact_path {
            ui::key_value(ctx, "artifact", &path.display().to_string());
        }
    }

    Ok(())
}

//! relcache - commit-keyed release notes cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use relcache::cli::args::LogFormat;
use relcache::cli::{commands, Cli, Commands};
use relcache::config::{ConfigManager, StoragePaths};
use relcache::error::RelcacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let label = if e.is_unavailable() {
                style("Unavailable:").yellow().bold()
            } else {
                style("Error:").red().bold()
            };
            eprintln!("{} {}", label, e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> RelcacheResult<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format);

    // Completions don't need config loading
    if let Commands::Completions(args) = cli.command {
        return commands::completions(args);
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    let paths = StoragePaths::resolve(cli.state_dir.as_deref(), &config.storage)
        .with_overrides(cli.cache_file.as_deref(), cli.artifact_dir.as_deref());
    debug!("Cache file: {}", paths.cache_file.display());
    debug!("Artifact directory: {}", paths.artifact_dir.display());

    match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Resolve(args) => commands::resolve(args, &config, &paths).await,
        Commands::Lookup(args) => commands::lookup(args, &paths).await,
        Commands::List(args) => commands::list(args, &paths).await,
        Commands::Artifact(args) => commands::artifact(args, &paths).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// Logs go to stderr so stdout stays machine-readable.
/// `RUST_LOG` wins over `-v`: 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("relcache=warn"),
        1 => EnvFilter::new("relcache=info"),
        _ => EnvFilter::new("relcache=debug"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}

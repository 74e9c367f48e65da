//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// relcache - commit-keyed release notes cache
///
/// Fetches the release notes document once per commit, stores it by
/// checksum and replays the recorded outcome on every later build.
#[derive(Parser, Debug)]
#[command(name = "relcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, env = "RELCACHE_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RELCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// State directory holding the cache file and artifacts
    #[arg(long, global = true, env = "RELCACHE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Cache file location (overrides the state directory layout)
    #[arg(long, global = true, env = "RELCACHE_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    /// Artifact directory (overrides the state directory layout)
    #[arg(long, global = true, env = "RELCACHE_ARTIFACT_DIR")]
    pub artifact_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a commit to its release notes, fetching at most once
    Resolve(ResolveArgs),

    /// Show what the cache recorded for a commit (never fetches)
    Lookup(LookupArgs),

    /// List all recorded commits
    List(ListArgs),

    /// Locate a stored artifact by checksum
    Artifact(ArtifactArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Commit identifier
    pub commit: String,

    /// Release notes URL (overrides source.url)
    #[arg(short, long, env = "RELCACHE_SOURCE_URL")]
    pub source: Option<String>,

    /// Total fetch attempts, 1 = no retry (overrides retry.max_attempts)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Backoff before the second attempt in milliseconds; doubles after
    /// each failure (overrides retry.initial_backoff_ms)
    #[arg(long)]
    pub initial_backoff_ms: Option<u64>,

    /// Per-request timeout in seconds (overrides source.timeout_secs)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Copy the artifact to this path for the packaging step
    #[arg(short, long)]
    pub emit: Option<PathBuf>,

    /// Report missing release notes as a warning and exit successfully
    #[arg(long)]
    pub allow_unavailable: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Commit identifier
    pub commit: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the artifact command
#[derive(Parser, Debug)]
pub struct ArtifactArgs {
    /// Artifact checksum
    pub checksum: String,

    /// Recompute the digest and fail if the file was modified
    #[arg(long)]
    pub verify: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., source.url)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON output
    Json,
    /// Bare values, one per line
    Plain,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

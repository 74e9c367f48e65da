//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, UnavailablePolicy};
use crate::error::{RelcacheError, RelcacheResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

const VALID_KEYS: &[&str] = &[
    "general.history_log",
    "source.url",
    "source.timeout_secs",
    "source.max_body_bytes",
    "retry.max_attempts",
    "retry.initial_backoff_ms",
    "storage.state_dir",
    "storage.cache_file",
    "storage.artifact_dir",
    "policy.on_unavailable",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> RelcacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> RelcacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> RelcacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> RelcacheResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if let Err(e) = apply_value(&mut config, key, value) {
        if matches!(&e, RelcacheError::User(msg) if msg.starts_with("Unknown config key")) {
            ui::remark(&ctx, "Valid keys:");
            print_valid_keys();
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply a dot-separated key to the configuration tree
fn apply_value(config: &mut Config, key: &str, value: &str) -> RelcacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "history_log"] => config.general.history_log = parse_bool(value)?,

        ["source", "url"] => config.source.url = optional_string(value),
        ["source", "timeout_secs"] => config.source.timeout_secs = parse_u64(value)?,
        ["source", "max_body_bytes"] => config.source.max_body_bytes = parse_u64(value)?,

        ["retry", "max_attempts"] => config.retry.max_attempts = parse_u32(value)?,
        ["retry", "initial_backoff_ms"] => config.retry.initial_backoff_ms = parse_u64(value)?,

        ["storage", "state_dir"] => config.storage.state_dir = optional_path(value),
        ["storage", "cache_file"] => config.storage.cache_file = optional_path(value),
        ["storage", "artifact_dir"] => config.storage.artifact_dir = optional_path(value),

        ["policy", "on_unavailable"] => {
            config.policy.on_unavailable = match value.to_lowercase().as_str() {
                "error" => UnavailablePolicy::Error,
                "warn" => UnavailablePolicy::Warn,
                _ => {
                    return Err(RelcacheError::User(format!(
                        "Invalid policy: {}. Use error/warn",
                        value
                    )))
                }
            }
        }

        _ => return Err(RelcacheError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

/// An empty value clears an optional setting
fn optional_string(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    optional_string(value).map(PathBuf::from)
}

fn parse_bool(value: &str) -> RelcacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RelcacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> RelcacheResult<u32> {
    value
        .parse()
        .map_err(|_| RelcacheError::User(format!("Invalid number: {}", value)))
}

fn parse_u64(value: &str) -> RelcacheResult<u64> {
    value
        .parse()
        .map_err(|_| RelcacheError::User(format!("Invalid number: {}", value)))
}

fn print_valid_keys() {
    for key in VALID_KEYS {
        eprintln!("  {}", key);
    }
}

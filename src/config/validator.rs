//! Config validation.
//!
//! Everything here runs before the first external command, so a bad
//! identifier or path never reaches the hub CLI's argv.

use super::BootstrapConfig;
use crate::error::ConfigError;
use crate::models::CheckpointSpec;
use log::LevelFilter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path};

/// `owner/name`, each segment starting alphanumeric.
static REPO_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*/[A-Za-z0-9][A-Za-z0-9._-]*$")
        .expect("repo id pattern is valid")
});

/// Validate a hub repository identifier.
pub fn validate_repo_id(repo_id: &str) -> Result<(), ConfigError> {
    if repo_id.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Checkpoint repository id cannot be empty".to_string(),
        ));
    }

    if !REPO_ID_RE.is_match(repo_id) {
        return Err(ConfigError::ValidationFailed(format!(
            "Checkpoint repository id must look like 'owner/name', got: {}",
            repo_id
        )));
    }

    Ok(())
}

/// Validate a checkpoint: identifier plus non-empty destination.
pub fn validate_checkpoint(checkpoint: &CheckpointSpec) -> Result<(), ConfigError> {
    validate_repo_id(&checkpoint.repo_id)?;

    if checkpoint.local_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(format!(
            "Local directory for {} cannot be empty",
            checkpoint.repo_id
        )));
    }

    Ok(())
}

/// The nested directory must be exactly one plain path component.
pub fn validate_nested_subdir(name: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::ValidationFailed(format!(
            "Nested checkpoint directory must be a single directory name, got: {:?}",
            name
        ))),
    }
}

/// Parse a log level name (case-insensitive).
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ConfigError> {
    level.trim().parse::<LevelFilter>().map_err(|_| {
        ConfigError::ValidationFailed(format!(
            "Unknown log level '{}', expected one of off/error/warn/info/debug/trace",
            level
        ))
    })
}

/// Validate a command vector (hub prefix or default workload).
pub fn validate_command(what: &str, command: &[String]) -> Result<(), ConfigError> {
    match command.first() {
        Some(program) if !program.is_empty() => Ok(()),
        _ => Err(ConfigError::ValidationFailed(format!(
            "{} cannot be empty",
            what
        ))),
    }
}

/// Validate a whole configuration.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), ConfigError> {
    validate_command("Hub command", &config.hub_command)?;
    validate_command("Default command", &config.default_command)?;

    let layout = &config.layout;
    validate_checkpoint(&layout.primary)?;
    validate_checkpoint(&layout.auxiliary)?;
    validate_nested_subdir(&layout.nested_subdir)?;

    if layout.primary.local_dir == layout.auxiliary.local_dir {
        return Err(ConfigError::ValidationFailed(format!(
            "Primary and auxiliary checkpoints share a local directory: {}",
            layout.primary.local_dir.display()
        )));
    }

    parse_log_level(&config.log_level)?;

    if config.log_to_file && config.log_max_bytes == 0 {
        return Err(ConfigError::ValidationFailed(
            "log_max_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

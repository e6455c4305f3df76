//! Configuration module for the bootstrap sequencer.
//!
//! Every path and program the sequence touches is configurable, but the
//! literal defaults reproduce the stock image layout exactly.
//!
//! # Module Structure
//!
//! - `loader`: Loads the optional TOML configuration file
//! - `validator`: Validates identifiers, paths and commands before anything runs
//!
//! # Configuration Flow
//!
//! 1. Start from `BootstrapConfig::default()`
//! 2. If `WAN_BOOTSTRAP_CONFIG` names a file, load it (missing keys keep defaults)
//! 3. Apply `WAN_BOOTSTRAP_*` environment overrides
//! 4. Read the hub credential from `HF_TOKEN`
//! 5. Validate the result

pub mod loader;
pub mod validator;

use crate::error::ConfigError;
use crate::models::{Credential, StagingLayout};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of every override variable.
pub const ENV_PREFIX: &str = "WAN_BOOTSTRAP_";

/// Variable holding the hub credential.
pub const TOKEN_VAR: &str = "HF_TOKEN";

/// Default hub CLI.
pub const DEFAULT_HUB_PROGRAM: &str = "huggingface-cli";

/// Default handoff command when the caller supplies none.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Rotate log files at 10 MiB.
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Rotated log files kept per stream.
pub const DEFAULT_LOG_BACKUPS: usize = 5;

/// Resolved bootstrap configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Hub CLI invocation prefix; `login`/`download` arguments are appended
    pub hub_command: Vec<String>,

    /// Workload argv used when the caller supplies none
    pub default_command: Vec<String>,

    pub log_dir: PathBuf,
    pub log_to_file: bool,
    pub log_level: String,
    pub log_max_bytes: u64,
    pub log_backups: usize,

    /// Log the steps instead of performing them
    pub dry_run: bool,

    /// Checkpoints and the layout they are staged into
    pub layout: StagingLayout,

    /// Never read from or written to the config file
    #[serde(skip)]
    pub credential: Option<Credential>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            hub_command: vec![DEFAULT_HUB_PROGRAM.to_string()],
            default_command: vec![DEFAULT_SHELL.to_string()],
            log_dir: PathBuf::from("logs"),
            log_to_file: true,
            log_level: "info".to_string(),
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            log_backups: DEFAULT_LOG_BACKUPS,
            dry_run: false,
            layout: StagingLayout::default(),
            credential: None,
        }
    }
}

/// `WAN_BOOTSTRAP_*` variables, keys lowercased with the prefix stripped.
#[derive(Deserialize, Debug, Default)]
struct EnvOverrides {
    config: Option<PathBuf>,
    hub_command: Option<String>,
    default_command: Option<String>,
    log_dir: Option<PathBuf>,
    log_to_file: Option<String>,
    log_level: Option<String>,
    dry_run: Option<String>,
}

impl EnvOverrides {
    fn apply(self, config: &mut BootstrapConfig) {
        if let Some(hub_command) = self.hub_command {
            config.hub_command = split_command(&hub_command);
        }
        if let Some(default_command) = self.default_command {
            config.default_command = split_command(&default_command);
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(log_to_file) = self.log_to_file {
            config.log_to_file = flag_enabled(&log_to_file);
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = flag_enabled(&dry_run);
        }
    }
}

impl BootstrapConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Non-UTF-8 variables cannot be ours; skip them rather than panic.
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Resolve configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars.iter().cloned())?;

        let mut config = match &overrides.config {
            Some(path) => loader::load_config_from_file(path)?,
            None => BootstrapConfig::default(),
        };
        overrides.apply(&mut config);

        config.credential = vars
            .iter()
            .find(|(key, _)| key == TOKEN_VAR)
            .and_then(|(_, value)| Credential::new(value.clone()));

        validator::validate_config(&config)?;
        Ok(config)
    }

    /// Log level as a filter. Falls back to `Info` for unvalidated configs.
    pub fn level_filter(&self) -> LevelFilter {
        validator::parse_log_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    /// Program name of the hub CLI, for messages.
    pub fn hub_program(&self) -> &str {
        self.hub_command
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_HUB_PROGRAM)
    }
}

/// Split a command override on whitespace. No quoting support.
pub fn split_command(value: &str) -> Vec<String> {
    value.split_whitespace().map(String::from).collect()
}

/// Flag variables are on unless empty or an explicit "off" spelling.
pub fn flag_enabled(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

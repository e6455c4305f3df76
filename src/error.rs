//! Unified error type hierarchy for the bootstrap sequencer
//!
//! Provides structured error handling with ConfigError, HubError, RelocateError,
//! HandoffError and the top-level BootstrapError. Every error ends the bootstrap;
//! `BootstrapError::exit_code` decides the status the container exits with.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::orchestrator::state::BootstrapPhase;

/// Exit status for configuration problems detected before any step runs.
pub const EXIT_CONFIG: i32 = 2;

/// Exit status for a failed relocation (matches `mv`).
pub const EXIT_RELOCATE: i32 = 1;

/// Command found but not executable (shell convention).
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Command not found (shell convention).
pub const EXIT_NOT_FOUND: i32 = 127;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Invalid environment override: {0}")]
    InvalidEnv(#[from] envy::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Failures of the external hub program (login or download).
#[derive(Error, Debug)]
pub enum HubError {
    /// The program ran and exited non-zero (or was killed by a signal).
    #[error("'{command}' exited with status {status}")]
    CommandFailed { command: String, status: i32 },

    /// The program could not be started at all.
    #[error("Failed to launch hub program '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl HubError {
    /// Status to propagate: the tool's own exit code, or the shell's
    /// 127/126 convention when it never started.
    pub fn exit_code(&self) -> i32 {
        match self {
            HubError::CommandFailed { status, .. } => *status,
            HubError::Spawn { source, .. } => spawn_exit_code(source),
        }
    }
}

/// Checkpoint directory move errors.
#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {} across filesystems: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Process replacement errors. Only returned when exec did not happen.
#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("No command to hand off to")]
    EmptyCommand,

    #[error("Command argument contains an interior NUL byte: {0:?}")]
    InvalidArgument(String),

    #[error("Failed to exec '{program}': {errno}")]
    Exec {
        program: String,
        errno: nix::errno::Errno,
    },
}

impl HandoffError {
    pub fn exit_code(&self) -> i32 {
        match self {
            HandoffError::EmptyCommand => EXIT_CONFIG,
            HandoffError::InvalidArgument(_) => EXIT_NOT_EXECUTABLE,
            HandoffError::Exec { errno, .. } => match errno {
                nix::errno::Errno::ENOENT => EXIT_NOT_FOUND,
                _ => EXIT_NOT_EXECUTABLE,
            },
        }
    }
}

/// Global error type for the bootstrap sequence.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{phase} phase failed: {source}")]
    Hub {
        phase: BootstrapPhase,
        #[source]
        source: HubError,
    },

    #[error("relocation phase failed: {0}")]
    Relocate(#[from] RelocateError),

    #[error("handoff phase failed: {0}")]
    Handoff(#[from] HandoffError),
}

impl BootstrapError {
    /// Phase the sequence was in when it failed, if it got that far.
    pub fn phase(&self) -> Option<BootstrapPhase> {
        match self {
            BootstrapError::Config(_) => None,
            BootstrapError::Hub { phase, .. } => Some(*phase),
            BootstrapError::Relocate(_) => Some(BootstrapPhase::Relocation),
            BootstrapError::Handoff(_) => Some(BootstrapPhase::Handoff),
        }
    }

    /// Process exit status for this failure. Never zero.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            BootstrapError::Config(_) => EXIT_CONFIG,
            BootstrapError::Hub { source, .. } => source.exit_code(),
            BootstrapError::Relocate(_) => EXIT_RELOCATE,
            BootstrapError::Handoff(e) => e.exit_code(),
        };
        if code == 0 {
            1
        } else {
            code
        }
    }

    /// Get a user-facing error message suitable for the container log
    pub fn user_message(&self) -> String {
        match self {
            BootstrapError::Config(e) => format!("Invalid bootstrap configuration: {}", e),
            BootstrapError::Hub { phase, source } => {
                format!("Hub {} failed: {}", phase.as_str(), source)
            }
            BootstrapError::Relocate(e) => format!("Could not stage checkpoint layout: {}", e),
            BootstrapError::Handoff(e) => format!("Could not start workload: {}", e),
        }
    }
}

fn spawn_exit_code(e: &io::Error) -> i32 {
    match e.kind() {
        io::ErrorKind::NotFound => EXIT_NOT_FOUND,
        _ => EXIT_NOT_EXECUTABLE,
    }
}

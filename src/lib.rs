//! Wan2.2 Animate container bootstrap
//!
//! This crate stages the model checkpoints a Wan2.2 Animate container needs
//! and then hands the process over to the workload command. It runs as the
//! image entrypoint, so the workload keeps PID 1 and receives signals directly.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy and exit status mapping
//! - **models**: Checkpoint, layout and credential types
//! - **config**: Defaults, optional TOML file, `WAN_BOOTSTRAP_*` overrides (validated)
//! - **hub**: Model hub access through the hub CLI
//! - **orchestrator**: The phase sequence (login, downloads, relocation, handoff)
//! - **system**: Exit status helpers and exec-based process handoff
//! - **log_collector**: Console echo plus rotated on-disk logs

// Core foundational modules
pub mod error;
pub mod models;

// Configuration management module
pub mod config;

// Hub CLI seam
pub mod hub;

// Robust, decoupled logging system
pub mod log_collector;

// Phases 1-5: bootstrap sequencing
pub mod orchestrator;

// OS wrappers: exit statuses and exec
pub mod system;

// Re-export the log crate for macro usage
pub use log;

pub use config::BootstrapConfig;
pub use error::{BootstrapError, ConfigError, HandoffError, HubError, RelocateError};
pub use hub::{CliHub, HubClient};
pub use log_collector::{LogCollector, LogLine, RotationPolicy};
pub use models::{CheckpointSpec, Credential, StagingLayout, StagingReport};
pub use orchestrator::{Bootstrap, BootstrapPhase};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

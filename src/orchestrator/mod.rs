//! Bootstrap orchestration: 5-phase linear sequence (Authentication -> DownloadPrimary -> DownloadAuxiliary -> Relocation -> Handoff).
//!
//! Any failing phase ends the sequence. Nothing is retried and nothing is
//! rolled back; the error carries the status the process should exit with.

pub mod phases;
pub mod state;

pub use phases::{authenticate, fetch_checkpoint, relocate_checkpoint};
pub use state::BootstrapPhase;

use crate::config::BootstrapConfig;
use crate::error::BootstrapError;
use crate::hub::HubClient;
use crate::log_collector::LogCollector;
use crate::log_parsed;
use crate::models::StagingReport;
use crate::system::{exec_handoff, HandoffCommand};
use std::convert::Infallible;
use std::ffi::OsString;

/// Drives the bootstrap phases against a [`HubClient`].
pub struct Bootstrap<H: HubClient> {
    config: BootstrapConfig,
    hub: H,

    /// Flushed before handoff and before a failure is returned
    log_collector: Option<LogCollector>,

    phase: BootstrapPhase,
}

impl<H: HubClient> Bootstrap<H> {
    pub fn new(config: BootstrapConfig, hub: H) -> Self {
        Bootstrap {
            config,
            hub,
            log_collector: None,
            phase: BootstrapPhase::Pending,
        }
    }

    pub fn with_log_collector(mut self, log_collector: LogCollector) -> Self {
        self.log_collector = Some(log_collector);
        self
    }

    pub fn current_phase(&self) -> BootstrapPhase {
        self.phase
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    fn enter(&mut self, next: BootstrapPhase) {
        if !self.phase.can_transition_to(next) {
            log::warn!(
                "[Bootstrap] Unexpected phase transition {} -> {}",
                self.phase,
                next
            );
        }
        self.phase = next;

        if let Some(n) = next.ordinal() {
            log::info!("[phase {}/{}] {}", n, BootstrapPhase::COUNT, next);
        }
    }

    fn fail(&mut self, err: BootstrapError) -> BootstrapError {
        log::error!("[Bootstrap] {}", err.user_message());
        self.phase = BootstrapPhase::Failed;
        self.flush_logs();
        err
    }

    fn flush_logs(&self) {
        if let Some(collector) = &self.log_collector {
            if let Err(e) = collector.wait_for_empty() {
                log::warn!("[Bootstrap] Log flush failed: {}", e);
            }
        }
    }

    /// Run phases 1-4: login, both downloads, relocation.
    pub fn stage(&mut self) -> Result<StagingReport, BootstrapError> {
        match self.stage_inner() {
            Ok(report) => Ok(report),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn stage_inner(&mut self) -> Result<StagingReport, BootstrapError> {
        if self.config.dry_run {
            return Ok(self.plan());
        }

        let mut report = StagingReport::default();

        self.enter(BootstrapPhase::Authentication);
        report.authenticated = authenticate(&self.hub, self.config.credential.as_ref())
            .map_err(|source| BootstrapError::Hub {
                phase: BootstrapPhase::Authentication,
                source,
            })?;

        let layout = self.config.layout.clone();
        for (phase, checkpoint) in [BootstrapPhase::DownloadPrimary, BootstrapPhase::DownloadAuxiliary]
            .into_iter()
            .zip(layout.checkpoints())
        {
            self.enter(phase);
            fetch_checkpoint(&self.hub, checkpoint)
                .map_err(|source| BootstrapError::Hub { phase, source })?;
            report.downloaded.push(checkpoint.clone());
        }

        self.enter(BootstrapPhase::Relocation);
        let staged = relocate_checkpoint(layout.relocation_source(), &layout.relocation_target())?;
        report.relocated_to = Some(staged);

        Ok(report)
    }

    /// Log what staging would do without touching the hub or the filesystem.
    fn plan(&mut self) -> StagingReport {
        let layout = self.config.layout.clone();
        log::info!("[Bootstrap] Dry run: no hub calls, no filesystem changes");

        self.enter(BootstrapPhase::Authentication);
        match &self.config.credential {
            Some(_) => log::info!("[dry-run] would log in to the model hub with HF_TOKEN"),
            None => log::info!("[dry-run] HF_TOKEN not set, would skip hub login"),
        }
        for (phase, checkpoint) in [BootstrapPhase::DownloadPrimary, BootstrapPhase::DownloadAuxiliary]
            .into_iter()
            .zip(layout.checkpoints())
        {
            self.enter(phase);
            log::info!("[dry-run] would download {}", checkpoint);
        }

        self.enter(BootstrapPhase::Relocation);
        log::info!(
            "[dry-run] would move {} to (or into) {}",
            layout.relocation_source().display(),
            layout.relocation_target().display()
        );

        StagingReport {
            dry_run: true,
            ..StagingReport::default()
        }
    }

    /// Stage, then replace this process with the workload.
    ///
    /// `args` is the caller's trailing argv; empty means the configured
    /// default command. Returns only on failure.
    pub fn run(mut self, args: Vec<OsString>) -> Result<Infallible, BootstrapError> {
        let report = self.stage()?;
        if !report.dry_run {
            log_parsed!(
                "Staging complete: {} checkpoint(s), auxiliary at {}",
                report.downloaded.len(),
                report
                    .relocated_to
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
        }

        self.enter(BootstrapPhase::Handoff);
        let command = match HandoffCommand::resolve(args, &self.config.default_command) {
            Ok(command) => command,
            Err(e) => return Err(self.fail(e.into())),
        };

        log_parsed!("Handing off to: {}", command.display());
        self.flush_logs();

        match exec_handoff(&command) {
            Ok(never) => match never {},
            Err(e) => Err(self.fail(e.into())),
        }
    }
}

//! Bootstrap phase tracking.
//!
//! The sequence is linear: each phase has exactly one successor, and any
//! phase may fall into `Failed`. There is no recovery edge.

use std::fmt;

/// Discrete phases of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapPhase {
    /// Nothing has run yet
    Pending,

    /// Phase 1: optional hub login
    Authentication,

    /// Phase 2: primary checkpoint download
    DownloadPrimary,

    /// Phase 3: auxiliary checkpoint download
    DownloadAuxiliary,

    /// Phase 4: move the auxiliary checkpoint under the primary one
    Relocation,

    /// Phase 5: exec the workload command
    Handoff,

    /// A phase failed; the process is about to exit
    Failed,
}

impl BootstrapPhase {
    /// Number of real phases (excluding Pending and Failed).
    pub const COUNT: usize = 5;

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapPhase::Pending => "pending",
            BootstrapPhase::Authentication => "authentication",
            BootstrapPhase::DownloadPrimary => "download-primary",
            BootstrapPhase::DownloadAuxiliary => "download-auxiliary",
            BootstrapPhase::Relocation => "relocation",
            BootstrapPhase::Handoff => "handoff",
            BootstrapPhase::Failed => "failed",
        }
    }

    /// 1-based position in the sequence, for `[phase n/5]` log prefixes.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            BootstrapPhase::Authentication => Some(1),
            BootstrapPhase::DownloadPrimary => Some(2),
            BootstrapPhase::DownloadAuxiliary => Some(3),
            BootstrapPhase::Relocation => Some(4),
            BootstrapPhase::Handoff => Some(5),
            BootstrapPhase::Pending | BootstrapPhase::Failed => None,
        }
    }

    pub fn valid_next_phases(&self) -> Vec<BootstrapPhase> {
        match self {
            BootstrapPhase::Pending => vec![BootstrapPhase::Authentication, BootstrapPhase::Failed],
            BootstrapPhase::Authentication => {
                vec![BootstrapPhase::DownloadPrimary, BootstrapPhase::Failed]
            }
            BootstrapPhase::DownloadPrimary => {
                vec![BootstrapPhase::DownloadAuxiliary, BootstrapPhase::Failed]
            }
            BootstrapPhase::DownloadAuxiliary => {
                vec![BootstrapPhase::Relocation, BootstrapPhase::Failed]
            }
            BootstrapPhase::Relocation => vec![BootstrapPhase::Handoff, BootstrapPhase::Failed],
            BootstrapPhase::Handoff => vec![BootstrapPhase::Failed],
            BootstrapPhase::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, next: BootstrapPhase) -> bool {
        self.valid_next_phases().contains(&next)
    }
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Model hub access.
//!
//! The sequencer never talks to the hub itself; it drives an external CLI
//! through the [`HubClient`] seam so tests can substitute a recording fake.

pub mod cli;

pub use cli::CliHub;

use crate::error::HubError;
use crate::models::{CheckpointSpec, Credential};

/// Operations the bootstrap needs from the hub.
pub trait HubClient: Send + Sync {
    /// Authenticate with a bearer token. The CLI caches it on disk.
    fn login(&self, credential: &Credential) -> Result<(), HubError>;

    /// Fetch a checkpoint into `checkpoint.local_dir`.
    fn download(&self, checkpoint: &CheckpointSpec) -> Result<(), HubError>;
}

impl<T: HubClient + ?Sized> HubClient for &T {
    fn login(&self, credential: &Credential) -> Result<(), HubError> {
        (**self).login(credential)
    }

    fn download(&self, checkpoint: &CheckpointSpec) -> Result<(), HubError> {
        (**self).download(checkpoint)
    }
}

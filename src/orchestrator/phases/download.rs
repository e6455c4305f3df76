//! Phases 2-3: Download - fetch one checkpoint. No retry, no verification.

use crate::error::HubError;
use crate::hub::HubClient;
use crate::log_parsed;
use crate::models::CheckpointSpec;

pub fn fetch_checkpoint<H: HubClient>(hub: &H, checkpoint: &CheckpointSpec) -> Result<(), HubError> {
    log::info!(
        "Downloading {} to {}",
        checkpoint.repo_id,
        checkpoint.local_dir.display()
    );

    hub.download(checkpoint)?;

    log_parsed!("Downloaded {}", checkpoint);
    Ok(())
}

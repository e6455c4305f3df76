//! Phase 1: Authentication - hub login when a credential is available.

use crate::error::HubError;
use crate::hub::HubClient;
use crate::log_parsed;
use crate::models::Credential;

/// Log in when `credential` is present; otherwise note the reduced access
/// and carry on.
///
/// # Returns
/// * `Ok(true)` if a login was performed
/// * `Ok(false)` if there was no credential
/// * `Err(HubError)` if the login tool failed
pub fn authenticate<H: HubClient>(
    hub: &H,
    credential: Option<&Credential>,
) -> Result<bool, HubError> {
    match credential {
        Some(credential) => {
            log::info!("HF_TOKEN found, logging in to the model hub");
            hub.login(credential)?;
            log_parsed!("Hub login succeeded");
            Ok(true)
        }
        None => {
            log::info!(
                "HF_TOKEN not set, continuing without hub login (gated checkpoints may fail to download)"
            );
            Ok(false)
        }
    }
}

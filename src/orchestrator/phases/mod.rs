//! Bootstrap phases: one module per stage of the staging pipeline.
//!
//! - **Phase 1: Authentication** (`auth`) - optional hub login
//! - **Phases 2-3: Download** (`download`) - checkpoint fetches, primary first
//! - **Phase 4: Relocation** (`relocate`) - nest the auxiliary checkpoint
//!
//! Phase 5 (handoff) lives in `crate::system`, since it never returns.

pub mod auth;
pub mod download;
pub mod relocate;

pub use auth::authenticate;
pub use download::fetch_checkpoint;
pub use relocate::relocate_checkpoint;

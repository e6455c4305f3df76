//! Core data structures: checkpoints, the staged layout and the hub credential.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Registry identifier of the primary (animation) checkpoint.
pub const PRIMARY_REPO_ID: &str = "Wan-AI/Wan2.2-Animate-14B";

/// Local directory the primary checkpoint is downloaded into.
pub const PRIMARY_LOCAL_DIR: &str = "./Wan2.2-Animate-14B";

/// Registry identifier of the auxiliary (preprocessing) checkpoint.
pub const AUXILIARY_REPO_ID: &str = "black-forest-labs/FLUX.1-Kontext-dev";

/// Local directory the auxiliary checkpoint is downloaded into before relocation.
pub const AUXILIARY_LOCAL_DIR: &str = "./FLUX.1-Kontext-dev";

/// Subdirectory of the primary checkpoint that receives the auxiliary one.
pub const NESTED_SUBDIR: &str = "process_checkpoint";

/// A checkpoint fetched from the hub into a local directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointSpec {
    /// Registry identifier, `owner/name`
    pub repo_id: String,

    /// Destination directory handed to the download tool
    pub local_dir: PathBuf,
}

impl CheckpointSpec {
    pub fn new(repo_id: impl Into<String>, local_dir: impl Into<PathBuf>) -> Self {
        CheckpointSpec {
            repo_id: repo_id.into(),
            local_dir: local_dir.into(),
        }
    }

    pub fn primary() -> Self {
        Self::new(PRIMARY_REPO_ID, PRIMARY_LOCAL_DIR)
    }

    pub fn auxiliary() -> Self {
        Self::new(AUXILIARY_REPO_ID, AUXILIARY_LOCAL_DIR)
    }
}

impl fmt::Display for CheckpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.repo_id, self.local_dir.display())
    }
}

/// On-disk layout produced by staging: the primary checkpoint with the
/// auxiliary checkpoint moved into `nested_subdir` beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingLayout {
    pub nested_subdir: String,
    pub primary: CheckpointSpec,
    pub auxiliary: CheckpointSpec,
}

impl Default for StagingLayout {
    fn default() -> Self {
        StagingLayout {
            nested_subdir: NESTED_SUBDIR.to_string(),
            primary: CheckpointSpec::primary(),
            auxiliary: CheckpointSpec::auxiliary(),
        }
    }
}

impl StagingLayout {
    /// Download order: primary first.
    pub fn checkpoints(&self) -> [&CheckpointSpec; 2] {
        [&self.primary, &self.auxiliary]
    }

    /// Where the auxiliary checkpoint ends up.
    pub fn relocation_target(&self) -> PathBuf {
        self.primary.local_dir.join(&self.nested_subdir)
    }

    /// Where the auxiliary checkpoint is moved from.
    pub fn relocation_source(&self) -> &Path {
        &self.auxiliary.local_dir
    }
}

/// Hub bearer token. Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Empty tokens count as absent.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Credential(token))
        }
    }

    /// The raw token, for handing to the login tool only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// What staging did, reported before handoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    /// Hub login was performed
    pub authenticated: bool,

    /// Checkpoints downloaded, in order
    pub downloaded: Vec<CheckpointSpec>,

    /// Final location of the auxiliary checkpoint
    pub relocated_to: Option<PathBuf>,

    /// Steps were only logged, not performed
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_uses_literal_paths() {
        let layout = StagingLayout::default();
        assert_eq!(layout.primary.repo_id, "Wan-AI/Wan2.2-Animate-14B");
        assert_eq!(layout.primary.local_dir, PathBuf::from("./Wan2.2-Animate-14B"));
        assert_eq!(layout.auxiliary.local_dir, PathBuf::from("./FLUX.1-Kontext-dev"));
        assert_eq!(
            layout.relocation_target(),
            PathBuf::from("./Wan2.2-Animate-14B/process_checkpoint")
        );
        assert_eq!(layout.relocation_source(), Path::new("./FLUX.1-Kontext-dev"));
    }

    #[test]
    fn test_checkpoints_primary_first() {
        let layout = StagingLayout::default();
        let [first, second] = layout.checkpoints();
        assert_eq!(first, &layout.primary);
        assert_eq!(second, &layout.auxiliary);
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert!(Credential::new("").is_none());
        assert_eq!(Credential::new("abc").map(|c| c.expose().to_string()), Some("abc".to_string()));
    }

    #[test]
    fn test_credential_is_redacted() {
        let cred = Credential::new("hf_secret").unwrap();
        assert!(!format!("{:?}", cred).contains("hf_secret"));
        assert!(!format!("{}", cred).contains("hf_secret"));
    }

    #[test]
    fn test_checkpoint_display() {
        let spec = CheckpointSpec::new("a/b", "./b");
        assert_eq!(spec.to_string(), "a/b -> ./b");
    }

    proptest::proptest! {
        #[test]
        fn prop_token_never_formatted(token in "hf_[A-Za-z0-9]{8,32}") {
            let cred = Credential::new(token.clone()).unwrap();
            let debug = format!("{:?}", cred);
            let shown = cred.to_string();
            proptest::prop_assert!(!debug.contains(&token));
            proptest::prop_assert!(!shown.contains(&token));
            proptest::prop_assert_eq!(cred.expose(), token.as_str());
        }
    }
}

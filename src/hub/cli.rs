//! Hub access through the `huggingface-cli` program.
//!
//! Commands inherit stdio so the tool's own progress bars land in the
//! container log. Only the exit status is inspected.

use super::HubClient;
use crate::config::DEFAULT_HUB_PROGRAM;
use crate::error::HubError;
use crate::models::{CheckpointSpec, Credential};
use crate::system::exit_status_code;
use std::process::Command;

/// [`HubClient`] that shells out to a hub CLI.
#[derive(Debug, Clone)]
pub struct CliHub {
    program: String,
    prefix_args: Vec<String>,
}

impl CliHub {
    /// `command` is the invocation prefix, e.g. `["huggingface-cli"]` or
    /// `["python", "-m", "huggingface_hub.commands.huggingface_cli"]`.
    pub fn new(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, rest)) if !program.is_empty() => CliHub {
                program: program.clone(),
                prefix_args: rest.to_vec(),
            },
            _ => CliHub {
                program: DEFAULT_HUB_PROGRAM.to_string(),
                prefix_args: Vec::new(),
            },
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args);
        cmd
    }

    fn display_prefix(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.prefix_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion. `display` is what appears in logs and errors and
    /// must not contain secrets.
    fn run(&self, mut command: Command, display: String) -> Result<(), HubError> {
        log::debug!("[Hub] Running: {}", display);

        let status = command.status().map_err(|source| HubError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            log::debug!("[Hub] '{}' completed", display);
            Ok(())
        } else {
            Err(HubError::CommandFailed {
                command: display,
                status: exit_status_code(&status),
            })
        }
    }
}

impl HubClient for CliHub {
    fn login(&self, credential: &Credential) -> Result<(), HubError> {
        let mut cmd = self.base_command();
        cmd.arg("login").arg("--token").arg(credential.expose());

        // Display impl of Credential is redacted
        let display = format!("{} login --token {}", self.display_prefix(), credential);
        self.run(cmd, display)
    }

    fn download(&self, checkpoint: &CheckpointSpec) -> Result<(), HubError> {
        let mut cmd = self.base_command();
        cmd.arg("download")
            .arg(&checkpoint.repo_id)
            .arg("--local-dir")
            .arg(&checkpoint.local_dir);

        let display = format!(
            "{} download {} --local-dir {}",
            self.display_prefix(),
            checkpoint.repo_id,
            checkpoint.local_dir.display()
        );
        self.run(cmd, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_NOT_FOUND;
    use std::fs;
    use tempfile::TempDir;

    /// `sh -c <script> <arg0>`; hub arguments follow as `$1..`.
    fn sh_hub(script: &str, arg0: &str) -> CliHub {
        CliHub::new(&[
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            arg0.to_string(),
        ])
    }

    #[test]
    fn test_download_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("argv");
        let hub = sh_hub(r#"printf '%s\n' "$@" > "$0""#, out.to_str().unwrap());

        hub.download(&CheckpointSpec::new("Wan-AI/Wan2.2-Animate-14B", "./Wan2.2-Animate-14B"))
            .unwrap();

        let argv = fs::read_to_string(&out).unwrap();
        assert_eq!(
            argv.lines().collect::<Vec<_>>(),
            vec!["download", "Wan-AI/Wan2.2-Animate-14B", "--local-dir", "./Wan2.2-Animate-14B"]
        );
    }

    #[test]
    fn test_login_passes_raw_token() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("argv");
        let hub = sh_hub(r#"printf '%s\n' "$@" > "$0""#, out.to_str().unwrap());

        hub.login(&Credential::new("abc").unwrap()).unwrap();

        let argv = fs::read_to_string(&out).unwrap();
        assert_eq!(argv.lines().collect::<Vec<_>>(), vec!["login", "--token", "abc"]);
    }

    #[test]
    fn test_failure_status_propagated_and_token_redacted() {
        let hub = sh_hub("exit 7", "hub");
        let err = hub.login(&Credential::new("hf_secret").unwrap()).unwrap_err();

        match &err {
            HubError::CommandFailed { command, status } => {
                assert_eq!(*status, 7);
                assert!(!command.contains("hf_secret"));
                assert!(command.contains("login --token <redacted>"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.to_string().contains("hf_secret"));
    }

    #[test]
    fn test_signal_maps_to_128_plus_signo() {
        let hub = sh_hub("kill -TERM $$", "hub");
        let err = hub.download(&CheckpointSpec::new("a/b", "b")).unwrap_err();
        assert_eq!(err.exit_code(), 128 + libc::SIGTERM);
    }

    #[test]
    fn test_missing_program() {
        let hub = CliHub::new(&["/nonexistent/huggingface-cli".to_string()]);
        let err = hub.download(&CheckpointSpec::new("a/b", "b")).unwrap_err();
        assert!(matches!(err, HubError::Spawn { .. }));
        assert_eq!(err.exit_code(), EXIT_NOT_FOUND);
    }

    #[test]
    fn test_empty_command_falls_back_to_default() {
        assert_eq!(CliHub::new(&[]).program(), "huggingface-cli");
    }
}

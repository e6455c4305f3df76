/// System module: exit status mapping and process handoff (exec, no fork)

use crate::error::HandoffError;
use nix::sys::signal::{self, SigHandler, Signal};
use std::convert::Infallible;
use std::ffi::{CString, OsString};
use std::io::Write;
use std::os::unix::ffi::OsStringExt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Exit code for a finished child, `128 + signo` when it was killed by a signal.
pub fn exit_status_code(status: &ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signo)) => 128 + signo,
        (None, None) => 1,
    }
}

/// The workload argv, already converted for `execvp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffCommand {
    argv: Vec<CString>,
}

impl HandoffCommand {
    /// Use the caller's arguments verbatim, or `default` when there are none.
    pub fn resolve(args: Vec<OsString>, default: &[String]) -> Result<Self, HandoffError> {
        let args = if args.is_empty() {
            default.iter().map(OsString::from).collect()
        } else {
            args
        };

        if args.is_empty() {
            return Err(HandoffError::EmptyCommand);
        }

        let argv = args
            .into_iter()
            .map(|arg| {
                CString::new(arg.into_vec()).map_err(|e| {
                    HandoffError::InvalidArgument(
                        String::from_utf8_lossy(&e.into_vec()).into_owned(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HandoffCommand { argv })
    }

    /// Program name (first argv element), for messages.
    pub fn program(&self) -> String {
        self.argv
            .first()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn argv(&self) -> &[CString] {
        &self.argv
    }

    /// Space-joined argv for logs.
    pub fn display(&self) -> String {
        self.argv
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Replace the current process image with `command`. PATH lookup as in a shell.
///
/// Returns only on failure. SIGPIPE is reset to its default disposition first,
/// since the Rust runtime ignores it and ignored signals survive exec.
pub fn exec_handoff(command: &HandoffCommand) -> Result<Infallible, HandoffError> {
    let program = command.argv.first().ok_or(HandoffError::EmptyCommand)?;

    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    // SAFETY: restoring SIG_DFL installs no Rust handler; nothing runs concurrently
    // with this that depends on SIGPIPE being ignored.
    unsafe {
        let _ = signal::signal(Signal::SIGPIPE, SigHandler::SigDfl);
    }

    let errno = match nix::unistd::execvp(program.as_c_str(), &command.argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };

    Err(HandoffError::Exec {
        program: command.program(),
        errno,
    })
}

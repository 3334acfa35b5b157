//! Error types for command execution and signal forwarding.
//!
//! Every `ExecError` carries the `Location` of the `run_shell_command` call
//! that produced it, so a failure deep inside a tool can be traced back to the
//! call site without losing the OS-level cause (`source()`).

use std::io;
use std::os::raw::c_int;
use std::panic::Location;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure of a single `run_shell_command` call.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started (missing binary, permission denied, bad cwd).
    #[error("failed to launch `{program}` (called at {location})")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
        location: &'static Location<'static>,
    },
    /// The child started but waiting on it failed.
    #[error("failed to wait for `{program}` (called at {location})")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
        location: &'static Location<'static>,
    },
    /// The child ran and exited unsuccessfully.
    #[error("`{program}` {} (called at {location})", describe_status(.status))]
    Exit {
        program: String,
        status: ExitStatus,
        location: &'static Location<'static>,
    },
    /// The signal subscription could not be registered; the child was not started.
    #[error("failed to register signal relay (called at {location})")]
    SignalSetup {
        #[source]
        source: io::Error,
        location: &'static Location<'static>,
    },
}

impl ExecError {
    /// Call site of the `run_shell_command` invocation that failed.
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            ExecError::Launch { location, .. }
            | ExecError::Wait { location, .. }
            | ExecError::Exit { location, .. }
            | ExecError::SignalSetup { location, .. } => location,
        }
    }

    /// Exit status of the child, if it ran to completion.
    pub fn status(&self) -> Option<ExitStatus> {
        match self {
            ExecError::Exit { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Exit code of the child, if it exited normally with a non-zero code.
    pub fn exit_code(&self) -> Option<i32> {
        self.status().and_then(|s| s.code())
    }

    /// Signal that terminated the child, if any.
    pub fn terminating_signal(&self) -> Option<c_int> {
        self.status().and_then(status_signal)
    }
}

#[cfg(unix)]
fn status_signal(status: ExitStatus) -> Option<c_int> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn status_signal(_status: ExitStatus) -> Option<c_int> {
    None
}

fn describe_status(status: &ExitStatus) -> String {
    match (status.code(), status_signal(*status)) {
        (Some(code), _) => format!("exited with status {code}"),
        (None, Some(sig)) => format!("was terminated by signal {sig}"),
        (None, None) => format!("exited abnormally ({status})"),
    }
}

/// Failure to deliver one relayed signal. Logged by the relay, never returned to callers.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("child process has not started yet")]
    NotStarted,
    #[error("child process has already exited")]
    Exited,
    #[error("signal {0} cannot be forwarded on this platform")]
    Unsupported(c_int),
    #[error("kill failed: {0}")]
    Os(#[source] io::Error),
}

//! Run one command to completion with signal relay.

use std::io;
use std::os::raw::c_int;
use std::panic::Location;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;

use tracing::{debug, info, info_span};

use crate::child::ChildHandle;
use crate::error::ExecError;
use crate::options::{ExecOptions, StdoutTarget};
use crate::signals::{SignalRelay, FORWARDED_SIGNALS};

/// Run `command` with `args`, attached to this process's stdio, and block
/// until it exits.
///
/// stdin and stderr are inherited. stdout is inherited only when `args` equals
/// `options.primary_args`, otherwise it is redirected to this process's
/// stderr. `FORWARDED_SIGNALS` received while the child runs are relayed to
/// it; the relay is stopped before this function returns on every path.
///
/// Errors carry the caller's location.
#[track_caller]
pub fn run_shell_command<S: AsRef<str>>(
    options: &ExecOptions,
    command: &str,
    args: &[S],
) -> Result<(), ExecError> {
    run_with_signals(options, command, args, FORWARDED_SIGNALS, Location::caller())
}

fn run_with_signals<S: AsRef<str>>(
    options: &ExecOptions,
    command: &str,
    args: &[S],
    signals: &[c_int],
    location: &'static Location<'static>,
) -> Result<(), ExecError> {
    let joined = args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
    let stdout = StdoutTarget::for_args(options, args);

    let span = info_span!("command", program = command);
    let _entered = span.enter();
    info!(stdout = stdout.as_str(), "Running command: {command} {joined}");

    let mut cmd = build_command(options, command, args, stdout);
    let child = Arc::new(ChildHandle::new());
    let _relay = SignalRelay::start(signals, Arc::clone(&child))
        .map_err(|source| ExecError::SignalSetup { source, location })?;

    let status = run_child(&mut cmd, &child, command, location)?;
    debug!(%status, "command finished");
    if status.success() {
        Ok(())
    } else {
        Err(ExecError::Exit {
            program: command.to_string(),
            status,
            location,
        })
    }
}

fn build_command<S: AsRef<str>>(
    options: &ExecOptions,
    command: &str,
    args: &[S],
    stdout: StdoutTarget,
) -> Command {
    let mut cmd = Command::new(command);
    cmd.args(args.iter().map(AsRef::as_ref))
        .stdin(Stdio::inherit())
        .stderr(Stdio::inherit());
    match stdout {
        StdoutTarget::Inherit => cmd.stdout(Stdio::inherit()),
        StdoutTarget::Stderr => cmd.stdout(std::io::stderr()),
    };
    if let Some(dir) = options.working_dir() {
        cmd.current_dir(dir);
    }
    cmd
}

/// Spawn, publish the pid to the relay's handle, wait, retract the pid, reap.
fn run_child(
    cmd: &mut Command,
    handle: &ChildHandle,
    program: &str,
    location: &'static Location<'static>,
) -> Result<ExitStatus, ExecError> {
    let mut child = cmd.spawn().map_err(|source| ExecError::Launch {
        program: program.to_string(),
        source,
        location,
    })?;
    let pid = child.id();
    handle.attach(pid);
    debug!(pid, "child started");

    // The pid stays reserved until the zombie is reaped, so retract it first.
    let waited = match await_exit(pid) {
        Ok(()) => {
            handle.mark_exited();
            child.wait()
        }
        Err(err) => {
            debug!(error = %err, "cannot wait without reaping, reaping directly");
            let waited = child.wait();
            handle.mark_exited();
            waited
        }
    };
    waited.map_err(|source| ExecError::Wait {
        program: program.to_string(),
        source,
        location,
    })
}

/// Block until `pid` has exited, leaving it unreaped.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn await_exit(pid: u32) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::wait::{waitid, Id, WaitPidFlag};
    use nix::unistd::Pid;

    let pid = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    loop {
        match waitid(Id::Pid(Pid::from_raw(pid)), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno.into()),
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn await_exit(_pid: u32) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

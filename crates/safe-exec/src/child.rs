//! Late-bound handle to the child process.
//!
//! The relay is started before the child is spawned, so the handle exists in a
//! `Pending` state first. The executor attaches the pid right after spawn and
//! marks the handle exited once the child has exited but before it is reaped,
//! while its pid is still reserved; signals are only delivered in between.

use std::os::raw::c_int;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::ForwardError;
use crate::signals::SignalTarget;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Pending,
    Running(u32),
    Exited,
}

/// Shared, signal-only view of one child process.
#[derive(Debug)]
pub struct ChildHandle {
    state: Mutex<State>,
}

impl Default for ChildHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildHandle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending),
        }
    }

    /// Record the OS pid of the freshly spawned child.
    pub fn attach(&self, pid: u32) {
        *self.lock() = State::Running(pid);
    }

    /// Stop accepting signals; called once the child has been waited on.
    pub fn mark_exited(&self) {
        *self.lock() = State::Exited;
    }

    /// Pid while the child is running.
    pub fn pid(&self) -> Option<u32> {
        match *self.lock() {
            State::Running(pid) => Some(pid),
            _ => None,
        }
    }

    // The state only holds plain values, a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SignalTarget for ChildHandle {
    fn send_signal(&self, signal: c_int) -> Result<(), ForwardError> {
        // Hold the lock across delivery so `mark_exited` cannot interleave.
        let state = self.lock();
        match *state {
            State::Pending => Err(ForwardError::NotStarted),
            State::Exited => Err(ForwardError::Exited),
            State::Running(pid) => deliver(pid, signal),
        }
    }
}

#[cfg(unix)]
fn deliver(pid: u32, signal: c_int) -> Result<(), ForwardError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let sig = Signal::try_from(signal).map_err(|_| ForwardError::Unsupported(signal))?;
    let pid = i32::try_from(pid).map_err(|_| ForwardError::Exited)?;
    kill(Pid::from_raw(pid), sig).map_err(|errno| ForwardError::Os(errno.into()))
}

#[cfg(not(unix))]
fn deliver(_pid: u32, signal: c_int) -> Result<(), ForwardError> {
    Err(ForwardError::Unsupported(signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_exited_handles_refuse_signals() {
        let handle = ChildHandle::new();
        assert!(handle.pid().is_none());
        assert!(matches!(handle.send_signal(2), Err(ForwardError::NotStarted)));
        handle.attach(4242);
        assert_eq!(handle.pid(), Some(4242));
        handle.mark_exited();
        assert!(handle.pid().is_none());
        assert!(matches!(handle.send_signal(2), Err(ForwardError::Exited)));
    }

    #[cfg(unix)]
    #[test]
    fn running_handle_delivers_to_live_child() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::Command;

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let handle = ChildHandle::new();
        handle.attach(child.id());
        handle
            .send_signal(nix::sys::signal::Signal::SIGTERM as c_int)
            .unwrap();
        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(nix::sys::signal::Signal::SIGTERM as c_int));
    }

    #[cfg(unix)]
    #[test]
    fn unknown_signal_number_is_unsupported() {
        let handle = ChildHandle::new();
        handle.attach(std::process::id());
        assert!(matches!(
            handle.send_signal(-5),
            Err(ForwardError::Unsupported(-5))
        ));
    }
}

//! Run one external command with live stdio and parent-to-child signal relay.
//!
//! Purpose
//! - Launch a program attached to this process's stdin/stdout/stderr, with
//!   stdout of auxiliary (non-primary) invocations routed to stderr.
//! - Forward `FORWARDED_SIGNALS` received by this process to the child for as
//!   long as the child runs, and tear the relay down exactly once.
//!
//! Layout
//! - `signals`: subscription + listener thread (`SignalRelay`).
//! - `child`: late-bound process handle the relay signals through.
//! - `options`: working directory, primary arguments, stdout routing.
//! - `exec`: `run_shell_command`, the single entry point.
//! - `error`: `ExecError` and `ForwardError`.

pub mod child;
pub mod error;
pub mod exec;
pub mod options;
pub mod signals;

pub use child::ChildHandle;
pub use error::{ExecError, ForwardError};
pub use exec::run_shell_command;
pub use options::{ExecOptions, StdoutTarget};
pub use signals::{active_listeners, SignalRelay, SignalTarget, FORWARDED_SIGNALS};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

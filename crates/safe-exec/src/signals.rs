//! Signal relay: parent-to-child forwarding of a fixed signal set.
//!
//! Model
//! - `SignalRelay::start` registers one `signal_hook` subscription and spawns
//!   one listener thread owning its receive side. Signals are forwarded one at
//!   a time in receipt order; bursts of the same signal may coalesce.
//! - `SignalRelay::stop` closes the subscription handle, which ends the
//!   listener's iteration, then joins the listener. The registration is
//!   dropped with the listener, so after `stop` returns nothing is subscribed
//!   and nothing more is forwarded. A second `stop` is a no-op; `Drop` stops.
//! - A signal landing between `close` and the listener's exit is swallowed:
//!   neither forwarded nor handled by its default disposition.
//! - Forwarding failures are logged and never end the relay.

use std::io;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::error::ForwardError;

/// Signals relayed from this process to the child.
#[cfg(unix)]
pub const FORWARDED_SIGNALS: &[c_int] = &[
    signal_hook::consts::signal::SIGINT,
    signal_hook::consts::signal::SIGTERM,
];
#[cfg(not(unix))]
pub const FORWARDED_SIGNALS: &[c_int] = &[];

static LIVE_LISTENERS: AtomicUsize = AtomicUsize::new(0);

/// Number of relay listener threads currently alive in this process.
pub fn active_listeners() -> usize {
    LIVE_LISTENERS.load(Ordering::SeqCst)
}

/// Anything a relay can deliver signals to.
pub trait SignalTarget: Send + Sync {
    fn send_signal(&self, signal: c_int) -> Result<(), ForwardError>;
}

/// Counts one live listener for as long as it is held.
struct ListenerSlot;

impl ListenerSlot {
    fn acquire() -> Self {
        LIVE_LISTENERS.fetch_add(1, Ordering::SeqCst);
        ListenerSlot
    }
}

impl Drop for ListenerSlot {
    fn drop(&mut self) {
        LIVE_LISTENERS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An active (or stopped) subscription plus its listener thread.
pub struct SignalRelay {
    #[cfg(unix)]
    handle: Option<signal_hook::iterator::Handle>,
    thread: Option<JoinHandle<()>>,
}

impl SignalRelay {
    /// Subscribe to `kinds` and forward every received signal to `target`.
    ///
    /// Logs from the listener are emitted inside the caller's current span.
    #[cfg(unix)]
    pub fn start<T>(kinds: &[c_int], target: Arc<T>) -> io::Result<Self>
    where
        T: SignalTarget + ?Sized + 'static,
    {
        use signal_hook::iterator::Signals;

        if kinds.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "signal relay needs at least one signal kind",
            ));
        }
        let signals = Signals::new(kinds)?;
        let handle = signals.handle();
        let span = tracing::Span::current();
        let slot = ListenerSlot::acquire();

        let spawned = thread::Builder::new()
            .name("signal-relay".into())
            .spawn(move || {
                let _slot = slot;
                let mut signals = signals;
                let _entered = span.enter();
                relay(signals.forever(), &*target);
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(err) => {
                handle.close();
                return Err(err);
            }
        };
        debug!(signals = ?signal_names(kinds), "signal relay started");

        Ok(Self {
            handle: Some(handle),
            thread: Some(thread),
        })
    }

    /// Without POSIX signals there is nothing to subscribe to; the relay is inert.
    #[cfg(not(unix))]
    pub fn start<T>(kinds: &[c_int], _target: Arc<T>) -> io::Result<Self>
    where
        T: SignalTarget + ?Sized + 'static,
    {
        debug!(signals = ?kinds, "signal relay unavailable on this platform");
        Ok(Self { thread: None })
    }

    /// Whether the listener has not been stopped yet.
    pub fn is_active(&self) -> bool {
        self.thread.is_some()
    }

    /// Unsubscribe and wait for the listener to exit. Safe to call repeatedly.
    pub fn stop(&mut self) {
        #[cfg(unix)]
        {
            if let Some(handle) = self.handle.take() {
                handle.close();
            }
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("signal relay listener panicked");
            }
            debug!("signal relay stopped");
        }
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Forward each signal in order until the source is exhausted.
fn relay<I, T>(signals: I, target: &T)
where
    I: IntoIterator<Item = c_int>,
    T: SignalTarget + ?Sized,
{
    for signal in signals {
        let name = signal_name(signal);
        info!(signal = %name, "forwarding signal to child");
        if let Err(err) = target.send_signal(signal) {
            warn!(signal = %name, error = %err, "error forwarding signal");
        }
    }
}

#[cfg(unix)]
fn signal_name(signal: c_int) -> String {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| signal.to_string())
}

#[cfg(not(unix))]
fn signal_name(signal: c_int) -> String {
    signal.to_string()
}

#[cfg(unix)]
fn signal_names(kinds: &[c_int]) -> Vec<String> {
    kinds.iter().copied().map(signal_name).collect()
}

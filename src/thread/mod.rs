//! Detached native threads.
//!
//! Threads started here are fire-and-forget: no handle survives the call,
//! so they can be neither joined nor cancelled. Use an
//! [`Event`](crate::sync::Event) to learn when one has finished its work.
//!
//! [`Builder`] configures the name and stack size of a new thread.

mod builder;

pub use builder::Builder;

use crate::error::Result;
use crate::sys::platform;
use crate::tracing_compat::trace;

use std::fmt;

/// Starts a detached thread running `entry(arg)`.
///
/// Shorthand for `Builder::new().start(entry, arg)`.
///
/// # Errors
///
/// Returns [`Error::Spawn`](crate::Error::Spawn) if the OS refuses to
/// create the thread. `entry` and `arg` are dropped in that case.
pub fn start<F, A>(entry: F, arg: A) -> Result<()>
where
    F: FnOnce(A) + Send + 'static,
    A: Send + 'static,
{
    Builder::new().start(entry, arg)
}

/// Starts a detached thread running the closure `f`.
///
/// # Example
/// ```rust
/// use nebula_sync::sync::Event;
/// use nebula_sync::thread;
/// use std::sync::Arc;
///
/// let done = Arc::new(Event::new().unwrap());
/// let signal = done.clone();
///
/// thread::spawn(move || {
///     signal.signal().unwrap();
/// })
/// .unwrap();
///
/// done.wait(5_000).unwrap();
/// ```
pub fn spawn<F>(f: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    Builder::new().spawn(f)
}

/// An opaque identifier of an OS thread.
///
/// Only meaningful for logging and equality checks; identifiers carry no
/// ordering and may be reused once a thread exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Returns the raw platform value (`pthread_t` or a Win32 thread id).
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Returns the identifier of the calling thread.
pub fn current_thread_id() -> ThreadId {
    ThreadId(platform::current_thread_id())
}

/// Outcome of [`set_current_thread_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStatus {
    /// The OS accepted the name.
    Applied,

    /// Naming is unavailable on this platform or was refused by the OS.
    /// The thread keeps running unnamed.
    Skipped,
}

/// Names the calling thread, best-effort.
///
/// Names are advisory and only show up in debuggers and OS tools. Names
/// longer than the platform limit are truncated, and anything after an
/// interior NUL is ignored. This never fails: when naming is unsupported
/// or refused, [`NameStatus::Skipped`] is returned.
pub fn set_current_thread_name(name: &str) -> NameStatus {
    if platform::set_current_thread_name(name) {
        NameStatus::Applied
    } else {
        trace!(name, "thread naming skipped");
        NameStatus::Skipped
    }
}

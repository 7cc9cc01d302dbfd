//! Error types for the synchronization primitives.
//!
//! Every operation reports its outcome to the immediate caller. Native
//! failure codes are preserved as [`io::Error`] values built from the raw
//! OS code, so [`Error::raw_os_error`] returns exactly what the platform
//! call produced. Codes are not normalized across platforms.

use std::fmt;
use std::io;
use thiserror::Error;

/// The native resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// A [`Mutex`](crate::sync::Mutex).
    Mutex,
    /// An [`Event`](crate::sync::Event).
    Event,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Mutex => f.write_str("mutex"),
            Primitive::Event => f.write_str("event"),
        }
    }
}

/// Errors returned by the mutex, event and thread primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// Allocating or initializing a native object failed.
    ///
    /// No handle is returned, so an unusable primitive can never be used.
    #[error("failed to create {primitive}: {source}")]
    Create {
        /// The primitive being created.
        primitive: Primitive,
        /// The native failure.
        source: io::Error,
    },

    /// The native lock call failed.
    #[error("failed to lock mutex: {0}")]
    Lock(#[source] io::Error),

    /// The native unlock call failed.
    #[error("failed to unlock mutex: {0}")]
    Unlock(#[source] io::Error),

    /// Waking the waiters of an event failed.
    #[error("failed to signal event: {0}")]
    Signal(#[source] io::Error),

    /// A wait failed for a reason other than its deadline elapsing.
    #[error("failed to wait on event: {0}")]
    Wait(#[source] io::Error),

    /// The wait deadline elapsed without observing a signal.
    #[error("timed out waiting for event")]
    Timeout,

    /// One or more destroy sub-steps failed.
    ///
    /// Every sub-step is still attempted; `source` is the first failure.
    #[error("failed to destroy {primitive}: {source}")]
    Destroy {
        /// The primitive being destroyed.
        primitive: Primitive,
        /// The first native failure encountered.
        source: io::Error,
    },

    /// The native thread could not be created.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),
}

impl Error {
    /// Returns `true` if this is a wait timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Returns the raw platform code carried by this error, if any.
    ///
    /// [`Error::Timeout`] carries no code.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Create { source, .. } | Error::Destroy { source, .. } => source.raw_os_error(),
            Error::Lock(e)
            | Error::Unlock(e)
            | Error::Signal(e)
            | Error::Wait(e)
            | Error::Spawn(e) => e.raw_os_error(),
            Error::Timeout => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Builds an [`io::Error`] from a native return code.
pub(crate) fn os_error(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

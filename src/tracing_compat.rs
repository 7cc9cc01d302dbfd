//! Optional diagnostics.
//!
//! With the `tracing-integration` feature enabled, the macros below are the
//! ones from the `tracing` crate. Without it they expand to nothing, so the
//! primitives never log on their own.

#[cfg(feature = "tracing-integration")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    /// No-op debug-level logging macro.
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op trace-level logging macro.
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    pub(crate) use debug;
    pub(crate) use trace;
}

#[cfg(not(feature = "tracing-integration"))]
pub(crate) use noop::{debug, trace};

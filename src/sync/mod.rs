//! Blocking synchronization primitives.
//!
//! The current primitives include:
//! - [`Mutex`]: an exclusive lock backed by a native OS mutex.
//! - [`Event`]: an auto-resetting signal with timed waits.
//!
//! ## Design notes
//!
//! - Both primitives block the calling OS thread inside the kernel; there
//!   is no spinning and no async integration.
//! - Native objects are created by `new` and released on drop. `destroy`
//!   performs the same release but reports the native result.
//! - Neither primitive retries internally or logs on failure; every
//!   outcome is returned to the caller.

mod event;
mod mutex;

pub use event::Event;
pub use mutex::{Mutex, MutexGuard};

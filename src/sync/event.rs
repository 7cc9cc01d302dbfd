use crate::error::{Error, Primitive, Result, os_error};
use crate::sys::Wake;
use crate::sys::platform::RawEvent;
use crate::tracing_compat::debug;

use std::fmt;
use std::time::Duration;

/// An auto-resetting, one-shot signal.
///
/// An `Event` starts unsignaled. [`Event::signal`] marks it signaled and
/// wakes every blocked waiter; the first [`Event::wait`] that observes the
/// signal consumes it, resetting the event before returning. Waiters that
/// lose the race keep waiting until their own deadline.
///
/// Signals do not accumulate: two `signal` calls before any `wait` are
/// observed as one.
///
/// A `signal` that happens before a `wait` starts is never missed, because
/// the flag check and the block are performed atomically under the event's
/// private lock.
///
/// Share an event between threads with `Arc<Event>`.
///
/// # Example
/// ```rust
/// use nebula_sync::sync::Event;
///
/// let event = Event::new().unwrap();
/// event.signal().unwrap();
///
/// assert!(event.wait(100).is_ok());
/// assert!(event.wait(0).unwrap_err().is_timeout());
/// ```
pub struct Event {
    raw: RawEvent,
}

impl Event {
    /// Creates a new, unsignaled event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Create`] if any native sub-object cannot be
    /// initialized. Sub-objects created before the failure are released.
    pub fn new() -> Result<Event> {
        let raw = RawEvent::new().map_err(|rc| {
            debug!(code = rc, "native event creation failed");
            Error::Create {
                primitive: Primitive::Event,
                source: os_error(rc),
            }
        })?;

        Ok(Self { raw })
    }

    /// Signals the event, waking all threads blocked in [`Event::wait`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signal`] with the native code of the wake call.
    pub fn signal(&self) -> Result<()> {
        match self.raw.signal() {
            0 => Ok(()),
            rc => Err(Error::Signal(os_error(rc))),
        }
    }

    /// Waits up to `timeout_ms` milliseconds for the event to be signaled.
    ///
    /// The deadline is computed once, when the call starts. On success the
    /// signal has been consumed. A timeout of zero or less never blocks: it
    /// only checks whether the event is already signaled.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the deadline elapses first.
    /// - [`Error::Wait`] if the native wait itself fails.
    pub fn wait(&self, timeout_ms: i32) -> Result<()> {
        match self.raw.wait(timeout_ms) {
            Wake::Signaled => Ok(()),
            Wake::TimedOut => Err(Error::Timeout),
            Wake::Failed(rc) => Err(Error::Wait(os_error(rc))),
        }
    }

    /// Like [`Event::wait`], taking a [`Duration`].
    ///
    /// Durations longer than `i32::MAX` milliseconds are clamped.
    pub fn wait_for(&self, timeout: Duration) -> Result<()> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        self.wait(timeout_ms)
    }

    /// Releases the native objects of the event.
    ///
    /// Every release step is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Destroy`] carrying the first native failure.
    pub fn destroy(mut self) -> Result<()> {
        match self.raw.destroy() {
            0 => Ok(()),
            rc => {
                debug!(code = rc, "native event destroy failed");
                Err(Error::Destroy {
                    primitive: Primitive::Event,
                    source: os_error(rc),
                })
            }
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").finish_non_exhaustive()
    }
}

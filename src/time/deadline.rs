use crate::sys::platform;

/// Number of nanoseconds in one second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// An absolute point in time used to bound a wait.
///
/// A `Deadline` is expressed as whole seconds plus a sub-second remainder
/// on the clock the event backend waits against. It is computed once per
/// wait call so that repeated re-blocking after spurious wakeups never
/// extends the total wait.
///
/// # Examples
///
/// ```rust
/// use nebula_sync::time::Deadline;
///
/// let base = Deadline::new(10, 900_000_000);
/// let deadline = base.after(1_250);
///
/// assert_eq!(deadline.secs(), 12);
/// assert_eq!(deadline.subsec_nanos(), 150_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline {
    /// Whole seconds.
    secs: i64,

    /// Sub-second remainder, always in `0..NANOS_PER_SEC`.
    nanos: i64,
}

impl Deadline {
    /// Creates a deadline from seconds and nanoseconds, carrying any
    /// nanosecond overflow into the seconds field.
    pub const fn new(secs: i64, nanos: i64) -> Self {
        Self {
            secs: secs + nanos.div_euclid(NANOS_PER_SEC),
            nanos: nanos.rem_euclid(NANOS_PER_SEC),
        }
    }

    /// Returns the current time on the wait clock as a deadline.
    ///
    /// The wait clock is `CLOCK_MONOTONIC` on Linux and Android,
    /// `CLOCK_REALTIME` on other unixes and the system clock on Windows.
    /// Values are only comparable with other `Deadline`s from the same
    /// process, never with wall-clock time.
    pub fn now() -> Self {
        let (secs, nanos) = platform::clock_now();
        Self::new(secs, nanos)
    }

    /// Computes the absolute deadline `now + timeout_ms`.
    ///
    /// Negative timeouts are treated as zero.
    pub fn from_now(timeout_ms: i32) -> Self {
        Self::now().after(timeout_ms)
    }

    /// Returns this deadline shifted forward by `timeout_ms` milliseconds.
    ///
    /// The whole-second part of the timeout goes to the seconds field and
    /// only the millisecond remainder goes to the nanosecond field.
    /// Negative timeouts are treated as zero.
    pub const fn after(self, timeout_ms: i32) -> Self {
        let ms = if timeout_ms < 0 { 0 } else { timeout_ms as i64 };

        Self::new(
            self.secs + ms / 1000,
            self.nanos + (ms % 1000) * 1_000_000,
        )
    }

    /// Whole seconds of this deadline.
    pub const fn secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second remainder of this deadline, in nanoseconds.
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos as u32
    }
}

//! Platform-specific native primitives.
//!
//! This module provides a unified interface over the native threading
//! objects of each platform:
//!
//! - POSIX: `pthread` mutexes, condition variables and detached threads,
//! - Windows: kernel mutex and auto-reset event objects, `CreateThread`.
//!
//! The concrete implementation is selected at compile time depending on
//! the target operating system. Both backends expose the same items:
//!
//! - `RawMutex` with `new`, `lock`, `unlock`, `destroy`,
//! - `RawEvent` with `new`, `signal`, `wait`, `destroy`,
//! - `clock_now`, `spawn`, `current_thread_id`, `set_current_thread_name`.
//!
//! Operations return native codes (`0` is success); the public wrappers
//! in [`crate::sync`] and [`crate::thread`] turn them into [`crate::Error`].

use std::ffi::CString;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(windows)]
pub(crate) use windows as platform;

/// Outcome of a native event wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// The event was signaled and the signal has been consumed.
    Signaled,

    /// The deadline elapsed first.
    TimedOut,

    /// The native wait failed with the given code.
    Failed(i32),
}

/// Returns the first nonzero code, or `0` if every step succeeded.
pub(crate) fn first_failure(codes: &[i32]) -> i32 {
    codes.iter().copied().find(|&rc| rc != 0).unwrap_or(0)
}

/// Builds a C thread name from `name`.
///
/// The name is cut at the first interior NUL and then truncated to at most
/// `max_len` bytes without splitting a UTF-8 sequence.
#[cfg_attr(windows, allow(dead_code))]
pub(crate) fn thread_name(name: &str, max_len: usize) -> Option<CString> {
    let name = name.split('\0').next().unwrap_or_default();

    let mut end = name.len().min(max_len);
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    CString::new(&name[..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_reports_the_earliest_code() {
        assert_eq!(first_failure(&[0, 0]), 0);
        assert_eq!(first_failure(&[16, 0]), 16);
        assert_eq!(first_failure(&[0, 22]), 22);
        assert_eq!(first_failure(&[16, 22]), 16);
    }

    #[test]
    fn thread_name_is_truncated_on_char_boundary() {
        let name = thread_name("connection-reader-loop", 15).unwrap();
        assert_eq!(name.to_bytes(), b"connection-read");

        // 'é' is two bytes; a cut in the middle backs off to the boundary.
        let name = thread_name("abcdefghijklmné", 15).unwrap();
        assert_eq!(name.to_bytes(), b"abcdefghijklmn");
    }

    #[test]
    fn thread_name_stops_at_interior_nul() {
        let name = thread_name("worker\0ignored", 64).unwrap();
        assert_eq!(name.to_bytes(), b"worker");
    }
}

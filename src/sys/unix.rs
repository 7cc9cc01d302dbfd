//! POSIX backend built on `pthread`.
//!
//! Native objects are heap allocated and never move after initialization,
//! as required by `pthread_mutex_t` and `pthread_cond_t`.

use super::{Wake, first_failure, thread_name};
use crate::time::Deadline;

use libc::{
    CLOCK_REALTIME, ETIMEDOUT, PTHREAD_COND_INITIALIZER, PTHREAD_CREATE_DETACHED,
    PTHREAD_MUTEX_INITIALIZER, c_void, clockid_t, pthread_attr_destroy, pthread_attr_init,
    pthread_attr_setdetachstate, pthread_attr_setstacksize, pthread_attr_t, pthread_cond_broadcast,
    pthread_cond_destroy, pthread_cond_init, pthread_cond_t, pthread_cond_timedwait,
    pthread_condattr_destroy, pthread_condattr_init, pthread_condattr_t, pthread_create,
    pthread_mutex_destroy, pthread_mutex_init, pthread_mutex_lock, pthread_mutex_t,
    pthread_mutex_unlock, pthread_self, pthread_t, timespec,
};
use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// Clock used for event deadlines.
///
/// Linux and Android can bind a condition variable to the monotonic clock,
/// which keeps timed waits immune to wall-clock adjustments.
#[cfg(any(target_os = "linux", target_os = "android"))]
const EVENT_CLOCK: clockid_t = libc::CLOCK_MONOTONIC;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const EVENT_CLOCK: clockid_t = CLOCK_REALTIME;

/// Floor for a spawned thread's stack, on top of the platform minimum.
const MIN_STACK_SIZE: usize = 64 * 1024;

/// Longest thread name accepted by the platform, excluding the NUL.
#[cfg(any(target_os = "linux", target_os = "android"))]
const MAX_THREAD_NAME: usize = 15;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const MAX_THREAD_NAME: usize = 63;

/// Returns the current time on the event clock as `(seconds, nanoseconds)`.
pub(crate) fn clock_now() -> (i64, i64) {
    let mut now: timespec = unsafe { mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(EVENT_CLOCK, &mut now) };

    if rc != 0 {
        // Only fails for an invalid clock id; fall back to the wall clock.
        unsafe { libc::clock_gettime(CLOCK_REALTIME, &mut now) };
    }

    (now.tv_sec as i64, now.tv_nsec as i64)
}

/// Converts a deadline into the `timespec` expected by `pthread_cond_timedwait`.
fn to_timespec(deadline: &Deadline) -> timespec {
    let mut ts: timespec = unsafe { mem::zeroed() };
    ts.tv_sec = deadline.secs() as _;
    ts.tv_nsec = deadline.subsec_nanos() as _;
    ts
}

/// A heap-allocated `pthread_mutex_t`.
pub(crate) struct RawMutex {
    lock: Box<UnsafeCell<pthread_mutex_t>>,

    /// Cleared once the native mutex has been destroyed.
    live: bool,
}

unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

impl RawMutex {
    /// Allocates and initializes a mutex with default attributes.
    pub(crate) fn new() -> Result<Self, i32> {
        let lock = Box::new(UnsafeCell::new(PTHREAD_MUTEX_INITIALIZER));

        let rc = unsafe { pthread_mutex_init(lock.get(), ptr::null()) };
        if rc != 0 {
            return Err(rc);
        }

        Ok(Self { lock, live: true })
    }

    pub(crate) fn lock(&self) -> i32 {
        unsafe { pthread_mutex_lock(self.lock.get()) }
    }

    pub(crate) fn unlock(&self) -> i32 {
        unsafe { pthread_mutex_unlock(self.lock.get()) }
    }

    /// Destroys the native mutex. Later calls are no-ops returning `0`.
    pub(crate) fn destroy(&mut self) -> i32 {
        if !self.live {
            return 0;
        }

        self.live = false;
        unsafe { pthread_mutex_destroy(self.lock.get()) }
    }
}

impl Drop for RawMutex {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Shared state of an event.
///
/// `signaled` is only read or written while `mutex` is held.
struct EventState {
    mutex: UnsafeCell<pthread_mutex_t>,
    cond: UnsafeCell<pthread_cond_t>,
    signaled: UnsafeCell<bool>,
}

/// An auto-reset event built from a mutex, a condition variable and a flag.
pub(crate) struct RawEvent {
    state: Box<EventState>,
    live: bool,
}

unsafe impl Send for RawEvent {}
unsafe impl Sync for RawEvent {}

impl RawEvent {
    /// Allocates the event and initializes its mutex and condition variable.
    ///
    /// If the condition variable cannot be initialized, the already
    /// initialized mutex is destroyed before returning the error.
    pub(crate) fn new() -> Result<Self, i32> {
        let state = Box::new(EventState {
            mutex: UnsafeCell::new(PTHREAD_MUTEX_INITIALIZER),
            cond: UnsafeCell::new(PTHREAD_COND_INITIALIZER),
            signaled: UnsafeCell::new(false),
        });

        let rc = unsafe { pthread_mutex_init(state.mutex.get(), ptr::null()) };
        if rc != 0 {
            return Err(rc);
        }

        let rc = unsafe { init_cond(state.cond.get()) };
        if rc != 0 {
            unsafe { pthread_mutex_destroy(state.mutex.get()) };
            return Err(rc);
        }

        Ok(Self { state, live: true })
    }

    /// Sets the flag and wakes every waiter.
    ///
    /// Returns the code of the broadcast call.
    pub(crate) fn signal(&self) -> i32 {
        let state = &*self.state;

        let rc = unsafe { pthread_mutex_lock(state.mutex.get()) };
        if rc != 0 {
            return rc;
        }

        unsafe { *state.signaled.get() = true };
        let rc = unsafe { pthread_cond_broadcast(state.cond.get()) };

        unsafe { pthread_mutex_unlock(state.mutex.get()) };
        rc
    }

    /// Waits until the event is signaled or `timeout_ms` elapses.
    ///
    /// The flag is re-checked after every wakeup, so a spurious wakeup
    /// blocks again until the deadline. A timeout of zero or less checks
    /// the flag once without blocking.
    pub(crate) fn wait(&self, timeout_ms: i32) -> Wake {
        let state = &*self.state;
        let deadline = to_timespec(&Deadline::from_now(timeout_ms));

        let rc = unsafe { pthread_mutex_lock(state.mutex.get()) };
        if rc != 0 {
            return Wake::Failed(rc);
        }

        let mut rc = 0;
        let wake = loop {
            let signaled = unsafe { &mut *state.signaled.get() };

            if *signaled {
                *signaled = false;
                break Wake::Signaled;
            }

            if rc == ETIMEDOUT || timeout_ms <= 0 {
                break Wake::TimedOut;
            }

            if rc != 0 {
                break Wake::Failed(rc);
            }

            rc = unsafe { pthread_cond_timedwait(state.cond.get(), state.mutex.get(), &deadline) };
        };

        unsafe { pthread_mutex_unlock(state.mutex.get()) };
        wake
    }

    /// Destroys the mutex, then the condition variable.
    ///
    /// Both steps are always attempted; the first failure is returned.
    pub(crate) fn destroy(&mut self) -> i32 {
        if !self.live {
            return 0;
        }

        self.live = false;

        let mutex_rc = unsafe { pthread_mutex_destroy(self.state.mutex.get()) };
        let cond_rc = unsafe { pthread_cond_destroy(self.state.cond.get()) };

        first_failure(&[mutex_rc, cond_rc])
    }
}

impl Drop for RawEvent {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Initializes `cond` so that timed waits use [`EVENT_CLOCK`].
unsafe fn init_cond(cond: *mut pthread_cond_t) -> i32 {
    let mut attr = MaybeUninit::<pthread_condattr_t>::uninit();

    let rc = unsafe { pthread_condattr_init(attr.as_mut_ptr()) };
    if rc != 0 {
        return rc;
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        let rc = unsafe { libc::pthread_condattr_setclock(attr.as_mut_ptr(), EVENT_CLOCK) };
        if rc != 0 {
            unsafe { pthread_condattr_destroy(attr.as_mut_ptr()) };
            return rc;
        }
    }

    let rc = unsafe { pthread_cond_init(cond, attr.as_ptr()) };
    unsafe { pthread_condattr_destroy(attr.as_mut_ptr()) };

    rc
}

/// Entry closure handed to the native start routine.
type Main = Box<dyn FnOnce() + Send + 'static>;

/// Starts a detached thread running `main`.
///
/// On failure the closure is reclaimed and dropped on the calling thread.
pub(crate) fn spawn(stack_size: Option<usize>, main: Main) -> Result<(), i32> {
    let main = Box::into_raw(Box::new(main));
    let mut attr = MaybeUninit::<pthread_attr_t>::uninit();

    let mut rc = unsafe { pthread_attr_init(attr.as_mut_ptr()) };
    if rc != 0 {
        drop(unsafe { Box::from_raw(main) });
        return Err(rc);
    }

    rc = unsafe { pthread_attr_setdetachstate(attr.as_mut_ptr(), PTHREAD_CREATE_DETACHED) };

    if rc == 0 {
        if let Some(size) = stack_size {
            rc = unsafe { pthread_attr_setstacksize(attr.as_mut_ptr(), round_stack_size(size)) };
        }
    }

    if rc == 0 {
        let mut native: pthread_t = unsafe { mem::zeroed() };
        rc = unsafe {
            pthread_create(
                &mut native,
                attr.as_ptr(),
                thread_start,
                main as *mut c_void,
            )
        };
    }

    unsafe { pthread_attr_destroy(attr.as_mut_ptr()) };

    if rc != 0 {
        drop(unsafe { Box::from_raw(main) });
        return Err(rc);
    }

    Ok(())
}

/// Native start routine: runs the boxed closure and never lets a panic
/// unwind into the C caller.
extern "C" fn thread_start(main: *mut c_void) -> *mut c_void {
    let main = unsafe { Box::from_raw(main as *mut Main) };
    let _ = panic::catch_unwind(AssertUnwindSafe(move || main()));

    ptr::null_mut()
}

/// Returns the platform `PTHREAD_STACK_MIN` as reported at runtime.
///
/// glibc computes it per architecture (131072 on aarch64), so the
/// compile-time constant is not reliable.
fn pthread_stack_min() -> usize {
    match unsafe { libc::sysconf(libc::_SC_THREAD_STACK_MIN) } {
        n if n > 0 => n as usize,
        _ => MIN_STACK_SIZE,
    }
}

/// Rounds a requested stack size up to the platform minimum and to a
/// whole page.
fn round_stack_size(size: usize) -> usize {
    let page = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        n if n > 0 => n as usize,
        _ => 4096,
    };

    let size = size.max(pthread_stack_min().max(MIN_STACK_SIZE));
    size.div_ceil(page) * page
}

/// Returns the `pthread_t` of the calling thread as an integer.
pub(crate) fn current_thread_id() -> u64 {
    unsafe { pthread_self() as usize as u64 }
}

/// Names the calling thread. Returns `false` when the name was not applied.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) fn set_current_thread_name(name: &str) -> bool {
    match thread_name(name, MAX_THREAD_NAME) {
        Some(name) => unsafe { libc::pthread_setname_np(pthread_self(), name.as_ptr()) == 0 },
        None => false,
    }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) fn set_current_thread_name(name: &str) -> bool {
    match thread_name(name, MAX_THREAD_NAME) {
        Some(name) => unsafe { libc::pthread_setname_np(name.as_ptr()) == 0 },
        None => false,
    }
}

#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
pub(crate) fn set_current_thread_name(name: &str) -> bool {
    match thread_name(name, MAX_THREAD_NAME) {
        Some(name) => {
            unsafe { libc::pthread_set_name_np(pthread_self(), name.as_ptr()) };
            true
        }
        None => false,
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
)))]
pub(crate) fn set_current_thread_name(_name: &str) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_stack_is_raised_to_platform_minimum() {
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let size = round_stack_size(1);

        assert!(size >= pthread_stack_min());
        assert!(size >= MIN_STACK_SIZE);
        assert_eq!(size % page, 0);
    }

    #[test]
    fn tiny_stack_is_accepted_by_pthread() {
        let mut attr = MaybeUninit::<pthread_attr_t>::uninit();

        unsafe {
            assert_eq!(pthread_attr_init(attr.as_mut_ptr()), 0);
            let rc = pthread_attr_setstacksize(attr.as_mut_ptr(), round_stack_size(1));
            pthread_attr_destroy(attr.as_mut_ptr());
            assert_eq!(rc, 0);
        }
    }

    #[test]
    fn large_stack_is_kept_page_aligned() {
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let size = round_stack_size(4 * 1024 * 1024 + 1);

        assert!(size > 4 * 1024 * 1024);
        assert_eq!(size % page, 0);
    }
}

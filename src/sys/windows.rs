//! Windows backend built on kernel objects.
//!
//! It mirrors the POSIX backend and exposes identical item names and
//! semantics. The event is a native auto-reset event, so consuming a
//! signal on a successful wait is done by the kernel itself.

use super::Wake;

use std::ffi::c_void;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::time::{SystemTime, UNIX_EPOCH};

use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, HANDLE, WAIT_ABANDONED, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleA, GetProcAddress};
use windows_sys::Win32::System::Threading::{
    CreateEventW, CreateMutexW, CreateThread, GetCurrentThread, GetCurrentThreadId, INFINITE,
    ReleaseMutex, STACK_SIZE_PARAM_IS_A_RESERVATION, SetEvent, WaitForSingleObject,
};

/// Signature of `SetThreadDescription`, available since Windows 10 1607.
type SetThreadDescriptionFn = unsafe extern "system" fn(HANDLE, *const u16) -> i32;

/// Returns the calling thread's last error as a native code.
fn last_error() -> i32 {
    unsafe { GetLastError() as i32 }
}

/// Closes a kernel handle, returning `0` or the native error code.
fn close(handle: HANDLE) -> i32 {
    if unsafe { CloseHandle(handle) } == 0 {
        last_error()
    } else {
        0
    }
}

/// Returns the current wall-clock time as `(seconds, nanoseconds)`.
///
/// Kernel waits take relative timeouts, so this only backs
/// [`Deadline::now`](crate::time::Deadline::now).
pub(crate) fn clock_now() -> (i64, i64) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    (now.as_secs() as i64, now.subsec_nanos() as i64)
}

/// A kernel mutex object.
pub(crate) struct RawMutex {
    handle: HANDLE,
    live: bool,
}

unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

impl RawMutex {
    pub(crate) fn new() -> Result<Self, i32> {
        let handle = unsafe { CreateMutexW(ptr::null(), 0, ptr::null()) };
        if handle.is_null() {
            return Err(last_error());
        }

        Ok(Self { handle, live: true })
    }

    /// Blocks without timeout until the mutex is owned.
    ///
    /// An abandoned mutex is still acquired by the caller, so it counts
    /// as success.
    pub(crate) fn lock(&self) -> i32 {
        match unsafe { WaitForSingleObject(self.handle, INFINITE) } {
            WAIT_OBJECT_0 | WAIT_ABANDONED => 0,
            WAIT_FAILED => last_error(),
            other => other as i32,
        }
    }

    pub(crate) fn unlock(&self) -> i32 {
        if unsafe { ReleaseMutex(self.handle) } == 0 {
            last_error()
        } else {
            0
        }
    }

    pub(crate) fn destroy(&mut self) -> i32 {
        if !self.live {
            return 0;
        }

        self.live = false;
        close(self.handle)
    }
}

impl Drop for RawMutex {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// A native auto-reset event object, created unsignaled.
pub(crate) struct RawEvent {
    handle: HANDLE,
    live: bool,
}

unsafe impl Send for RawEvent {}
unsafe impl Sync for RawEvent {}

impl RawEvent {
    pub(crate) fn new() -> Result<Self, i32> {
        // Auto-reset (manual = FALSE), initially unsignaled.
        let handle = unsafe { CreateEventW(ptr::null(), 0, 0, ptr::null()) };
        if handle.is_null() {
            return Err(last_error());
        }

        Ok(Self { handle, live: true })
    }

    pub(crate) fn signal(&self) -> i32 {
        if unsafe { SetEvent(self.handle) } == 0 {
            last_error()
        } else {
            0
        }
    }

    /// Waits up to `timeout_ms`; negative timeouts poll without blocking.
    pub(crate) fn wait(&self, timeout_ms: i32) -> Wake {
        let timeout = timeout_ms.max(0) as u32;

        match unsafe { WaitForSingleObject(self.handle, timeout) } {
            WAIT_OBJECT_0 => Wake::Signaled,
            WAIT_TIMEOUT => Wake::TimedOut,
            WAIT_FAILED => Wake::Failed(last_error()),
            other => Wake::Failed(other as i32),
        }
    }

    pub(crate) fn destroy(&mut self) -> i32 {
        if !self.live {
            return 0;
        }

        self.live = false;
        close(self.handle)
    }
}

impl Drop for RawEvent {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Entry closure handed to the native start routine.
type Main = Box<dyn FnOnce() + Send + 'static>;

/// Starts a thread running `main` and immediately closes its handle, which
/// detaches it.
pub(crate) fn spawn(stack_size: Option<usize>, main: Main) -> Result<(), i32> {
    let main = Box::into_raw(Box::new(main));

    let (stack, flags) = match stack_size {
        Some(size) => (size, STACK_SIZE_PARAM_IS_A_RESERVATION),
        None => (0, 0),
    };

    let handle = unsafe {
        CreateThread(
            ptr::null(),
            stack,
            Some(thread_start),
            main as *const c_void,
            flags,
            ptr::null_mut(),
        )
    };

    if handle.is_null() {
        let rc = last_error();
        drop(unsafe { Box::from_raw(main) });
        return Err(rc);
    }

    close(handle);
    Ok(())
}

/// Native start routine: runs the boxed closure and never lets a panic
/// unwind into the system caller.
unsafe extern "system" fn thread_start(main: *mut c_void) -> u32 {
    let main = unsafe { Box::from_raw(main as *mut Main) };
    let _ = panic::catch_unwind(AssertUnwindSafe(move || main()));

    0
}

pub(crate) fn current_thread_id() -> u64 {
    unsafe { GetCurrentThreadId() as u64 }
}

/// Names the calling thread through `SetThreadDescription` when the
/// running Windows version exports it.
pub(crate) fn set_current_thread_name(name: &str) -> bool {
    let Some(set_description) = lookup_set_thread_description() else {
        return false;
    };

    let wide: Vec<u16> = name
        .split('\0')
        .next()
        .unwrap_or_default()
        .encode_utf16()
        .chain(Some(0))
        .collect();

    let hr = unsafe { set_description(GetCurrentThread(), wide.as_ptr()) };
    hr >= 0
}

fn lookup_set_thread_description() -> Option<SetThreadDescriptionFn> {
    unsafe {
        let kernel32 = GetModuleHandleA(b"kernel32.dll\0".as_ptr());
        if kernel32.is_null() {
            return None;
        }

        let proc = GetProcAddress(kernel32, b"SetThreadDescription\0".as_ptr())?;
        Some(mem::transmute::<_, SetThreadDescriptionFn>(proc))
    }
}

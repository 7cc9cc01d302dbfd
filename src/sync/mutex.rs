use crate::error::{Error, Primitive, Result, os_error};
use crate::sys::platform::RawMutex;
use crate::tracing_compat::debug;

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

/// A mutual exclusion lock backed by a native OS mutex.
///
/// `Mutex<T>` blocks the calling thread in the kernel until the lock is
/// available; there is no timeout and no way to abandon a pending `lock`.
/// Waiters are served in whatever order the native primitive chooses.
///
/// The type parameter defaults to `()`, in which case the mutex is a plain
/// lock guarding state that lives elsewhere.
///
/// The native lock is released when the mutex is dropped. Use
/// [`Mutex::destroy`] to observe the result of that release.
pub struct Mutex<T = ()> {
    /// The native lock.
    raw: RawMutex,

    /// The protected value.
    ///
    /// Only reachable through a [`MutexGuard`], which proves the native
    /// lock is held.
    data: UnsafeCell<T>,
}

// Safety: the value moves with the mutex.
unsafe impl<T: Send> Send for Mutex<T> {}
// Safety: access to `data` is serialized by the native lock.
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates a new, unlocked mutex wrapping `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Create`] if the native lock cannot be initialized.
    ///
    /// # Example
    /// ```rust
    /// use nebula_sync::sync::Mutex;
    ///
    /// let mutex = Mutex::new(42).unwrap();
    /// assert_eq!(*mutex.lock().unwrap(), 42);
    /// ```
    pub fn new(value: T) -> Result<Mutex<T>> {
        let raw = RawMutex::new().map_err(|rc| {
            debug!(code = rc, "native mutex creation failed");
            Error::Create {
                primitive: Primitive::Mutex,
                source: os_error(rc),
            }
        })?;

        Ok(Self {
            raw,
            data: UnsafeCell::new(value),
        })
    }

    /// Blocks the calling thread until the lock is acquired.
    ///
    /// The lock is released when the returned guard is dropped or passed to
    /// [`MutexGuard::unlock`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lock`] with the native code if the lock call fails.
    pub fn lock(&self) -> Result<MutexGuard<'_, T>> {
        match self.raw.lock() {
            0 => Ok(MutexGuard {
                mutex: self,
                _not_send: PhantomData,
            }),
            rc => Err(Error::Lock(os_error(rc))),
        }
    }

    /// Returns a mutable reference to the value without locking.
    ///
    /// The exclusive borrow guarantees no guard exists.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Releases the native lock and returns the protected value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Destroy`] with the native code if the release fails.
    /// The value is dropped in that case.
    pub fn destroy(self) -> Result<T> {
        let Mutex { mut raw, data } = self;

        match raw.destroy() {
            0 => Ok(data.into_inner()),
            rc => {
                debug!(code = rc, "native mutex destroy failed");
                Err(Error::Destroy {
                    primitive: Primitive::Mutex,
                    source: os_error(rc),
                })
            }
        }
    }
}

impl<T> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex").finish_non_exhaustive()
    }
}

/// Guard returned by [`Mutex::lock`].
///
/// Releases the lock when dropped. Dropping ignores the native unlock
/// result; call [`MutexGuard::unlock`] to observe it.
#[must_use = "the mutex is unlocked as soon as the guard is dropped"]
pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,

    /// The native lock must be released by the thread that acquired it.
    _not_send: PhantomData<*const ()>,
}

// Safety: sharing `&MutexGuard` only hands out `&T`.
unsafe impl<T: Sync> Sync for MutexGuard<'_, T> {}

impl<'a, T> MutexGuard<'a, T> {
    /// Releases the lock, reporting the native result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unlock`] with the native code if the unlock fails.
    pub fn unlock(self) -> Result<()> {
        let guard = ManuallyDrop::new(self);

        match guard.mutex.raw.unlock() {
            0 => Ok(()),
            rc => Err(Error::Unlock(os_error(rc))),
        }
    }
}

impl<'a, T> Drop for MutexGuard<'a, T> {
    fn drop(&mut self) {
        self.mutex.raw.unlock();
    }
}

impl<'a, T> Deref for MutexGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<'a, T> DerefMut for MutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for MutexGuard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

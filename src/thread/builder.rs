use super::set_current_thread_name;
use crate::error::{Error, Result, os_error};
use crate::sys::platform;
use crate::tracing_compat::debug;

/// Builder for configuring and starting a detached thread.
///
/// `Builder` allows customizing thread parameters before the thread is
/// created. Currently, it supports the thread name and stack size.
///
/// # Examples
///
/// ```rust
/// use nebula_sync::thread::Builder;
///
/// Builder::new()
///     .name("mqtt-receive")
///     .stack_size(256 * 1024)
///     .spawn(|| {
///         // background I/O loop
///     })
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    /// Name applied by the new thread before it runs its entry point.
    name: Option<String>,

    /// Requested stack size in bytes; `None` keeps the platform default.
    stack_size: Option<usize>,
}

impl Builder {
    /// Creates a `Builder` with no name and the platform default stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name the thread gives itself on startup.
    ///
    /// Naming is best-effort; see
    /// [`set_current_thread_name`](super::set_current_thread_name).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack size of the new thread.
    ///
    /// Sizes below the platform minimum are rounded up.
    ///
    /// # Panics
    ///
    /// Panics if `size == 0`.
    pub fn stack_size(mut self, size: usize) -> Self {
        assert!(size > 0, "stack_size must be > 0");

        self.stack_size = Some(size);
        self
    }

    /// Starts a detached thread running `entry(arg)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] with the native code if the thread cannot be
    /// created. `entry` and `arg` are dropped on the calling thread.
    pub fn start<F, A>(self, entry: F, arg: A) -> Result<()>
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.spawn(move || entry(arg))
    }

    /// Starts a detached thread running the closure `f`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] with the native code if the thread cannot be
    /// created.
    pub fn spawn<F>(self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let Builder { name, stack_size } = self;

        let main = Box::new(move || {
            if let Some(name) = name {
                set_current_thread_name(&name);
            }

            f()
        });

        platform::spawn(stack_size, main).map_err(|rc| {
            debug!(code = rc, "native thread creation failed");
            Error::Spawn(os_error(rc))
        })
    }
}

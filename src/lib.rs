//! # nebula-sync
//!
//! **nebula-sync** is the thin synchronization layer shared by the Nebula
//! client libraries. It presents one concurrency contract over two native
//! threading models: POSIX `pthread` objects and Windows kernel objects.
//!
//! It provides three primitives:
//!
//! - A **mutex** that blocks the calling thread until the lock is acquired
//! - An **auto-reset event**: one `signal` wakes all waiters and is consumed
//!   by exactly one successful `wait`, with millisecond timeouts
//! - A **detached thread launcher** with thread ids and best-effort naming
//!
//! The backend is selected at compile time and never exposed. Every native
//! object is released when its owner is dropped, and every operation
//! returns its result to the caller: nothing here retries, aborts or logs
//! on its own.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_sync::sync::{Event, Mutex};
//! use nebula_sync::thread;
//! use std::sync::Arc;
//!
//! let state = Arc::new(Mutex::new(Vec::new()).unwrap());
//! let done = Arc::new(Event::new().unwrap());
//!
//! let (worker_state, worker_done) = (state.clone(), done.clone());
//! thread::spawn(move || {
//!     worker_state.lock().unwrap().push("connected");
//!     worker_done.signal().unwrap();
//! })
//! .unwrap();
//!
//! done.wait(5_000).unwrap();
//! assert_eq!(*state.lock().unwrap(), ["connected"]);
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: mutex and event
//! - [`thread`]: detached threads, thread ids and names
//! - [`time`]: absolute deadlines for timed waits
//!
//! ## Features
//!
//! - `tracing-integration`: emit diagnostics for native failures through
//!   the `tracing` crate. Off by default.

mod error;
mod sys;
mod tracing_compat;

pub mod sync;
pub mod thread;
pub mod time;

pub use error::{Error, Primitive, Result};

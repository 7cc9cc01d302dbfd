//! Time utilities shared by the synchronization primitives.
//!
//! It includes:
//! - [`Deadline`], an absolute wake time computed once from a relative
//!   millisecond timeout and used to bound timed waits.

mod deadline;

#[doc(inline)]
pub use deadline::{Deadline, NANOS_PER_SEC};

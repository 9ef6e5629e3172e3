//! Filesystem-backed shared state
//!
//! ocdc has no daemon: every invocation is a short-lived process, and
//! concurrent invocations coordinate only through the files in the state
//! directory. [`FileLock`] provides mutual exclusion and [`LockedStore`]
//! wraps the read-mutate-write cycle used by the port map and the cleanup
//! queue.

pub mod lock;
pub mod store;

pub use lock::{FileLock, FileLockGuard, LockPolicy};
pub use store::{read_json, write_json, LockedStore};

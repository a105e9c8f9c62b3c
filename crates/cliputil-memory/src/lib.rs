//! Scoped locking and ownership tracking for OS-shared memory blocks.
//!
//! - [`MemoryMap`] wraps one clipboard block and tracks whether it exists,
//!   whether it is locked and whether this process must free it
//! - [`LockGuard`] pairs every successful `lock` with an `unlock` on every
//!   exit path, for any [`Lockable`] resource
//!
//! Misuse of the lock pairing is a programmer error and is reported through
//! [`contract_violation!`]: logged always, fatal in debug builds.

#[macro_use]
pub mod contract;
pub mod error;
pub mod guard;
pub mod map;

pub use error::{LockError, Result};
pub use guard::{LockGuard, LockPolicy, Lockable};
pub use map::MemoryMap;

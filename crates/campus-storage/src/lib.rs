//! # campus-storage
//!
//! Storage provider traits for the campus identity engine.
//!
//! The storage layer is the final authority on uniqueness: in-memory
//! validation is an early-reject optimization, and the backing store's
//! unique constraints arbitrate concurrent writers.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod attempt;
pub mod error;
pub mod identity;
pub mod memory;

pub use attempt::AttemptLog;
pub use error::{StorageError, StorageResult};
pub use identity::IdentityStore;
pub use memory::{MemoryAttemptLog, MemoryIdentityStore};

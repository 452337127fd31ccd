//! # campus-cache
//!
//! Counter/cache provider traits for the campus identity engine.
//!
//! The lockout gate's rolling failure counters and the short-lived
//! ticket-invalidation records live behind these traits. Backends must
//! support per-key atomic increments and expiring keys; no global lock
//! is permitted.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod provider;
pub mod ticket;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryCacheProvider;
pub use provider::{AtomicCacheProvider, CacheProvider};
pub use ticket::TicketInvalidation;

//! # campus-storage-sql
//!
//! `PostgreSQL` backend for the campus identity storage traits.
//!
//! The database's unique indexes are the authoritative uniqueness
//! enforcement:
//!
//! - `identities_active_identifier_key` on
//!   `(account_id, auth_provider_id, lower(identifier))` where
//!   `state = 'active'`
//! - `identities_sis_identifier_key` on `(account_id, sis_identifier)`
//! - `identities_integration_identifier_key` on
//!   `(account_id, integration_identifier)`
//!
//! Violations surface as `StorageError::Duplicate` for the write
//! pipeline to convert into validation failures.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod attempt;
pub mod entities;
pub mod error;
pub mod identity;
pub mod pool;

pub use attempt::PgAttemptLog;
pub use identity::PgIdentityStore;
pub use pool::{create_pool, PoolConfig};

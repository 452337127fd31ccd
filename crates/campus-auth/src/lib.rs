//! # campus-auth
//!
//! Credential resolution engine for campus login identities.
//!
//! This crate ties the rest of the system together:
//!
//! - [`CredentialResolver`] resolves one submitted `(identifier, secret)`
//!   pair across every candidate identity visible from the caller's
//!   accounts, verifying each independently and auditing each exactly
//!   once.
//! - [`LoginGate`] keeps rolling failure counters per
//!   `(identity, remote address)` pair and locks pairs that exceed the
//!   threshold, degrading open when the counter store is unreachable.
//! - [`IdentityWritePipeline`] runs identity writes through explicit
//!   validate / normalize / write / post-write phases, converting
//!   store-level uniqueness rejections into field validation failures.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod audit;
pub mod directory;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod resolver;

pub use audit::Auditor;
pub use directory::{AccountDirectory, Notifier, UserDirectory};
pub use error::{AuthError, AuthResult, ValidationFailure, WriteError};
pub use gate::{GateConfig, GateState, LoginGate};
pub use pipeline::IdentityWritePipeline;
pub use resolver::{CredentialResolver, Resolution};

//! # campus-crypto
//!
//! Password hashing for the campus identity engine.
//!
//! Hashing strategies are pluggable providers arranged in a migration
//! chain: the current provider produces every new hash, while legacy
//! providers are retained as verifiers only. Old hashes keep working
//! during a rotation, but nothing is ever written with a legacy
//! algorithm.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod chain;
pub mod error;
pub mod legacy;
pub mod provider;

pub use chain::{ProviderChain, Verification};
pub use error::{CryptoError, CryptoResult};
pub use legacy::LegacySha512Provider;
pub use provider::{Argon2Policy, Argon2Provider, PasswordProvider};

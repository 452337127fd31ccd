//! # campus-ldap
//!
//! LDAP bind verification for campus login identities.
//!
//! The verifier never raises transport faults to the caller: a failed or
//! timed-out bind is logged and reported as "no match" so credential
//! resolution can fall through to other verification paths.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod verifier;

pub use config::DirectoryConfig;
pub use error::{LdapError, LdapResult};
pub use verifier::{BindOutcome, BindVerifier, DirectoryBinder, LdapDirectoryBinder};

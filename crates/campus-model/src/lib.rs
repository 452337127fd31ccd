//! # campus-model
//!
//! Domain models for the campus identity engine: login identities
//! (credentials scoped to one account), accounts, external authentication
//! providers, and authentication attempt records.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod account;
pub mod attempt;
pub mod identity;
pub mod policy;
pub mod provider;

pub use account::{Account, AuthenticationMode};
pub use attempt::AuthenticationAttempt;
pub use identity::{Identity, IdentityState, MAX_IDENTIFIER_LEN};
pub use policy::{can, PolicyRule};
pub use provider::{AuthenticationProvider, ProviderKind};

//! Provider migration chain.
//!
//! New hashes always come from the current provider; legacy providers are
//! consulted in configured order as verifiers only. A legacy match tells
//! the caller to lazily re-hash with the current provider. No write ever
//! downgrades to a legacy algorithm.

use crate::error::CryptoResult;
use crate::provider::PasswordProvider;

/// Which provider, if any, verified a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The current provider verified the primary hash.
    Current,
    /// A legacy provider verified; the caller should re-hash lazily.
    Legacy,
    /// No provider matched.
    NoMatch,
}

impl Verification {
    /// Checks if any provider matched.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

/// An ordered chain of password providers.
pub struct ProviderChain {
    current: Box<dyn PasswordProvider>,
    legacy: Vec<Box<dyn PasswordProvider>>,
}

impl ProviderChain {
    /// Creates a chain with the given current provider and ordered legacy
    /// verifiers.
    #[must_use]
    pub fn new(current: Box<dyn PasswordProvider>, legacy: Vec<Box<dyn PasswordProvider>>) -> Self {
        Self { current, legacy }
    }

    /// Hashes a secret with the current provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the current provider fails to hash.
    pub fn hash(&self, secret: &str) -> CryptoResult<String> {
        self.current.hash(secret)
    }

    /// Verifies a secret against the stored hashes.
    ///
    /// The current provider checks the primary hash first. Legacy
    /// providers then check the dedicated legacy hash when one exists,
    /// falling back to the primary hash (a migrated row may still carry
    /// an old-format primary hash). Evaluation stops at the first match.
    #[must_use]
    pub fn verify(&self, secret: &str, password_hash: &str, legacy_hash: Option<&str>) -> Verification {
        if self.current.verify(secret, password_hash) {
            return Verification::Current;
        }

        for provider in &self.legacy {
            let stored = legacy_hash.unwrap_or(password_hash);
            if provider.verify(secret, stored) {
                return Verification::Legacy;
            }
        }

        Verification::NoMatch
    }

    /// Checks whether a primary hash should be re-created with the
    /// current provider's parameters.
    #[must_use]
    pub fn needs_rehash(&self, password_hash: &str) -> bool {
        self.current.needs_rehash(password_hash)
    }

    /// Returns the current provider's identifier.
    #[must_use]
    pub fn current_provider_id(&self) -> &'static str {
        self.current.id()
    }
}

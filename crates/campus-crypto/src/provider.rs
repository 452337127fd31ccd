//! Password provider trait and the current Argon2id provider.
//!
//! Argon2id parameters follow the OWASP recommended settings and are
//! configurable per deployment.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{CryptoError, CryptoResult};

/// A password hashing strategy.
///
/// Providers must be thread-safe; verification must not allocate secrets
/// into logs or error messages.
pub trait PasswordProvider: Send + Sync {
    /// Returns the provider identifier (stored alongside hashes for
    /// diagnostics).
    fn id(&self) -> &'static str;

    /// Hashes a secret with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the parameters or the
    /// random source fails.
    fn hash(&self, secret: &str) -> CryptoResult<String>;

    /// Verifies a secret against a stored hash.
    ///
    /// A malformed hash verifies as `false` rather than erroring, so a
    /// corrupt row cannot abort a multi-candidate resolution.
    fn verify(&self, secret: &str, hash: &str) -> bool;

    /// Checks whether a hash should be re-created with current parameters.
    fn needs_rehash(&self, _hash: &str) -> bool {
        false
    }
}

/// Argon2id parameter policy.
#[derive(Debug, Clone)]
pub struct Argon2Policy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length in bytes.
    pub hash_length: u32,
}

impl Default for Argon2Policy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl Argon2Policy {
    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

/// The current password provider: Argon2id producing PHC strings.
pub struct Argon2Provider {
    policy: Argon2Policy,
}

impl Argon2Provider {
    /// Creates a provider with the given policy.
    #[must_use]
    pub const fn new(policy: Argon2Policy) -> Self {
        Self { policy }
    }

    /// Creates a provider with the default policy.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Argon2Policy::default())
    }
}

impl Default for Argon2Provider {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PasswordProvider for Argon2Provider {
    fn id(&self) -> &'static str {
        "argon2id"
    }

    fn hash(&self, secret: &str) -> CryptoResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let params = self
            .policy
            .build_params()
            .map_err(|e| CryptoError::InvalidParams(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CryptoError::Internal(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        // Argon2::default() can verify any Argon2 variant
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };

        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return true;
        }

        let params = &parsed.params;
        let m_cost = params.get_decimal("m").unwrap_or(0);
        let t_cost = params.get_decimal("t").unwrap_or(0);
        let p_cost = params.get_decimal("p").unwrap_or(0);

        m_cost != self.policy.memory_cost
            || t_cost != self.policy.time_cost
            || p_cost != self.policy.parallelism
    }
}

//! Legacy salted-SHA-512 verification for migrated identities.
//!
//! **WARNING**: salted SHA-512 is not an acceptable password hash for new
//! writes. This provider exists solely so that identities imported from
//! the previous system keep authenticating until their hash is rotated to
//! the current provider. The chain never selects it for hashing.
//!
//! Hash format: `<hex salt>$<hex sha512(salt || secret)>`.

use aws_lc_rs::{constant_time, digest, rand};

use crate::error::{CryptoError, CryptoResult};
use crate::provider::PasswordProvider;

const SALT_LEN: usize = 16;

/// Salted-SHA-512 legacy provider.
pub struct LegacySha512Provider;

impl LegacySha512Provider {
    /// Creates the legacy provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn digest(salt: &[u8], secret: &str) -> Vec<u8> {
        let mut input = Vec::with_capacity(salt.len() + secret.len());
        input.extend_from_slice(salt);
        input.extend_from_slice(secret.as_bytes());
        digest::digest(&digest::SHA512, &input).as_ref().to_vec()
    }
}

impl Default for LegacySha512Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordProvider for LegacySha512Provider {
    fn id(&self) -> &'static str {
        "legacy-sha512"
    }

    /// Produces a legacy-format hash.
    ///
    /// Only used by import tooling; login-path writes always go through
    /// the current provider.
    fn hash(&self, secret: &str) -> CryptoResult<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::fill(&mut salt).map_err(|_| CryptoError::RandomUnavailable)?;

        let digest = Self::digest(&salt, secret);
        Ok(format!("{}${}", hex::encode(salt), hex::encode(digest)))
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let Some((salt_hex, digest_hex)) = hash.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
            return false;
        };

        let actual = Self::digest(&salt, secret);
        constant_time::verify_slices_are_equal(&actual, &expected).is_ok()
    }
}

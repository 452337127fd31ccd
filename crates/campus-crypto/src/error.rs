//! Crypto error types.

use thiserror::Error;

/// Errors that can occur during hashing operations.
///
/// Verification failure is not an error; verifiers return `false`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The hash string could not be parsed.
    #[error("malformed hash: {0}")]
    MalformedHash(String),

    /// Hashing parameters were rejected by the backend.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// The system random source failed.
    #[error("random source unavailable")]
    RandomUnavailable,

    /// Internal hashing error.
    #[error("internal crypto error: {0}")]
    Internal(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

//! Authentication error types.

use std::fmt;

use campus_storage::StorageError;

/// Authentication operation errors.
#[derive(Debug)]
pub enum AuthError {
    /// The storage layer failed.
    Storage(StorageError),
    /// A cryptographic operation failed.
    Crypto(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Crypto(msg) => write!(f, "cryptographic error: {msg}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// The field that failed validation.
    pub field: &'static str,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ValidationFailure {
    /// Creates a validation failure.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Identity write pipeline errors.
#[derive(Debug)]
pub enum WriteError {
    /// The identity failed validation; no write was attempted, or the
    /// backing store's unique constraints rejected the write.
    Validation(Vec<ValidationFailure>),
    /// The storage layer failed for non-validation reasons.
    Storage(StorageError),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(failures) => {
                write!(f, "validation failed:")?;
                for failure in failures {
                    write!(f, " [{failure}]")?;
                }
                Ok(())
            }
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Validation(_) => None,
        }
    }
}

impl From<StorageError> for WriteError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

//! Storage error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (e.g., "Identity").
        entity_type: &'static str,
        /// Entity ID.
        id: Uuid,
    },

    /// Unique constraint violation.
    ///
    /// This is the storage layer acting as the race arbiter for the
    /// uniqueness invariants; callers convert it to a validation failure.
    #[error("duplicate {entity_type}: {field} '{value}' already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    Connection(String),

    /// Database query error.
    #[error("database query error: {0}")]
    Query(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Internal error.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error.
    #[must_use]
    pub const fn not_found(entity_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity_type, id }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(
        entity_type: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity_type,
            field,
            value: value.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

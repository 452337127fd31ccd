//! SQL storage error conversion.

use campus_storage::StorageError;
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Converts a `SQLx` error to a storage error.
///
/// Unique-constraint violations (PostgreSQL error code 23505) are mapped
/// to `StorageError::Duplicate` with the field inferred from the index
/// name, so the write pipeline can convert them into field-level
/// validation failures.
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::Database(db_err) => {
            if db_err.code().is_some_and(|c| c == "23505") {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("sis") => "sis_identifier",
                    Some(c) if c.contains("integration") => "integration_identifier",
                    _ => "identifier",
                };
                StorageError::duplicate("Identity", field, db_err.message())
            } else {
                StorageError::Query(db_err.to_string())
            }
        }
        SqlxError::PoolTimedOut => StorageError::Connection("connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("connection pool closed".to_string()),
        _ => StorageError::Internal(err.to_string()),
    }
}

/// Creates a not found error for the given entity type and ID.
pub const fn not_found(entity_type: &'static str, id: Uuid) -> StorageError {
    StorageError::not_found(entity_type, id)
}

//! `PostgreSQL` implementation of the attempt log.

use async_trait::async_trait;
use campus_model::AuthenticationAttempt;
use campus_storage::{AttemptLog, StorageResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::AttemptRow;
use crate::error::from_sqlx_error;

/// `PostgreSQL` attempt log.
///
/// The table is append-only; rows are never updated or deleted while the
/// identity they reference exists.
pub struct PgAttemptLog {
    pool: PgPool,
}

impl PgAttemptLog {
    /// Creates a new `PostgreSQL` attempt log.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptLog for PgAttemptLog {
    async fn record(&self, attempt: &AuthenticationAttempt) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO authentication_attempts (
                id, identity_id, remote_address, succeeded, attempted_at
            ) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(attempt.id)
        .bind(attempt.identity_id)
        .bind(&attempt.remote_address)
        .bind(attempt.succeeded)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn list_for_identity(
        &self,
        identity_id: Uuid,
        limit: usize,
    ) -> StorageResult<Vec<AuthenticationAttempt>> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            r"SELECT * FROM authentication_attempts
            WHERE identity_id = $1
            ORDER BY attempted_at DESC
            LIMIT $2",
        )
        .bind(identity_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(AuthenticationAttempt::from).collect())
    }
}

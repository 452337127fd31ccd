//! `PostgreSQL` implementation of the identity store.

use async_trait::async_trait;
use campus_model::Identity;
use campus_storage::{IdentityStore, StorageResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::IdentityRow;
use crate::error::{from_sqlx_error, not_found};

/// `PostgreSQL` identity store.
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Creates a new `PostgreSQL` identity store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> StorageResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM identities WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(exists)
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create(&self, identity: &Identity) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO identities (
                id, account_id, user_id, identifier, auth_provider_id,
                password_hash, legacy_hash, password_auto_generated,
                state, deleted_at, sis_identifier, integration_identifier,
                login_count, last_request_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(identity.id)
        .bind(identity.account_id)
        .bind(identity.user_id)
        .bind(&identity.identifier)
        .bind(identity.auth_provider_id)
        .bind(&identity.password_hash)
        .bind(&identity.legacy_hash)
        .bind(identity.password_auto_generated)
        .bind(identity.state.as_str())
        .bind(identity.deleted_at)
        .bind(&identity.sis_identifier)
        .bind(&identity.integration_identifier)
        .bind(identity.login_count)
        .bind(identity.last_request_at)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, identity: &Identity) -> StorageResult<()> {
        let result = sqlx::query(
            r"UPDATE identities SET
                identifier = $2, auth_provider_id = $3, password_hash = $4,
                legacy_hash = $5, password_auto_generated = $6, state = $7,
                deleted_at = $8, sis_identifier = $9, integration_identifier = $10
            WHERE id = $1",
        )
        .bind(identity.id)
        .bind(&identity.identifier)
        .bind(identity.auth_provider_id)
        .bind(&identity.password_hash)
        .bind(&identity.legacy_hash)
        .bind(identity.password_auto_generated)
        .bind(identity.state.as_str())
        .bind(identity.deleted_at)
        .bind(&identity.sis_identifier)
        .bind(&identity.integration_identifier)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Identity", identity.id));
        }

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<Identity>> {
        let row: Option<IdentityRow> = sqlx::query_as("SELECT * FROM identities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        Ok(row.map(Identity::from))
    }

    async fn find_active_by_identifier(
        &self,
        account_ids: &[Uuid],
        identifier: &str,
    ) -> StorageResult<Vec<Identity>> {
        let rows: Vec<IdentityRow> = sqlx::query_as(
            r"SELECT * FROM identities
            WHERE state = 'active'
              AND lower(identifier) = lower($1)
              AND account_id = ANY($2)
            ORDER BY id",
        )
        .bind(identifier)
        .bind(account_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Identity::from).collect())
    }

    async fn identifier_taken(
        &self,
        account_id: Uuid,
        auth_provider_id: Option<Uuid>,
        identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r"SELECT EXISTS(
                SELECT 1 FROM identities
                WHERE state = 'active'
                  AND account_id = $1
                  AND auth_provider_id IS NOT DISTINCT FROM $2
                  AND lower(identifier) = lower($3)
                  AND ($4::uuid IS NULL OR id <> $4)
            )",
        )
        .bind(account_id)
        .bind(auth_provider_id)
        .bind(identifier)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(taken)
    }

    async fn sis_identifier_taken(
        &self,
        account_id: Uuid,
        sis_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r"SELECT EXISTS(
                SELECT 1 FROM identities
                WHERE account_id = $1
                  AND sis_identifier = $2
                  AND ($3::uuid IS NULL OR id <> $3)
            )",
        )
        .bind(account_id)
        .bind(sis_identifier)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(taken)
    }

    async fn integration_identifier_taken(
        &self,
        account_id: Uuid,
        integration_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r"SELECT EXISTS(
                SELECT 1 FROM identities
                WHERE account_id = $1
                  AND integration_identifier = $2
                  AND ($3::uuid IS NULL OR id <> $3)
            )",
        )
        .bind(account_id)
        .bind(integration_identifier)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        Ok(taken)
    }

    async fn soft_delete(&self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE identities SET state = 'deleted', deleted_at = now() WHERE id = $1 AND state = 'active'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        // Zero rows means either already deleted (idempotent no-op) or
        // genuinely missing.
        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(not_found("Identity", id));
        }

        Ok(())
    }

    async fn bind_provider(&self, id: Uuid, provider_id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE identities SET auth_provider_id = $2 WHERE id = $1 AND auth_provider_id IS NULL",
        )
        .bind(id)
        .bind(provider_id)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if !self.exists(id).await? {
            return Err(not_found("Identity", id));
        }

        Ok(false)
    }

    async fn record_login(&self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE identities SET login_count = login_count + 1, last_request_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Identity", id));
        }

        Ok(())
    }

    async fn replace_password_hash(&self, id: Uuid, password_hash: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE identities SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Identity", id));
        }

        Ok(())
    }
}

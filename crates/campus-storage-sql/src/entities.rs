//! Row structs mapping database tables to domain models.

use campus_model::{AuthenticationAttempt, Identity, IdentityState};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the `identities` table.
#[derive(Debug, FromRow)]
pub struct IdentityRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning root account.
    pub account_id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Login identifier (stored with original casing).
    pub identifier: String,
    /// Explicit provider binding.
    pub auth_provider_id: Option<Uuid>,
    /// Current password hash.
    pub password_hash: String,
    /// Legacy migration hash.
    pub legacy_hash: Option<String>,
    /// Whether the secret was system-generated.
    pub password_auto_generated: bool,
    /// Lifecycle state ("active" or "deleted").
    pub state: String,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// SIS identifier.
    pub sis_identifier: Option<String>,
    /// Integration identifier.
    pub integration_identifier: Option<String>,
    /// Successful login count.
    pub login_count: i64,
    /// Last request timestamp.
    pub last_request_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            user_id: row.user_id,
            identifier: row.identifier,
            auth_provider_id: row.auth_provider_id,
            password_hash: row.password_hash,
            legacy_hash: row.legacy_hash,
            password_auto_generated: row.password_auto_generated,
            state: match row.state.as_str() {
                "deleted" => IdentityState::Deleted,
                _ => IdentityState::Active,
            },
            deleted_at: row.deleted_at,
            sis_identifier: row.sis_identifier,
            integration_identifier: row.integration_identifier,
            login_count: row.login_count,
            last_request_at: row.last_request_at,
            created_at: row.created_at,
        }
    }
}

/// Row of the `authentication_attempts` table.
#[derive(Debug, FromRow)]
pub struct AttemptRow {
    /// Primary key.
    pub id: Uuid,
    /// Identity the attempt was made against.
    pub identity_id: Uuid,
    /// Remote address.
    pub remote_address: String,
    /// Whether verification succeeded.
    pub succeeded: bool,
    /// When the attempt happened.
    pub attempted_at: DateTime<Utc>,
}

impl From<AttemptRow> for AuthenticationAttempt {
    fn from(row: AttemptRow) -> Self {
        Self {
            id: row.id,
            identity_id: row.identity_id,
            remote_address: row.remote_address,
            succeeded: row.succeeded,
            attempted_at: row.attempted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_state_conversion() {
        let row = IdentityRow {
            id: Uuid::now_v7(),
            account_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            identifier: "a@b.com".to_string(),
            auth_provider_id: None,
            password_hash: "hash".to_string(),
            legacy_hash: None,
            password_auto_generated: false,
            state: "deleted".to_string(),
            deleted_at: Some(Utc::now()),
            sis_identifier: None,
            integration_identifier: None,
            login_count: 3,
            last_request_at: None,
            created_at: Utc::now(),
        };

        let identity = Identity::from(row);
        assert!(identity.is_deleted());
        assert_eq!(identity.login_count, 3);
    }
}

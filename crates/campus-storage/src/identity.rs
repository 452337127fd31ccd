//! Identity storage provider trait.

use async_trait::async_trait;
use campus_model::Identity;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for login-identity storage.
///
/// Implementations must be thread-safe and support concurrent access.
/// `create` and `update` run against the backing store's unique
/// constraints: exactly one of two concurrent writers creating the same
/// `(account, identifier, provider)` triple succeeds, the other receives
/// `StorageError::Duplicate`.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Creates a new identity.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` on a uniqueness violation.
    async fn create(&self, identity: &Identity) -> StorageResult<()>;

    /// Updates an existing identity.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the identity does not exist,
    /// or `StorageError::Duplicate` on a uniqueness violation.
    async fn update(&self, identity: &Identity) -> StorageResult<()>;

    /// Gets an identity by ID.
    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<Identity>>;

    /// Loads all active identities matching an identifier
    /// (case-insensitively) within the given accounts.
    async fn find_active_by_identifier(
        &self,
        account_ids: &[Uuid],
        identifier: &str,
    ) -> StorageResult<Vec<Identity>>;

    /// Checks whether another active identity holds the same
    /// case-insensitive identifier in the same `(account, provider)`
    /// scope.
    async fn identifier_taken(
        &self,
        account_id: Uuid,
        auth_provider_id: Option<Uuid>,
        identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool>;

    /// Checks whether any other identity in the account (regardless of
    /// state) holds the same SIS identifier.
    async fn sis_identifier_taken(
        &self,
        account_id: Uuid,
        sis_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool>;

    /// Checks whether any other identity in the account (regardless of
    /// state) holds the same integration identifier.
    async fn integration_identifier_taken(
        &self,
        account_id: Uuid,
        integration_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool>;

    /// Soft-deletes an identity (terminal state, row persists).
    ///
    /// Idempotent: deleting an already-deleted identity is a no-op.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the identity does not exist.
    async fn soft_delete(&self, id: Uuid) -> StorageResult<()>;

    /// Binds an identity to an authentication provider, write-once.
    ///
    /// Only takes effect when the identity is not already bound; returns
    /// whether the binding was written.
    async fn bind_provider(&self, id: Uuid, provider_id: Uuid) -> StorageResult<bool>;

    /// Records a successful login: increments `login_count` and touches
    /// `last_request_at`.
    async fn record_login(&self, id: Uuid) -> StorageResult<()>;

    /// Replaces the primary password hash (used for lazy re-hash after a
    /// legacy match). Leaves the legacy hash in place; explicit password
    /// changes go through `update`.
    async fn replace_password_hash(&self, id: Uuid, password_hash: &str) -> StorageResult<()>;
}

//! Collaborator traits for credential resolution.
//!
//! The resolver and write pipeline see the rest of the system through
//! these narrow interfaces: account and provider lookup, user-side side
//! effects, and registration notification. Side-effect failures are
//! logged by the caller and never veto an otherwise successful login.

use std::sync::Arc;

use async_trait::async_trait;
use campus_ldap::DirectoryBinder;
use campus_model::{Account, AuthenticationProvider};
use campus_storage::StorageResult;
use uuid::Uuid;

/// Account and authentication-provider lookup.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Gets an account by ID.
    async fn get_account(&self, id: Uuid) -> StorageResult<Option<Account>>;

    /// Gets an authentication provider by ID.
    async fn get_provider(&self, id: Uuid) -> StorageResult<Option<AuthenticationProvider>>;

    /// Returns directory binders for the account's active LDAP providers,
    /// in configured position order.
    async fn ldap_binders(&self, account_id: Uuid) -> Vec<Arc<dyn DirectoryBinder>>;

    /// Returns the storage shard an account lives on.
    ///
    /// Resolution batches identifier lookups per shard. Single-shard
    /// deployments return a constant.
    fn shard_of(&self, account_id: Uuid) -> u32 {
        let _ = account_id;
        0
    }
}

/// User-side effects of identity lifecycle events.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Provisions a communication channel for an email address learned
    /// from a directory bind.
    async fn provision_channel(&self, user_id: Uuid, email: &str) -> StorageResult<()>;

    /// Retires communication channels matching a destroyed identity's
    /// identifier.
    async fn retire_channels(&self, user_id: Uuid, identifier: &str) -> StorageResult<()>;

    /// Schedules a background recompute of the user's account
    /// associations.
    async fn schedule_association_recompute(&self, user_id: Uuid) -> StorageResult<()>;

    /// Transitions a pre-registered user to registered.
    ///
    /// Returns `true` only on the first transition.
    async fn mark_registered(&self, user_id: Uuid) -> StorageResult<bool>;
}

/// Fire-and-forget notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notifies that a user completed registration via first login.
    async fn registration_confirmed(&self, user_id: Uuid);
}

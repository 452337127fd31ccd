//! In-memory storage backends.
//!
//! Used by tests and single-node development setups. The uniqueness
//! checks here mirror the SQL backend's unique indexes so the in-memory
//! store is an equivalent race arbiter.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use campus_model::{AuthenticationAttempt, Identity};
use uuid::Uuid;

use crate::attempt::AttemptLog;
use crate::error::{StorageError, StorageResult};
use crate::identity::IdentityStore;

/// In-memory identity store.
#[derive(Default)]
pub struct MemoryIdentityStore {
    rows: RwLock<HashMap<Uuid, Identity>>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforces the unique indexes against every row except `identity`
    /// itself. Runs under the same lock as the insert, so the check and
    /// the write are atomic.
    fn check_constraints(
        rows: &HashMap<Uuid, Identity>,
        identity: &Identity,
    ) -> StorageResult<()> {
        let key = identity.identifier_key();

        for other in rows.values() {
            if other.id == identity.id {
                continue;
            }

            if identity.is_active()
                && other.is_active()
                && other.account_id == identity.account_id
                && other.auth_provider_id == identity.auth_provider_id
                && other.identifier_key() == key
            {
                return Err(StorageError::duplicate(
                    "Identity",
                    "identifier",
                    &identity.identifier,
                ));
            }

            if let Some(sis) = &identity.sis_identifier {
                if other.account_id == identity.account_id
                    && other.sis_identifier.as_deref() == Some(sis)
                {
                    return Err(StorageError::duplicate("Identity", "sis_identifier", sis));
                }
            }

            if let Some(integration) = &identity.integration_identifier {
                if other.account_id == identity.account_id
                    && other.integration_identifier.as_deref() == Some(integration)
                {
                    return Err(StorageError::duplicate(
                        "Identity",
                        "integration_identifier",
                        integration,
                    ));
                }
            }
        }

        Ok(())
    }

    fn lock_poisoned() -> StorageError {
        StorageError::Internal("store lock poisoned".to_string())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, identity: &Identity) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        Self::check_constraints(&rows, identity)?;
        rows.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn update(&self, identity: &Identity) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        if !rows.contains_key(&identity.id) {
            return Err(StorageError::not_found("Identity", identity.id));
        }
        Self::check_constraints(&rows, identity)?;
        rows.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<Identity>> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.get(&id).cloned())
    }

    async fn find_active_by_identifier(
        &self,
        account_ids: &[Uuid],
        identifier: &str,
    ) -> StorageResult<Vec<Identity>> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        let mut matches: Vec<Identity> = rows
            .values()
            .filter(|row| {
                row.is_active()
                    && account_ids.contains(&row.account_id)
                    && row.identifier_matches(identifier)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|row| row.id);
        Ok(matches)
    }

    async fn identifier_taken(
        &self,
        account_id: Uuid,
        auth_provider_id: Option<Uuid>,
        identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.values().any(|row| {
            row.is_active()
                && Some(row.id) != excluding
                && row.account_id == account_id
                && row.auth_provider_id == auth_provider_id
                && row.identifier_matches(identifier)
        }))
    }

    async fn sis_identifier_taken(
        &self,
        account_id: Uuid,
        sis_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.values().any(|row| {
            Some(row.id) != excluding
                && row.account_id == account_id
                && row.sis_identifier.as_deref() == Some(sis_identifier)
        }))
    }

    async fn integration_identifier_taken(
        &self,
        account_id: Uuid,
        integration_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.values().any(|row| {
            Some(row.id) != excluding
                && row.account_id == account_id
                && row.integration_identifier.as_deref() == Some(integration_identifier)
        }))
    }

    async fn soft_delete(&self, id: Uuid) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let Some(row) = rows.get_mut(&id) else {
            return Err(StorageError::not_found("Identity", id));
        };
        row.mark_deleted();
        Ok(())
    }

    async fn bind_provider(&self, id: Uuid, provider_id: Uuid) -> StorageResult<bool> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let Some(row) = rows.get_mut(&id) else {
            return Err(StorageError::not_found("Identity", id));
        };
        if row.auth_provider_id.is_some() {
            return Ok(false);
        }
        row.auth_provider_id = Some(provider_id);
        Ok(true)
    }

    async fn record_login(&self, id: Uuid) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let Some(row) = rows.get_mut(&id) else {
            return Err(StorageError::not_found("Identity", id));
        };
        row.record_login();
        Ok(())
    }

    async fn replace_password_hash(&self, id: Uuid, password_hash: &str) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let Some(row) = rows.get_mut(&id) else {
            return Err(StorageError::not_found("Identity", id));
        };
        row.password_hash = password_hash.to_string();
        Ok(())
    }
}

/// In-memory attempt log.
#[derive(Default)]
pub struct MemoryAttemptLog {
    attempts: Mutex<Vec<AuthenticationAttempt>>,
}

impl MemoryAttemptLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptLog for MemoryAttemptLog {
    async fn record(&self, attempt: &AuthenticationAttempt) -> StorageResult<()> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|_| StorageError::Internal("attempt log lock poisoned".to_string()))?;
        attempts.push(attempt.clone());
        Ok(())
    }

    async fn list_for_identity(
        &self,
        identity_id: Uuid,
        limit: usize,
    ) -> StorageResult<Vec<AuthenticationAttempt>> {
        let attempts = self
            .attempts
            .lock()
            .map_err(|_| StorageError::Internal("attempt log lock poisoned".to_string()))?;
        let mut matching: Vec<AuthenticationAttempt> = attempts
            .iter()
            .filter(|attempt| attempt.identity_id == identity_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

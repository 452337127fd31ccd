//! Identity write pipeline.
//!
//! Writes go through explicit, separately-callable phases: `validate`,
//! `before_write`, `write`, `after_write`. The convenience `save`
//! sequences them. Validation is an early reject; the backing store's
//! unique constraints remain the final authority on uniqueness, and a
//! constraint rejection surfaces as the same field-level validation
//! failure a pre-check would have produced.

use std::sync::Arc;
use std::sync::LazyLock;

use campus_model::{Identity, MAX_IDENTIFIER_LEN};
use campus_storage::{IdentityStore, StorageError, StorageResult};
use regex::Regex;

use crate::directory::{AccountDirectory, UserDirectory};
use crate::error::{ValidationFailure, WriteError};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("hard-coded pattern"));

/// Sequenced write pipeline for login identities.
pub struct IdentityWritePipeline {
    store: Arc<dyn IdentityStore>,
    accounts: Arc<dyn AccountDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl IdentityWritePipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        accounts: Arc<dyn AccountDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            accounts,
            users,
        }
    }

    /// Validates an identity against account settings and uniqueness
    /// scopes.
    ///
    /// Returns all failures found, not just the first. An empty vec means
    /// the identity may be written.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a lookup fails; validation itself never
    /// errors.
    pub async fn validate(&self, identity: &Identity) -> StorageResult<Vec<ValidationFailure>> {
        let mut failures = Vec::new();

        let account = self.accounts.get_account(identity.account_id).await?;
        let account = match account {
            Some(account) if account.is_root() => Some(account),
            Some(_) => {
                failures.push(ValidationFailure::new(
                    "account_id",
                    "identities may only belong to root accounts",
                ));
                None
            }
            None => {
                failures.push(ValidationFailure::new("account_id", "account not found"));
                None
            }
        };

        let identifier = identity.identifier.trim();
        if identifier.is_empty() {
            failures.push(ValidationFailure::new("identifier", "must not be blank"));
        } else if identifier.chars().count() > MAX_IDENTIFIER_LEN {
            failures.push(ValidationFailure::new(
                "identifier",
                format!("must be at most {MAX_IDENTIFIER_LEN} characters"),
            ));
        } else if identifier.chars().any(char::is_control) {
            failures.push(ValidationFailure::new(
                "identifier",
                "must not contain control characters",
            ));
        } else if account
            .as_ref()
            .is_some_and(|a| a.require_email_identifier)
            && identity.is_active()
            && !EMAIL_RE.is_match(identifier)
        {
            failures.push(ValidationFailure::new(
                "identifier",
                "must be a valid email address",
            ));
        }

        // Uniqueness pre-checks. Deleted identities release the login
        // identifier but keep holding their SIS scopes.
        if identity.is_active()
            && !identifier.is_empty()
            && self
                .store
                .identifier_taken(
                    identity.account_id,
                    identity.auth_provider_id,
                    identifier,
                    Some(identity.id),
                )
                .await?
        {
            failures.push(ValidationFailure::new("identifier", "already in use"));
        }

        if let Some(sis_id) = &identity.sis_identifier {
            if self
                .store
                .sis_identifier_taken(identity.account_id, sis_id, Some(identity.id))
                .await?
            {
                failures.push(ValidationFailure::new("sis_identifier", "already in use"));
            }
        }

        if let Some(integration_id) = &identity.integration_identifier {
            if self
                .store
                .integration_identifier_taken(identity.account_id, integration_id, Some(identity.id))
                .await?
            {
                failures.push(ValidationFailure::new(
                    "integration_identifier",
                    "already in use",
                ));
            }
        }

        Ok(failures)
    }

    /// Normalizes the identity before it is written.
    pub fn before_write(&self, identity: &mut Identity) {
        let trimmed = identity.identifier.trim();
        if trimmed.len() != identity.identifier.len() {
            identity.identifier = trimmed.to_string();
        }
    }

    /// Writes the identity.
    ///
    /// A unique-constraint rejection from the store (a concurrent writer
    /// won the race) converts to a validation failure on the conflicting
    /// field rather than an internal error.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::Validation` on a uniqueness conflict, or
    /// `WriteError::Storage` for other storage faults.
    pub async fn write(&self, identity: &Identity, is_new: bool) -> Result<(), WriteError> {
        let result = if is_new {
            self.store.create(identity).await
        } else {
            self.store.update(identity).await
        };

        result.map_err(|e| match e {
            StorageError::Duplicate { field, .. } => WriteError::Validation(vec![
                ValidationFailure::new(duplicate_field(field), "already in use"),
            ]),
            other => WriteError::Storage(other),
        })
    }

    /// Post-write bookkeeping.
    pub fn after_write(&self, identity: &Identity) {
        tracing::debug!(
            identity_id = %identity.id,
            account_id = %identity.account_id,
            state = identity.state.as_str(),
            "identity written"
        );
    }

    /// Runs the full pipeline: validate, normalize, write, post-write.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::Validation` with every failure found when
    /// validation rejects the identity, and the `write` errors otherwise.
    pub async fn save(&self, identity: &mut Identity, is_new: bool) -> Result<(), WriteError> {
        let failures = self.validate(identity).await?;
        if !failures.is_empty() {
            return Err(WriteError::Validation(failures));
        }

        self.before_write(identity);
        self.write(identity, is_new).await?;
        self.after_write(identity);
        Ok(())
    }

    /// Destroys an identity: soft delete plus user-side cleanup.
    ///
    /// Idempotent; destroying an already-deleted identity repeats the
    /// cleanup without error. Cleanup failures are logged, never raised.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the identity does not exist or the
    /// delete itself fails.
    pub async fn destroy(&self, identity: &mut Identity) -> StorageResult<()> {
        self.store.soft_delete(identity.id).await?;
        identity.mark_deleted();

        if let Err(e) = self
            .users
            .retire_channels(identity.user_id, &identity.identifier)
            .await
        {
            tracing::warn!(identity_id = %identity.id, error = %e, "failed to retire channels");
        }

        if let Err(e) = self
            .users
            .schedule_association_recompute(identity.user_id)
            .await
        {
            tracing::warn!(
                identity_id = %identity.id,
                error = %e,
                "failed to schedule association recompute"
            );
        }

        tracing::info!(identity_id = %identity.id, "identity destroyed");
        Ok(())
    }
}

/// Maps a storage duplicate field name to the validation field constant.
fn duplicate_field(field: &'static str) -> &'static str {
    match field {
        "sis_identifier" => "sis_identifier",
        "integration_identifier" => "integration_identifier",
        _ => "identifier",
    }
}

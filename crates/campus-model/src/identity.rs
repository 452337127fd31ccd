//! Login identity domain model.
//!
//! An identity is one login credential record: an identifier (unique
//! case-insensitively within its account/provider scope while active),
//! the hashed secret, optional SIS synchronization fields, and a
//! soft-delete lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted identifier length.
///
/// Longer submissions are rejected before any storage lookup to avoid
/// pathological comparisons on degenerate input.
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// Identity lifecycle state.
///
/// The only permitted transition is `Active -> Deleted`; deletion is
/// terminal and soft (the row persists for audit history).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityState {
    /// The identity can authenticate.
    Active,
    /// The identity has been retired and can no longer authenticate.
    Deleted,
}

impl IdentityState {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }
}

/// A login identity.
///
/// Each identity binds one login identifier to exactly one user within
/// exactly one root account.
///
/// ## Security Note
///
/// `password_hash` holds a PHC-formatted hash; `legacy_hash` holds an
/// old-format salted digest retained only for verification during hash
/// migration. Neither field ever contains a plaintext secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// Root account this identity belongs to.
    pub account_id: Uuid,
    /// User this identity belongs to.
    pub user_id: Uuid,

    // === Login ===
    /// The login identifier (compared case-insensitively).
    pub identifier: String,
    /// Explicitly bound external authentication provider, if any.
    ///
    /// An identity without an explicit provider uses the account's
    /// default authentication mode.
    pub auth_provider_id: Option<Uuid>,

    // === Secrets ===
    /// Current password hash (PHC string).
    pub password_hash: String,
    /// Old-format hash kept for verification during migration.
    pub legacy_hash: Option<String>,
    /// Whether the stored secret was system-generated (the user never
    /// set an explicit password).
    pub password_auto_generated: bool,

    // === Lifecycle ===
    /// Lifecycle state.
    pub state: IdentityState,
    /// When the identity was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,

    // === SIS Synchronization ===
    /// Student-information-system identifier, unique within the account.
    pub sis_identifier: Option<String>,
    /// Integration identifier, unique within the account.
    pub integration_identifier: Option<String>,

    // === Bookkeeping ===
    /// Number of successful logins.
    pub login_count: i64,
    /// Last time a request was served for this identity.
    pub last_request_at: Option<DateTime<Utc>>,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Creates a new active identity.
    #[must_use]
    pub fn new(
        account_id: Uuid,
        user_id: Uuid,
        identifier: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            user_id,
            identifier: identifier.into(),
            auth_provider_id: None,
            password_hash: password_hash.into(),
            legacy_hash: None,
            password_auto_generated: false,
            state: IdentityState::Active,
            deleted_at: None,
            sis_identifier: None,
            integration_identifier: None,
            login_count: 0,
            last_request_at: None,
            created_at: Utc::now(),
        }
    }

    /// Binds the identity to an explicit authentication provider.
    #[must_use]
    pub const fn with_provider(mut self, provider_id: Uuid) -> Self {
        self.auth_provider_id = Some(provider_id);
        self
    }

    /// Sets the SIS identifier.
    #[must_use]
    pub fn with_sis_identifier(mut self, sis_id: impl Into<String>) -> Self {
        self.sis_identifier = Some(sis_id.into());
        self
    }

    /// Sets the integration identifier.
    #[must_use]
    pub fn with_integration_identifier(mut self, integration_id: impl Into<String>) -> Self {
        self.integration_identifier = Some(integration_id.into());
        self
    }

    /// Marks the stored secret as system-generated with a legacy hash.
    ///
    /// Used for SIS-provisioned identities migrated from an older hashing
    /// scheme.
    #[must_use]
    pub fn with_legacy_hash(mut self, legacy_hash: impl Into<String>) -> Self {
        self.legacy_hash = Some(legacy_hash.into());
        self.password_auto_generated = true;
        self
    }

    /// Checks if the identity is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, IdentityState::Active)
    }

    /// Checks if the identity is deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self.state, IdentityState::Deleted)
    }

    /// Returns the identifier lowered for case-insensitive comparison.
    #[must_use]
    pub fn identifier_key(&self) -> String {
        self.identifier.to_lowercase()
    }

    /// Checks if the submitted identifier matches, case-insensitively.
    ///
    /// Uses the same Unicode folding as [`Self::identifier_key`] and the
    /// SQL backend's `lower()`, so every comparison path agrees on
    /// non-ASCII identifiers.
    #[must_use]
    pub fn identifier_matches(&self, submitted: &str) -> bool {
        self.identifier.to_lowercase() == submitted.to_lowercase()
    }

    /// Installs an explicitly chosen password hash.
    ///
    /// Clears the legacy hash and the auto-generated flag: once a user
    /// sets a real password the old-format hash must never verify again.
    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.legacy_hash = None;
        self.password_auto_generated = false;
    }

    /// Soft-deletes the identity.
    ///
    /// Idempotent: deleting an already-deleted identity keeps the original
    /// `deleted_at` timestamp.
    pub fn mark_deleted(&mut self) {
        if self.is_deleted() {
            return;
        }
        self.state = IdentityState::Deleted;
        self.deleted_at = Some(Utc::now());
    }

    /// Records a successful login.
    pub fn record_login(&mut self) {
        self.login_count += 1;
        self.last_request_at = Some(Utc::now());
    }
}

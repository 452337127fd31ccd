//! Authentication attempt log trait.

use async_trait::async_trait;
use campus_model::AuthenticationAttempt;
use uuid::Uuid;

use crate::error::StorageResult;

/// Append-only log of authentication attempts.
///
/// Every attempt, success or failure, is recorded exactly once. The
/// rolling failure counters that drive lockout live in the counter
/// store, not here; this log is the durable audit trail.
#[async_trait]
pub trait AttemptLog: Send + Sync {
    /// Appends an attempt record.
    async fn record(&self, attempt: &AuthenticationAttempt) -> StorageResult<()>;

    /// Lists attempts for an identity, most recent first.
    async fn list_for_identity(
        &self,
        identity_id: Uuid,
        limit: usize,
    ) -> StorageResult<Vec<AuthenticationAttempt>>;
}

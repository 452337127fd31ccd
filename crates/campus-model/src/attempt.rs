//! Authentication attempt records.
//!
//! Append-only audit rows; the rolling failure counters that drive the
//! lockout gate live in the counter store, keyed by identity and remote
//! address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded authentication attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationAttempt {
    /// Unique identifier.
    pub id: Uuid,
    /// Identity the attempt was made against.
    pub identity_id: Uuid,
    /// Remote address the attempt came from.
    pub remote_address: String,
    /// Whether verification succeeded.
    pub succeeded: bool,
    /// When the attempt happened.
    pub attempted_at: DateTime<Utc>,
}

impl AuthenticationAttempt {
    /// Records a new attempt.
    #[must_use]
    pub fn new(identity_id: Uuid, remote_address: impl Into<String>, succeeded: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            identity_id,
            remote_address: remote_address.into(),
            succeeded,
            attempted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_creation() {
        let identity_id = Uuid::now_v7();
        let attempt = AuthenticationAttempt::new(identity_id, "203.0.113.7", false);

        assert_eq!(attempt.identity_id, identity_id);
        assert_eq!(attempt.remote_address, "203.0.113.7");
        assert!(!attempt.succeeded);
    }
}

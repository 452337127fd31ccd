//! Attempt auditing.
//!
//! Every attempt against a candidate identity is recorded exactly once:
//! an append-only log row plus a gate counter update. A log write
//! failure is a diagnostic, never a login failure.

use std::sync::Arc;

use campus_model::AuthenticationAttempt;
use campus_storage::AttemptLog;
use uuid::Uuid;

use crate::gate::{GateState, LoginGate};

/// Records attempts to the log and drives the gate counters.
pub struct Auditor {
    log: Arc<dyn AttemptLog>,
    gate: LoginGate,
}

impl Auditor {
    /// Creates an auditor.
    #[must_use]
    pub const fn new(log: Arc<dyn AttemptLog>, gate: LoginGate) -> Self {
        Self { log, gate }
    }

    /// Returns the gate for read-only state checks.
    #[must_use]
    pub const fn gate(&self) -> &LoginGate {
        &self.gate
    }

    async fn append(&self, identity_id: Uuid, remote_address: &str, succeeded: bool) {
        let attempt = AuthenticationAttempt::new(identity_id, remote_address, succeeded);
        if let Err(e) = self.log.record(&attempt).await {
            tracing::warn!(
                identity_id = %identity_id,
                error = %e,
                "failed to record authentication attempt"
            );
        }
    }

    /// Records the outcome of a verified attempt.
    ///
    /// Failures bump the pair's gate counter; successes reset it.
    pub async fn record(
        &self,
        identity_id: Uuid,
        remote_address: &str,
        succeeded: bool,
    ) -> GateState {
        self.append(identity_id, remote_address, succeeded).await;

        if succeeded {
            self.gate.record_success(identity_id, remote_address).await;
            GateState::Normal
        } else {
            self.gate.record_failure(identity_id, remote_address).await
        }
    }

    /// Records an attempt suppressed by an active lockout.
    ///
    /// The attempt lands in the log as a failure but does not bump the
    /// counter; the lockout window is not extended by retries.
    pub async fn record_suppressed(&self, identity_id: Uuid, remote_address: &str) {
        self.append(identity_id, remote_address, false).await;
    }
}

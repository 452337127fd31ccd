//! Login attempt gate.
//!
//! Rolling failure counters keyed by `(identity, remote address)` back a
//! three-state gate: normal, warning, locked. Counters live in the
//! shared counter store so every node sees the same totals; increments
//! are atomic at the backend.
//!
//! When the counter store is unreachable the gate degrades open: the
//! outage is logged once per call and attempts are treated as normal,
//! so a cache failure never becomes a site-wide login outage.

use std::sync::Arc;
use std::time::Duration;

use campus_cache::AtomicCacheProvider;
use uuid::Uuid;

/// Default failure count at which the gate starts warning.
pub const DEFAULT_WARN_THRESHOLD: i64 = 5;

/// Default failure count at which the gate locks.
pub const DEFAULT_LOCK_THRESHOLD: i64 = 10;

/// Default rolling window for failure counters.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Gate thresholds and counter window.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Failure count at which the gate starts warning.
    pub warn_threshold: i64,
    /// Failure count at which the gate locks.
    pub lock_threshold: i64,
    /// Rolling window; counters expire this long after the first failure.
    pub window: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            lock_threshold: DEFAULT_LOCK_THRESHOLD,
            window: DEFAULT_WINDOW,
        }
    }
}

impl GateConfig {
    /// Creates a config with custom thresholds.
    #[must_use]
    pub const fn new(warn_threshold: i64, lock_threshold: i64, window: Duration) -> Self {
        Self {
            warn_threshold,
            lock_threshold,
            window,
        }
    }
}

/// State of the gate for one `(identity, remote address)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Below the warning threshold.
    Normal,
    /// At or above the warning threshold, below the lock threshold.
    Warning,
    /// At or above the lock threshold; verification must not run.
    Locked,
}

impl GateState {
    /// Checks if the pair is locked out.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Failure-count gate over a shared atomic counter store.
pub struct LoginGate {
    counters: Arc<dyn AtomicCacheProvider>,
    config: GateConfig,
}

impl LoginGate {
    /// Creates a gate with default thresholds.
    #[must_use]
    pub fn new(counters: Arc<dyn AtomicCacheProvider>) -> Self {
        Self::with_config(counters, GateConfig::default())
    }

    /// Creates a gate with the given thresholds.
    #[must_use]
    pub fn with_config(counters: Arc<dyn AtomicCacheProvider>, config: GateConfig) -> Self {
        Self { counters, config }
    }

    fn key(identity_id: Uuid, remote_address: &str) -> String {
        format!("login_failures:{identity_id}:{remote_address}")
    }

    const fn classify(&self, count: i64) -> GateState {
        if count >= self.config.lock_threshold {
            GateState::Locked
        } else if count >= self.config.warn_threshold {
            GateState::Warning
        } else {
            GateState::Normal
        }
    }

    /// Returns the current gate state for a pair without recording
    /// anything.
    pub async fn state(&self, identity_id: Uuid, remote_address: &str) -> GateState {
        let key = Self::key(identity_id, remote_address);
        match self.counters.get(&key).await {
            Ok(value) => {
                let count = value.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
                self.classify(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failure counters unavailable, audit disabled");
                GateState::Normal
            }
        }
    }

    /// Records a failed attempt and returns the resulting state.
    pub async fn record_failure(&self, identity_id: Uuid, remote_address: &str) -> GateState {
        let key = Self::key(identity_id, remote_address);
        match self.counters.incr(&key, 1).await {
            Ok(count) => {
                if count == 1 {
                    // First failure in the window starts the expiry clock.
                    if let Err(e) = self.counters.expire(&key, self.config.window).await {
                        tracing::warn!(error = %e, "failed to set counter expiry");
                    }
                }
                self.classify(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failure counters unavailable, audit disabled");
                GateState::Normal
            }
        }
    }

    /// Records a successful attempt, resetting the pair's counter.
    pub async fn record_success(&self, identity_id: Uuid, remote_address: &str) {
        let key = Self::key(identity_id, remote_address);
        if let Err(e) = self.counters.delete(&key).await {
            tracing::warn!(error = %e, "failed to reset failure counter");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campus_cache::{CacheError, CacheProvider, CacheResult, MemoryCacheProvider};

    const REMOTE: &str = "203.0.113.7";

    fn gate() -> LoginGate {
        LoginGate::new(Arc::new(MemoryCacheProvider::new()))
    }

    #[tokio::test]
    async fn fresh_pair_is_normal() {
        let gate = gate();
        assert_eq!(gate.state(Uuid::now_v7(), REMOTE).await, GateState::Normal);
    }

    #[tokio::test]
    async fn warns_then_locks_at_thresholds() {
        let gate = gate();
        let identity = Uuid::now_v7();

        for _ in 0..4 {
            assert_eq!(
                gate.record_failure(identity, REMOTE).await,
                GateState::Normal
            );
        }
        assert_eq!(
            gate.record_failure(identity, REMOTE).await,
            GateState::Warning
        );

        for _ in 0..4 {
            gate.record_failure(identity, REMOTE).await;
        }
        assert_eq!(
            gate.record_failure(identity, REMOTE).await,
            GateState::Locked
        );
        assert!(gate.state(identity, REMOTE).await.is_locked());
    }

    #[tokio::test]
    async fn success_resets_the_counter() {
        let gate = gate();
        let identity = Uuid::now_v7();

        for _ in 0..9 {
            gate.record_failure(identity, REMOTE).await;
        }
        gate.record_success(identity, REMOTE).await;

        assert_eq!(gate.state(identity, REMOTE).await, GateState::Normal);
        assert_eq!(
            gate.record_failure(identity, REMOTE).await,
            GateState::Normal
        );
    }

    #[tokio::test]
    async fn counters_are_scoped_per_remote_address() {
        let gate = gate();
        let identity = Uuid::now_v7();

        for _ in 0..10 {
            gate.record_failure(identity, "198.51.100.1").await;
        }

        assert!(gate.state(identity, "198.51.100.1").await.is_locked());
        assert_eq!(gate.state(identity, REMOTE).await, GateState::Normal);
    }

    struct DownCache;

    #[async_trait]
    impl CacheProvider for DownCache {
        async fn get(&self, _: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Connection("down".to_string()))
        }
        async fn set(&self, _: &str, _: &str, _: Option<Duration>) -> CacheResult<()> {
            Err(CacheError::Connection("down".to_string()))
        }
        async fn delete(&self, _: &str) -> CacheResult<()> {
            Err(CacheError::Connection("down".to_string()))
        }
        async fn exists(&self, _: &str) -> CacheResult<bool> {
            Err(CacheError::Connection("down".to_string()))
        }
        async fn expire(&self, _: &str, _: Duration) -> CacheResult<()> {
            Err(CacheError::Connection("down".to_string()))
        }
    }

    #[async_trait]
    impl AtomicCacheProvider for DownCache {
        async fn incr(&self, _: &str, _: i64) -> CacheResult<i64> {
            Err(CacheError::Connection("down".to_string()))
        }
        async fn set_nx(&self, _: &str, _: &str, _: Option<Duration>) -> CacheResult<bool> {
            Err(CacheError::Connection("down".to_string()))
        }
    }

    #[tokio::test]
    async fn degrades_open_when_counters_are_down() {
        let gate = LoginGate::new(Arc::new(DownCache));
        let identity = Uuid::now_v7();

        assert_eq!(gate.state(identity, REMOTE).await, GateState::Normal);
        assert_eq!(
            gate.record_failure(identity, REMOTE).await,
            GateState::Normal
        );
        gate.record_success(identity, REMOTE).await;
    }
}

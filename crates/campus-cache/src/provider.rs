//! Cache provider traits.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Key-value cache provider with expiring keys.
///
/// Implementations must be thread-safe and support concurrent access.
/// Values are strings; callers serialize richer data themselves.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Gets a value.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Sets a value with an optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Deletes a key.
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Checks if a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Sets the TTL for an existing key. No-op if the key is missing.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()>;
}

/// Atomic counter operations.
///
/// Increments must be atomic at the backend (no read-modify-write),
/// so concurrent failure recording never under- or over-counts.
#[async_trait]
pub trait AtomicCacheProvider: CacheProvider {
    /// Atomically increments a counter, creating it at `delta` if absent.
    ///
    /// Returns the new value.
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// Sets a value only if the key doesn't exist.
    ///
    /// Returns `true` if the value was set.
    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<bool>;
}

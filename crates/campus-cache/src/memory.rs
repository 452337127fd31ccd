//! In-memory cache backend.
//!
//! Used by tests and single-node deployments. Expiry is evaluated
//! lazily on read; a key past its deadline behaves as absent.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{CacheError, CacheResult};
use crate::provider::{AtomicCacheProvider, CacheProvider};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// In-memory cache provider.
#[derive(Default)]
pub struct MemoryCacheProvider {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheProvider {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> CacheError {
        CacheError::Internal("cache lock poisoned".to_string())
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_poisoned())?;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_poisoned())?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_poisoned())?;
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_poisoned())?;
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

#[async_trait]
impl AtomicCacheProvider for MemoryCacheProvider {
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_poisoned())?;

        let current = match entries.get(key) {
            Some(entry) if !entry.is_expired() => entry
                .value
                .parse::<i64>()
                .map_err(|_| CacheError::Internal(format!("non-numeric counter at {key}")))?,
            _ => 0,
        };

        let next = current + delta;
        // Keep the window of a live counter; an expired entry restarts
        // without a deadline until the caller sets one.
        let expires_at = entries
            .get(key)
            .filter(|e| !e.is_expired())
            .and_then(|e| e.expires_at);
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );

        Ok(next)
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<bool> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_poisoned())?;

        let occupied = entries.get(key).is_some_and(|entry| !entry.is_expired());
        if occupied {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(true)
    }
}

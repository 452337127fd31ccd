//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use campus_cache::{AtomicCacheProvider, CacheError, CacheProvider, CacheResult};
use fred::prelude::*;

use crate::config::RedisConfig;
use crate::error::from_redis_error;

/// Redis-based cache provider.
pub struct RedisCacheProvider {
    client: Client,
    config: RedisConfig,
}

impl RedisCacheProvider {
    /// Creates a new Redis cache provider.
    ///
    /// ## Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn new(config: RedisConfig) -> CacheResult<Self> {
        let redis_config = Config::from_url(&config.connection_url())
            .map_err(|e| CacheError::Configuration(e.to_string()))?;

        let client = Client::new(
            redis_config,
            None,
            None,
            Some(ReconnectPolicy::new_exponential(0, 1000, 30_000, 2)),
        );

        client.init().await.map_err(from_redis_error)?;

        Ok(Self { client, config })
    }

    /// Returns the underlying Redis client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Formats a key with the configured prefix.
    fn key(&self, key: &str) -> String {
        self.config.prefixed_key(key)
    }
}

/// Safely convert seconds to i64 for Redis expiration.
#[allow(clippy::cast_possible_wrap)]
const fn seconds_to_i64(seconds: u64) -> i64 {
    seconds as i64
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let key = self.key(key);
        self.client.get(&key).await.map_err(from_redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let key = self.key(key);
        let expiration = ttl.map(|d| Expiration::EX(seconds_to_i64(d.as_secs().max(1))));

        self.client
            .set::<(), _, _>(&key, value, expiration, None, false)
            .await
            .map_err(from_redis_error)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let key = self.key(key);
        self.client
            .del::<(), _>(&key)
            .await
            .map_err(from_redis_error)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let key = self.key(key);
        let count: i64 = self.client.exists(&key).await.map_err(from_redis_error)?;
        Ok(count > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let key = self.key(key);
        let seconds = seconds_to_i64(ttl.as_secs().max(1));

        // A missing key is a no-op, matching the trait contract.
        let _set: bool = self
            .client
            .expire(&key, seconds, None)
            .await
            .map_err(from_redis_error)?;

        Ok(())
    }
}

#[async_trait]
impl AtomicCacheProvider for RedisCacheProvider {
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let key = self.key(key);
        self.client
            .incr_by(&key, delta)
            .await
            .map_err(from_redis_error)
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<bool> {
        let key = self.key(key);
        let expiration = ttl.map(|d| Expiration::EX(seconds_to_i64(d.as_secs().max(1))));

        let result: Option<String> = self
            .client
            .set(&key, value, expiration, Some(SetOptions::NX), false)
            .await
            .map_err(from_redis_error)?;

        Ok(result.is_some())
    }
}

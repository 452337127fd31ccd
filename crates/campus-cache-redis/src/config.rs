//! Redis connection configuration.

use serde::{Deserialize, Serialize};

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Redis server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Redis password (optional).
    pub password: Option<String>,
    /// Redis database number.
    #[serde(default)]
    pub database: u8,
    /// Use TLS for the connection.
    #[serde(default)]
    pub tls: bool,
    /// Key prefix for all cache keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            database: 0,
            tls: false,
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Redis host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the Redis port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the Redis password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the Redis database number.
    #[must_use]
    pub const fn database(mut self, database: u8) -> Self {
        self.database = database;
        self
    }

    /// Enables TLS.
    #[must_use]
    pub const fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Builds the Redis connection URL.
    #[must_use]
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let auth = self
            .password
            .as_ref()
            .map(|p| format!(":{p}@"))
            .unwrap_or_default();
        format!(
            "{scheme}://{auth}{host}:{port}/{db}",
            host = self.host,
            port = self.port,
            db = self.database
        )
    }

    /// Formats a key with the configured prefix.
    #[must_use]
    pub fn prefixed_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    6379
}

fn default_key_prefix() -> String {
    "campus".to_string()
}

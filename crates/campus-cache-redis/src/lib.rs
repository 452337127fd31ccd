//! # campus-cache-redis
//!
//! Redis backend for the campus counter/cache provider traits, built on
//! `fred`. The lockout gate's failure counters rely on this backend's
//! atomic `INCRBY` in production.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod provider;

pub use config::RedisConfig;
pub use provider::RedisCacheProvider;

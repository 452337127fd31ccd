//! Session-ticket invalidation records.
//!
//! A ticket ID can be marked invalid for a bounded TTL (one day by
//! default). Used when a session must be torn down before its natural
//! expiry, e.g. after a lockout.

use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheResult;
use crate::provider::CacheProvider;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Marks ticket IDs invalid in the cache store.
pub struct TicketInvalidation {
    cache: Arc<dyn CacheProvider>,
    ttl: Duration,
}

impl TicketInvalidation {
    /// Creates a ticket invalidation record with the default one-day TTL.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self {
            cache,
            ttl: DEFAULT_TTL,
        }
    }

    /// Overrides the invalidation TTL.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(ticket_id: &str) -> String {
        format!("ticket_invalid:{ticket_id}")
    }

    /// Marks a ticket invalid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache store is unavailable.
    pub async fn invalidate(&self, ticket_id: &str) -> CacheResult<()> {
        self.cache
            .set(&Self::key(ticket_id), "1", Some(self.ttl))
            .await
    }

    /// Checks whether a ticket has been marked invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache store is unavailable.
    pub async fn is_invalidated(&self, ticket_id: &str) -> CacheResult<bool> {
        self.cache.exists(&Self::key(ticket_id)).await
    }
}

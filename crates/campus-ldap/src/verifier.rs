//! LDAP bind verification.
//!
//! A bind either succeeds (optionally carrying directory attributes such
//! as an email address), fails as "no match", or fails for transport
//! reasons. Transport faults are reported to the caller as errors by the
//! individual binder, but the [`BindVerifier`] downgrades them to "no
//! match" after logging, so resolution falls through to other paths.

use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::DirectoryConfig;
use crate::error::{LdapError, LdapResult};

/// A successful bind.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    /// Provider whose directory accepted the credentials.
    pub provider_id: Uuid,
    /// Email address supplied by the directory, if mapped.
    pub email: Option<String>,
}

/// One directory that can attempt a bind.
///
/// Implementations must enforce their own per-bind timeout so one slow
/// directory server cannot stall checks against other candidates.
#[async_trait]
pub trait DirectoryBinder: Send + Sync {
    /// Returns the provider this directory belongs to.
    fn provider_id(&self) -> Uuid;

    /// Attempts a bind with the submitted credentials.
    ///
    /// Returns `Ok(None)` for invalid credentials, `Ok(Some(..))` on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns an error for transport faults (connection refused,
    /// timeout, protocol errors).
    async fn bind(&self, identifier: &str, secret: &str) -> LdapResult<Option<BindOutcome>>;
}

/// `ldap3`-backed directory binder.
pub struct LdapDirectoryBinder {
    config: DirectoryConfig,
}

impl LdapDirectoryBinder {
    /// Creates a binder for one configured directory.
    #[must_use]
    pub const fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    /// Returns the directory configuration.
    #[must_use]
    pub const fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    async fn bind_inner(&self, identifier: &str, secret: &str) -> LdapResult<Option<BindOutcome>> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.bind_timeout);

        let (conn, mut ldap) =
            LdapConnAsync::with_settings(settings, &self.config.connection_url)
                .await
                .map_err(|e| LdapError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {}", e);
            }
        });

        let user_dn = self.config.user_dn(identifier);
        let result = ldap
            .simple_bind(&user_dn, secret)
            .await
            .map_err(|e| LdapError::Bind(e.to_string()))?;

        if result.success().is_err() {
            // Invalid credentials are an ordinary "no match", not a fault.
            let _ = ldap.unbind().await;
            return Ok(None);
        }

        let email = self.fetch_email(&mut ldap, identifier).await;
        let _ = ldap.unbind().await;

        Ok(Some(BindOutcome {
            provider_id: self.config.provider_id,
            email,
        }))
    }

    /// Reads the mapped email attribute from the bound user's own entry.
    /// Best-effort: a failed search only loses the attribute.
    async fn fetch_email(&self, ldap: &mut ldap3::Ldap, identifier: &str) -> Option<String> {
        let email_attr = self.config.email_attribute.as_deref()?;

        let filter = format!(
            "({}={})",
            self.config.identifier_attribute,
            ldap3::ldap_escape(identifier)
        );

        let search = ldap
            .search(
                &self.config.users_dn,
                Scope::Subtree,
                &filter,
                vec![email_attr],
            )
            .await
            .ok()?;

        let (entries, _) = search.success().ok()?;
        let entry = SearchEntry::construct(entries.into_iter().next()?);
        entry
            .attrs
            .get(email_attr)
            .and_then(|values| values.first())
            .cloned()
    }
}

#[async_trait]
impl DirectoryBinder for LdapDirectoryBinder {
    fn provider_id(&self) -> Uuid {
        self.config.provider_id
    }

    async fn bind(&self, identifier: &str, secret: &str) -> LdapResult<Option<BindOutcome>> {
        match timeout(self.config.bind_timeout, self.bind_inner(identifier, secret)).await {
            Ok(result) => result,
            Err(_) => Err(LdapError::Timeout),
        }
    }
}

/// Tries candidate directories in configured order.
#[derive(Default)]
pub struct BindVerifier;

impl BindVerifier {
    /// Creates a verifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Attempts a bind against each candidate in order, returning the
    /// first success.
    ///
    /// Transport faults never surface to the caller: they are logged as
    /// diagnostics and the candidate is treated as "no match".
    pub async fn bind(
        &self,
        identifier: &str,
        secret: &str,
        candidates: &[Arc<dyn DirectoryBinder>],
    ) -> Option<BindOutcome> {
        for candidate in candidates {
            match candidate.bind(identifier, secret).await {
                Ok(Some(outcome)) => return Some(outcome),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        provider_id = %candidate.provider_id(),
                        error = %e,
                        "directory bind failed; treating as no match"
                    );
                }
            }
        }
        None
    }
}

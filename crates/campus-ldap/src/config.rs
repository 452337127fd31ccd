//! LDAP directory configuration.
//!
//! ## Security Requirements
//!
//! Only LDAPS (TLS from connection start) is supported. STARTTLS and
//! plain `ldap://` are rejected at build time.

use std::time::Duration;

use uuid::Uuid;

use crate::error::{LdapError, LdapResult};

/// Configuration for one LDAP directory tied to an authentication
/// provider.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Authentication provider this directory belongs to.
    pub provider_id: Uuid,
    /// LDAP server URL (MUST be `ldaps://`).
    pub connection_url: String,
    /// Base DN under which users live.
    pub users_dn: String,
    /// Attribute holding the login identifier (e.g., `uid`).
    pub identifier_attribute: String,
    /// Attribute holding the user's email address, if mapped.
    pub email_attribute: Option<String>,
    /// Per-bind timeout; a slow directory must not stall resolution.
    pub bind_timeout: Duration,
}

impl DirectoryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder(provider_id: Uuid) -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::new(provider_id)
    }

    /// Builds the DN used to bind as the submitted identifier.
    #[must_use]
    pub fn user_dn(&self, identifier: &str) -> String {
        format!(
            "{}={},{}",
            self.identifier_attribute,
            escape_dn_value(identifier),
            self.users_dn
        )
    }
}

/// Escapes special characters in a DN attribute value (RFC 4514).
fn escape_dn_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '#' if i == 0 => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' ' if i == 0 || i == value.len() - 1 => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builder for [`DirectoryConfig`].
pub struct DirectoryConfigBuilder {
    provider_id: Uuid,
    connection_url: Option<String>,
    users_dn: Option<String>,
    identifier_attribute: String,
    email_attribute: Option<String>,
    bind_timeout: Duration,
}

impl DirectoryConfigBuilder {
    fn new(provider_id: Uuid) -> Self {
        Self {
            provider_id,
            connection_url: None,
            users_dn: None,
            identifier_attribute: "uid".to_string(),
            email_attribute: None,
            bind_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the connection URL (must be `ldaps://`).
    #[must_use]
    pub fn connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = Some(url.into());
        self
    }

    /// Sets the users base DN.
    #[must_use]
    pub fn users_dn(mut self, dn: impl Into<String>) -> Self {
        self.users_dn = Some(dn.into());
        self
    }

    /// Sets the login identifier attribute.
    #[must_use]
    pub fn identifier_attribute(mut self, attr: impl Into<String>) -> Self {
        self.identifier_attribute = attr.into();
        self
    }

    /// Maps the directory attribute holding the user's email.
    #[must_use]
    pub fn email_attribute(mut self, attr: impl Into<String>) -> Self {
        self.email_attribute = Some(attr.into());
        self
    }

    /// Sets the per-bind timeout.
    #[must_use]
    pub const fn bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `LdapError::InsecureProtocol` for non-LDAPS URLs and
    /// `LdapError::Configuration` for missing fields.
    pub fn build(self) -> LdapResult<DirectoryConfig> {
        let connection_url = self
            .connection_url
            .ok_or_else(|| LdapError::Configuration("connection_url is required".to_string()))?;

        if !connection_url.starts_with("ldaps://") {
            return Err(LdapError::InsecureProtocol);
        }

        let users_dn = self
            .users_dn
            .ok_or_else(|| LdapError::Configuration("users_dn is required".to_string()))?;

        Ok(DirectoryConfig {
            provider_id: self.provider_id,
            connection_url,
            users_dn,
            identifier_attribute: self.identifier_attribute,
            email_attribute: self.email_attribute,
            bind_timeout: self.bind_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_plain_ldap() {
        let result = DirectoryConfig::builder(Uuid::now_v7())
            .connection_url("ldap://ldap.example.com:389")
            .users_dn("ou=users,dc=example,dc=com")
            .build();

        assert!(matches!(result, Err(LdapError::InsecureProtocol)));
    }

    #[test]
    fn accepts_ldaps() {
        let config = DirectoryConfig::builder(Uuid::now_v7())
            .connection_url("ldaps://ldap.example.com:636")
            .users_dn("ou=users,dc=example,dc=com")
            .build()
            .unwrap();

        assert_eq!(config.identifier_attribute, "uid");
        assert_eq!(config.bind_timeout, Duration::from_secs(5));
    }

    #[test]
    fn user_dn_escapes_special_characters() {
        let config = DirectoryConfig::builder(Uuid::now_v7())
            .connection_url("ldaps://ldap.example.com:636")
            .users_dn("ou=users,dc=example,dc=com")
            .build()
            .unwrap();

        assert_eq!(
            config.user_dn("jane,+admin"),
            "uid=jane\\,\\+admin,ou=users,dc=example,dc=com"
        );
    }
}

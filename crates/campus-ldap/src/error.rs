//! LDAP-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not leak passwords, bind credentials, or internal
//! directory structure.

use thiserror::Error;

/// LDAP-specific errors.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Invalid configuration.
    #[error("LDAP configuration error: {0}")]
    Configuration(String),

    /// Connection URL must use LDAPS.
    #[error("Security error: Only LDAPS is supported. URL must start with 'ldaps://'.")]
    InsecureProtocol,

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// Bind (authentication) failed for transport reasons.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// The bind did not complete within the per-bind timeout.
    #[error("LDAP bind timed out")]
    Timeout,

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

/// Result type for LDAP operations.
pub type LdapResult<T> = Result<T, LdapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert!(LdapError::Connection("refused".to_string()).is_connection_error());
        assert!(LdapError::Timeout.is_connection_error());
        assert!(!LdapError::InsecureProtocol.is_connection_error());
    }

    #[test]
    fn insecure_protocol_message() {
        assert!(LdapError::InsecureProtocol.to_string().contains("LDAPS"));
    }
}

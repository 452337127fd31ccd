//! Account domain model.
//!
//! Accounts own login identities. Only root-level accounts may own
//! identities; sub-accounts inherit authentication from their root.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default authentication mode for identities without an explicit
/// provider binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationMode {
    /// Verify against the locally stored password hash.
    #[default]
    Local,
    /// Delegate to the account's configured LDAP directories.
    Ldap,
}

/// An account (organizational tenant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: Uuid,
    /// Parent account, if this is a sub-account.
    ///
    /// Identities may only be owned by root accounts (`parent_id: None`).
    pub parent_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Whether login identifiers on this account must be email-formatted.
    pub require_email_identifier: bool,
    /// Default authentication mode for unbound identities.
    pub default_auth_mode: AuthenticationMode,
}

impl Account {
    /// Creates a new root account.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            parent_id: None,
            name: name.into(),
            require_email_identifier: false,
            default_auth_mode: AuthenticationMode::default(),
        }
    }

    /// Requires email-formatted identifiers on this account.
    #[must_use]
    pub const fn with_email_identifiers(mut self) -> Self {
        self.require_email_identifier = true;
        self
    }

    /// Sets the default authentication mode.
    #[must_use]
    pub const fn with_auth_mode(mut self, mode: AuthenticationMode) -> Self {
        self.default_auth_mode = mode;
        self
    }

    /// Checks if this account may own login identities.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_root() {
        let account = Account::new("Example University");
        assert!(account.is_root());
        assert!(!account.require_email_identifier);
        assert_eq!(account.default_auth_mode, AuthenticationMode::Local);
    }

    #[test]
    fn sub_account_is_not_root() {
        let root = Account::new("Root");
        let mut sub = Account::new("Department");
        sub.parent_id = Some(root.id);

        assert!(!sub.is_root());
    }

    #[test]
    fn builder_flags() {
        let account = Account::new("Strict U")
            .with_email_identifiers()
            .with_auth_mode(AuthenticationMode::Ldap);

        assert!(account.require_email_identifier);
        assert_eq!(account.default_auth_mode, AuthenticationMode::Ldap);
    }
}

//! External authentication provider model.
//!
//! Accounts configure an ordered list of providers. Identities may be
//! explicitly bound to one provider, or left unbound and verified against
//! the account's default mode.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of external authentication provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// LDAP directory bind.
    Ldap,
    /// Central authentication service (ticket-based single sign-on).
    Cas,
    /// SAML identity provider.
    Saml,
}

impl ProviderKind {
    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ldap => "ldap",
            Self::Cas => "cas",
            Self::Saml => "saml",
        }
    }
}

/// An external authentication provider configured on an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationProvider {
    /// Unique identifier.
    pub id: Uuid,
    /// Account this provider is configured on.
    pub account_id: Uuid,
    /// Provider kind.
    pub kind: ProviderKind,
    /// Position in the account's configured order (lower first).
    pub position: i32,
    /// Whether the provider is active.
    pub active: bool,
    /// Whether an unbound identity that verifies through this provider
    /// should be implicitly bound to it going forward.
    pub infer_binding: bool,
}

impl AuthenticationProvider {
    /// Creates a new active provider at the end of the order.
    #[must_use]
    pub fn new(account_id: Uuid, kind: ProviderKind, position: i32) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            kind,
            position,
            active: true,
            infer_binding: true,
        }
    }

    /// Checks if this provider delegates verification to LDAP.
    #[must_use]
    pub const fn is_ldap(&self) -> bool {
        matches!(self.kind, ProviderKind::Ldap)
    }
}

//! Credential resolution.
//!
//! One submitted `(identifier, secret)` pair is resolved against every
//! candidate identity visible from the caller's accounts. Each candidate
//! is verified independently (directory bind, then stored hashes) and
//! audited exactly once; a fault while verifying one candidate never
//! aborts the others. A single identity wins only when all successful
//! matches agree on one user, or when one of them lives on the
//! administrative account.

use std::collections::BTreeMap;
use std::sync::Arc;

use campus_crypto::{ProviderChain, Verification};
use campus_ldap::{BindOutcome, BindVerifier, DirectoryBinder};
use campus_model::{Identity, MAX_IDENTIFIER_LEN};
use campus_storage::IdentityStore;
use uuid::Uuid;

use crate::audit::Auditor;
use crate::directory::{AccountDirectory, Notifier, UserDirectory};
use crate::error::AuthResult;

/// Outcome of a resolution request.
#[derive(Debug)]
pub enum Resolution {
    /// Exactly one identity verified (or several for the same user, or an
    /// administrative-account match broke the tie).
    Resolved(Box<Identity>),
    /// No candidate verified.
    NoMatch,
    /// At least one candidate pair is locked out and nothing else
    /// resolved.
    TooManyAttempts,
    /// The submission could not possibly match any identity; storage was
    /// never consulted.
    ImpossibleCredentials,
}

impl Resolution {
    /// Checks if resolution produced an identity.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// How a candidate was verified.
enum MatchKind {
    /// A directory bind accepted the credentials.
    Directory(BindOutcome),
    /// A legacy hash matched a system-generated secret.
    Legacy,
    /// The current provider verified the primary hash.
    Primary,
}

struct CandidateMatch {
    identity: Identity,
    kind: MatchKind,
}

/// Resolves submitted credentials to a login identity.
pub struct CredentialResolver {
    store: Arc<dyn IdentityStore>,
    accounts: Arc<dyn AccountDirectory>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    chain: Arc<ProviderChain>,
    binds: BindVerifier,
    auditor: Auditor,
    admin_account_id: Option<Uuid>,
}

impl CredentialResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        accounts: Arc<dyn AccountDirectory>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        chain: Arc<ProviderChain>,
        auditor: Auditor,
    ) -> Self {
        Self {
            store,
            accounts,
            users,
            notifier,
            chain,
            binds: BindVerifier::new(),
            auditor,
            admin_account_id: None,
        }
    }

    /// Sets the administrative account whose matches win ambiguous
    /// resolutions.
    #[must_use]
    pub const fn with_admin_account(mut self, account_id: Uuid) -> Self {
        self.admin_account_id = Some(account_id);
        self
    }

    /// Resolves a submitted credential pair against the given accounts.
    ///
    /// # Errors
    ///
    /// Returns a storage error only when the initial candidate load
    /// fails; faults during individual candidate verification are logged
    /// and treated as non-matches for that candidate.
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
        account_ids: &[Uuid],
        remote_address: &str,
    ) -> AuthResult<Resolution> {
        let identifier = identifier.trim();
        // Length limit counts characters; multibyte identifiers at the
        // limit are legitimate.
        if identifier.is_empty()
            || secret.is_empty()
            || identifier.chars().count() > MAX_IDENTIFIER_LEN
        {
            return Ok(Resolution::ImpossibleCredentials);
        }

        let candidates = self.load_candidates(identifier, account_ids).await?;
        if candidates.is_empty() {
            return Ok(Resolution::NoMatch);
        }

        let mut too_many_attempts = false;
        let mut matches = Vec::new();

        for candidate in candidates {
            let gate_state = self
                .auditor
                .gate()
                .state(candidate.id, remote_address)
                .await;
            if gate_state.is_locked() {
                tracing::info!(
                    identity_id = %candidate.id,
                    remote_address,
                    "candidate suppressed by lockout"
                );
                self.auditor
                    .record_suppressed(candidate.id, remote_address)
                    .await;
                too_many_attempts = true;
                continue;
            }

            let verified = self.verify_candidate(&candidate, secret).await;
            self.auditor
                .record(candidate.id, remote_address, verified.is_some())
                .await;

            if let Some(kind) = verified {
                matches.push(CandidateMatch {
                    identity: candidate,
                    kind,
                });
            }
        }

        match self.select(matches) {
            Some(chosen) => {
                let identity = self.apply_side_effects(chosen, secret).await;
                Ok(Resolution::Resolved(Box::new(identity)))
            }
            None if too_many_attempts => Ok(Resolution::TooManyAttempts),
            None => Ok(Resolution::NoMatch),
        }
    }

    /// Loads active candidates, batching the lookup per storage shard.
    async fn load_candidates(
        &self,
        identifier: &str,
        account_ids: &[Uuid],
    ) -> AuthResult<Vec<Identity>> {
        let mut shards: BTreeMap<u32, Vec<Uuid>> = BTreeMap::new();
        for &account_id in account_ids {
            shards
                .entry(self.accounts.shard_of(account_id))
                .or_default()
                .push(account_id);
        }

        let mut candidates = Vec::new();
        for accounts in shards.values() {
            candidates.extend(
                self.store
                    .find_active_by_identifier(accounts, identifier)
                    .await?,
            );
        }
        Ok(candidates)
    }

    /// Verifies one candidate: directory bind first, then stored hashes.
    async fn verify_candidate(&self, identity: &Identity, secret: &str) -> Option<MatchKind> {
        let binders = self.binder_candidates(identity).await;
        if let Some(outcome) = self
            .binds
            .bind(&identity.identifier, secret, &binders)
            .await
        {
            return Some(MatchKind::Directory(outcome));
        }

        match self.chain.verify(
            secret,
            &identity.password_hash,
            identity.legacy_hash.as_deref(),
        ) {
            Verification::Current => Some(MatchKind::Primary),
            // Old-format hashes only vouch for secrets the system itself
            // generated; once a user picks a password the legacy path is
            // closed for good.
            Verification::Legacy if identity.password_auto_generated => Some(MatchKind::Legacy),
            Verification::Legacy | Verification::NoMatch => None,
        }
    }

    /// Directory candidates for one identity: its explicitly bound LDAP
    /// provider, every active LDAP provider on the account when unbound,
    /// or none when bound to a non-LDAP provider.
    async fn binder_candidates(&self, identity: &Identity) -> Vec<Arc<dyn DirectoryBinder>> {
        let binders = self.accounts.ldap_binders(identity.account_id).await;

        let Some(provider_id) = identity.auth_provider_id else {
            return binders;
        };

        match self.accounts.get_provider(provider_id).await {
            Ok(Some(provider)) if provider.is_ldap() && provider.active => binders
                .into_iter()
                .filter(|b| b.provider_id() == provider_id)
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    identity_id = %identity.id,
                    provider_id = %provider_id,
                    error = %e,
                    "provider lookup failed, skipping directory bind"
                );
                Vec::new()
            }
        }
    }

    /// Picks the winning match, if any.
    ///
    /// An administrative-account match always wins. Otherwise every match
    /// must agree on one user; an ambiguous identifier resolves to
    /// nothing rather than guessing.
    fn select(&self, mut matches: Vec<CandidateMatch>) -> Option<CandidateMatch> {
        if matches.is_empty() {
            return None;
        }

        if let Some(admin_id) = self.admin_account_id {
            if let Some(pos) = matches.iter().position(|m| m.identity.account_id == admin_id) {
                return Some(matches.swap_remove(pos));
            }
        }

        let first_user = matches[0].identity.user_id;
        if matches.iter().any(|m| m.identity.user_id != first_user) {
            tracing::info!(
                identifier = %matches[0].identity.identifier,
                match_count = matches.len(),
                "identifier matched multiple users, refusing to resolve"
            );
            return None;
        }

        Some(matches.swap_remove(0))
    }

    /// Post-resolution side effects for the winning identity. Every one
    /// is best-effort; the login already succeeded.
    async fn apply_side_effects(&self, chosen: CandidateMatch, secret: &str) -> Identity {
        let CandidateMatch { mut identity, kind } = chosen;

        match &kind {
            MatchKind::Directory(outcome) => {
                self.infer_binding(&mut identity, outcome).await;
                if let Some(email) = &outcome.email {
                    if let Err(e) = self.users.provision_channel(identity.user_id, email).await {
                        tracing::warn!(
                            identity_id = %identity.id,
                            error = %e,
                            "failed to provision channel"
                        );
                    }
                }
            }
            MatchKind::Legacy => self.rehash(&mut identity, secret).await,
            MatchKind::Primary => {
                if self.chain.needs_rehash(&identity.password_hash) {
                    self.rehash(&mut identity, secret).await;
                }
            }
        }

        if let Err(e) = self.store.record_login(identity.id).await {
            tracing::warn!(identity_id = %identity.id, error = %e, "failed to record login");
        } else {
            identity.record_login();
        }

        self.confirm_registration(identity.user_id).await;

        identity
    }

    /// Write-once implicit provider binding after a first directory
    /// match.
    async fn infer_binding(&self, identity: &mut Identity, outcome: &BindOutcome) {
        if identity.auth_provider_id.is_some() {
            return;
        }

        let infer = match self.accounts.get_provider(outcome.provider_id).await {
            Ok(Some(provider)) => provider.infer_binding,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(provider_id = %outcome.provider_id, error = %e, "provider lookup failed");
                false
            }
        };
        if !infer {
            return;
        }

        match self
            .store
            .bind_provider(identity.id, outcome.provider_id)
            .await
        {
            Ok(true) => {
                identity.auth_provider_id = Some(outcome.provider_id);
                tracing::info!(
                    identity_id = %identity.id,
                    provider_id = %outcome.provider_id,
                    "identity bound to provider"
                );
            }
            // A concurrent login already bound it; the stored value wins.
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(identity_id = %identity.id, error = %e, "failed to bind provider");
            }
        }
    }

    /// Lazily re-hashes the verified secret with the current provider.
    async fn rehash(&self, identity: &mut Identity, secret: &str) {
        let new_hash = match self.chain.hash(secret) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(identity_id = %identity.id, error = %e, "re-hash failed");
                return;
            }
        };

        match self
            .store
            .replace_password_hash(identity.id, &new_hash)
            .await
        {
            Ok(()) => {
                identity.password_hash = new_hash;
                tracing::debug!(identity_id = %identity.id, "password hash upgraded");
            }
            Err(e) => {
                tracing::warn!(identity_id = %identity.id, error = %e, "failed to store re-hash");
            }
        }
    }

    /// Fires the registration notification off the login path when this
    /// was the user's first successful login.
    async fn confirm_registration(&self, user_id: Uuid) {
        match self.users.mark_registered(user_id).await {
            Ok(true) => {
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    notifier.registration_confirmed(user_id).await;
                });
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "failed to mark user registered");
            }
        }
    }
}

//! End-to-end credential resolution scenarios over in-memory backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_auth::{
    AccountDirectory, Auditor, CredentialResolver, LoginGate, Notifier, Resolution, UserDirectory,
};
use campus_cache::MemoryCacheProvider;
use campus_crypto::{Argon2Provider, LegacySha512Provider, PasswordProvider, ProviderChain};
use campus_ldap::{BindOutcome, DirectoryBinder, LdapResult};
use campus_model::{Account, AuthenticationProvider, Identity, ProviderKind};
use campus_storage::{
    AttemptLog, IdentityStore, MemoryAttemptLog, MemoryIdentityStore, StorageResult,
};
use uuid::Uuid;

const REMOTE: &str = "203.0.113.7";

// === Fakes ===

struct StaticDirectory {
    accounts: Vec<Account>,
    providers: Vec<AuthenticationProvider>,
    binders: Vec<Arc<dyn DirectoryBinder>>,
}

#[async_trait]
impl AccountDirectory for StaticDirectory {
    async fn get_account(&self, id: Uuid) -> StorageResult<Option<Account>> {
        Ok(self.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn get_provider(&self, id: Uuid) -> StorageResult<Option<AuthenticationProvider>> {
        Ok(self.providers.iter().find(|p| p.id == id).cloned())
    }

    async fn ldap_binders(&self, account_id: Uuid) -> Vec<Arc<dyn DirectoryBinder>> {
        let mut providers: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.account_id == account_id && p.is_ldap() && p.active)
            .collect();
        providers.sort_by_key(|p| p.position);

        providers
            .into_iter()
            .filter_map(|p| {
                self.binders
                    .iter()
                    .find(|b| b.provider_id() == p.id)
                    .cloned()
            })
            .collect()
    }
}

#[derive(Default)]
struct RecordingUsers {
    channels: Mutex<Vec<(Uuid, String)>>,
    registered: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl UserDirectory for RecordingUsers {
    async fn provision_channel(&self, user_id: Uuid, email: &str) -> StorageResult<()> {
        self.channels
            .lock()
            .unwrap()
            .push((user_id, email.to_string()));
        Ok(())
    }

    async fn retire_channels(&self, _: Uuid, _: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn schedule_association_recompute(&self, _: Uuid) -> StorageResult<()> {
        Ok(())
    }

    async fn mark_registered(&self, user_id: Uuid) -> StorageResult<bool> {
        let mut registered = self.registered.lock().unwrap();
        if registered.contains(&user_id) {
            return Ok(false);
        }
        registered.push(user_id);
        Ok(true)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    confirmed: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn registration_confirmed(&self, user_id: Uuid) {
        self.confirmed.lock().unwrap().push(user_id);
    }
}

/// A directory that accepts exactly one secret.
struct SingleSecretDirectory {
    provider_id: Uuid,
    secret: String,
    email: Option<String>,
}

#[async_trait]
impl DirectoryBinder for SingleSecretDirectory {
    fn provider_id(&self) -> Uuid {
        self.provider_id
    }

    async fn bind(&self, _: &str, secret: &str) -> LdapResult<Option<BindOutcome>> {
        if secret == self.secret {
            Ok(Some(BindOutcome {
                provider_id: self.provider_id,
                email: self.email.clone(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Store wrapper counting identifier lookups.
struct CountingStore {
    inner: MemoryIdentityStore,
    lookups: AtomicUsize,
}

#[async_trait]
impl IdentityStore for CountingStore {
    async fn create(&self, identity: &Identity) -> StorageResult<()> {
        self.inner.create(identity).await
    }

    async fn update(&self, identity: &Identity) -> StorageResult<()> {
        self.inner.update(identity).await
    }

    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<Identity>> {
        self.inner.get_by_id(id).await
    }

    async fn find_active_by_identifier(
        &self,
        account_ids: &[Uuid],
        identifier: &str,
    ) -> StorageResult<Vec<Identity>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner
            .find_active_by_identifier(account_ids, identifier)
            .await
    }

    async fn identifier_taken(
        &self,
        account_id: Uuid,
        auth_provider_id: Option<Uuid>,
        identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        self.inner
            .identifier_taken(account_id, auth_provider_id, identifier, excluding)
            .await
    }

    async fn sis_identifier_taken(
        &self,
        account_id: Uuid,
        sis_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        self.inner
            .sis_identifier_taken(account_id, sis_identifier, excluding)
            .await
    }

    async fn integration_identifier_taken(
        &self,
        account_id: Uuid,
        integration_identifier: &str,
        excluding: Option<Uuid>,
    ) -> StorageResult<bool> {
        self.inner
            .integration_identifier_taken(account_id, integration_identifier, excluding)
            .await
    }

    async fn soft_delete(&self, id: Uuid) -> StorageResult<()> {
        self.inner.soft_delete(id).await
    }

    async fn bind_provider(&self, id: Uuid, provider_id: Uuid) -> StorageResult<bool> {
        self.inner.bind_provider(id, provider_id).await
    }

    async fn record_login(&self, id: Uuid) -> StorageResult<()> {
        self.inner.record_login(id).await
    }

    async fn replace_password_hash(&self, id: Uuid, password_hash: &str) -> StorageResult<()> {
        self.inner.replace_password_hash(id, password_hash).await
    }
}

// === Fixture ===

struct Fixture {
    store: Arc<CountingStore>,
    log: Arc<MemoryAttemptLog>,
    users: Arc<RecordingUsers>,
    notifier: Arc<RecordingNotifier>,
    accounts: Vec<Account>,
    providers: Vec<AuthenticationProvider>,
    binders: Vec<Arc<dyn DirectoryBinder>>,
    admin_account_id: Option<Uuid>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: Arc::new(CountingStore {
                inner: MemoryIdentityStore::new(),
                lookups: AtomicUsize::new(0),
            }),
            log: Arc::new(MemoryAttemptLog::new()),
            users: Arc::new(RecordingUsers::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            accounts: Vec::new(),
            providers: Vec::new(),
            binders: Vec::new(),
            admin_account_id: None,
        }
    }

    fn resolver(&self) -> CredentialResolver {
        let chain = Arc::new(ProviderChain::new(
            Box::new(Argon2Provider::with_defaults()),
            vec![Box::new(LegacySha512Provider::new())],
        ));
        let gate = LoginGate::new(Arc::new(MemoryCacheProvider::new()));
        let auditor = Auditor::new(Arc::clone(&self.log) as Arc<dyn AttemptLog>, gate);

        let resolver = CredentialResolver::new(
            Arc::clone(&self.store) as Arc<dyn IdentityStore>,
            Arc::new(StaticDirectory {
                accounts: self.accounts.clone(),
                providers: self.providers.clone(),
                binders: self.binders.clone(),
            }),
            Arc::clone(&self.users) as Arc<dyn UserDirectory>,
            Arc::clone(&self.notifier) as Arc<dyn Notifier>,
            chain,
            auditor,
        );

        match self.admin_account_id {
            Some(id) => resolver.with_admin_account(id),
            None => resolver,
        }
    }
}

fn hash(secret: &str) -> String {
    Argon2Provider::with_defaults().hash(secret).unwrap()
}

fn legacy_hash(secret: &str) -> String {
    LegacySha512Provider::new().hash(secret).unwrap()
}

async fn seed(fixture: &Fixture, identity: &Identity) {
    fixture.store.create(identity).await.unwrap();
}

fn account_ids(fixture: &Fixture) -> Vec<Uuid> {
    fixture.accounts.iter().map(|a| a.id).collect()
}

// === Scenarios ===

#[tokio::test]
async fn resolves_single_match_across_accounts() {
    let mut fixture = Fixture::new();
    let first = Account::new("First U");
    let second = Account::new("Second U");
    fixture.accounts = vec![first.clone(), second.clone()];

    let identity = Identity::new(second.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    seed(&fixture, &identity).await;

    let resolution = fixture
        .resolver()
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    let Resolution::Resolved(resolved) = resolution else {
        panic!("expected resolution");
    };
    assert_eq!(resolved.id, identity.id);
    assert_eq!(resolved.login_count, 1);

    // Bookkeeping landed in the store, and the attempt was audited once.
    let stored = fixture.store.get_by_id(identity.id).await.unwrap().unwrap();
    assert_eq!(stored.login_count, 1);
    assert!(stored.last_request_at.is_some());

    let attempts = fixture.log.list_for_identity(identity.id, 10).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].succeeded);
}

#[tokio::test]
async fn identifier_lookup_is_case_insensitive() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    let identity = Identity::new(account.id, Uuid::now_v7(), "JDoe", &hash("hunter2"));
    seed(&fixture, &identity).await;

    let resolution = fixture
        .resolver()
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    assert!(resolution.is_resolved());
}

#[tokio::test]
async fn ambiguous_identifier_resolves_to_nothing() {
    let mut fixture = Fixture::new();
    let first = Account::new("First U");
    let second = Account::new("Second U");
    fixture.accounts = vec![first.clone(), second.clone()];

    let one = Identity::new(first.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    let two = Identity::new(second.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    seed(&fixture, &one).await;
    seed(&fixture, &two).await;

    let resolution = fixture
        .resolver()
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::NoMatch));

    // Both candidates were still audited.
    assert_eq!(fixture.log.list_for_identity(one.id, 10).await.unwrap().len(), 1);
    assert_eq!(fixture.log.list_for_identity(two.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_user_in_both_accounts_resolves() {
    let mut fixture = Fixture::new();
    let first = Account::new("First U");
    let second = Account::new("Second U");
    fixture.accounts = vec![first.clone(), second.clone()];

    let user_id = Uuid::now_v7();
    seed(
        &fixture,
        &Identity::new(first.id, user_id, "jdoe", &hash("hunter2")),
    )
    .await;
    seed(
        &fixture,
        &Identity::new(second.id, user_id, "jdoe", &hash("hunter2")),
    )
    .await;

    let resolution = fixture
        .resolver()
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    let Resolution::Resolved(resolved) = resolution else {
        panic!("expected resolution");
    };
    assert_eq!(resolved.user_id, user_id);
}

#[tokio::test]
async fn administrative_account_match_wins_ambiguity() {
    let mut fixture = Fixture::new();
    let admin = Account::new("Site Admin");
    let other = Account::new("Example U");
    fixture.accounts = vec![admin.clone(), other.clone()];
    fixture.admin_account_id = Some(admin.id);

    let admin_identity = Identity::new(admin.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    let other_identity = Identity::new(other.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    seed(&fixture, &other_identity).await;
    seed(&fixture, &admin_identity).await;

    let resolution = fixture
        .resolver()
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    let Resolution::Resolved(resolved) = resolution else {
        panic!("expected resolution");
    };
    assert_eq!(resolved.account_id, admin.id);
}

#[tokio::test]
async fn lockout_blocks_even_the_correct_secret() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    let identity = Identity::new(account.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    seed(&fixture, &identity).await;

    let resolver = fixture.resolver();
    for _ in 0..10 {
        let resolution = resolver
            .authenticate("jdoe", "wrong", &account_ids(&fixture), REMOTE)
            .await
            .unwrap();
        assert!(matches!(resolution, Resolution::NoMatch));
    }

    let resolution = resolver
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();
    assert!(matches!(resolution, Resolution::TooManyAttempts));

    // The suppressed attempt still landed in the log, as a failure.
    let attempts = fixture.log.list_for_identity(identity.id, 20).await.unwrap();
    assert_eq!(attempts.len(), 11);
    assert!(attempts.iter().all(|a| !a.succeeded));
}

#[tokio::test]
async fn lockout_is_scoped_to_the_remote_address() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    let identity = Identity::new(account.id, Uuid::now_v7(), "jdoe", &hash("hunter2"));
    seed(&fixture, &identity).await;

    let resolver = fixture.resolver();
    for _ in 0..10 {
        resolver
            .authenticate("jdoe", "wrong", &account_ids(&fixture), "198.51.100.1")
            .await
            .unwrap();
    }

    let resolution = resolver
        .authenticate("jdoe", "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();
    assert!(resolution.is_resolved());
}

#[tokio::test]
async fn impossible_credentials_never_touch_storage() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];
    let resolver = fixture.resolver();
    let ids = account_ids(&fixture);

    let oversized = "x".repeat(101);
    assert!(matches!(
        resolver
            .authenticate(&oversized, "secret", &ids, REMOTE)
            .await
            .unwrap(),
        Resolution::ImpossibleCredentials
    ));
    assert!(matches!(
        resolver.authenticate("", "secret", &ids, REMOTE).await.unwrap(),
        Resolution::ImpossibleCredentials
    ));
    assert!(matches!(
        resolver.authenticate("jdoe", "", &ids, REMOTE).await.unwrap(),
        Resolution::ImpossibleCredentials
    ));

    assert_eq!(fixture.store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn multibyte_identifier_at_the_length_limit_resolves() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    // 100 characters but 200 bytes; the limit counts characters.
    let identifier = "é".repeat(100);
    let identity = Identity::new(account.id, Uuid::now_v7(), &identifier, &hash("hunter2"));
    seed(&fixture, &identity).await;

    let resolution = fixture
        .resolver()
        .authenticate(&identifier, "hunter2", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    assert!(resolution.is_resolved());
}

#[tokio::test]
async fn legacy_hash_verifies_and_upgrades() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    // SIS-provisioned identity: system-generated PIN behind an old-format
    // hash, primary hash set to something unrelated.
    let identity = Identity::new(account.id, Uuid::now_v7(), "s1234", &hash("placeholder"))
        .with_legacy_hash(legacy_hash("000111"));
    seed(&fixture, &identity).await;

    let resolution = fixture
        .resolver()
        .authenticate("s1234", "000111", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();
    assert!(resolution.is_resolved());

    // The primary hash was lazily upgraded to the current provider.
    let stored = fixture.store.get_by_id(identity.id).await.unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));
    assert!(Argon2Provider::with_defaults().verify("000111", &stored.password_hash));
}

#[tokio::test]
async fn legacy_hash_is_ignored_after_an_explicit_password() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    let mut identity = Identity::new(account.id, Uuid::now_v7(), "s1234", &hash("placeholder"))
        .with_legacy_hash(legacy_hash("000111"));
    identity.set_password_hash(hash("chosen password"));
    seed(&fixture, &identity).await;

    let resolver = fixture.resolver();
    let ids = account_ids(&fixture);

    let resolution = resolver
        .authenticate("s1234", "000111", &ids, REMOTE)
        .await
        .unwrap();
    assert!(matches!(resolution, Resolution::NoMatch));

    let resolution = resolver
        .authenticate("s1234", "chosen password", &ids, REMOTE)
        .await
        .unwrap();
    assert!(resolution.is_resolved());
}

#[tokio::test]
async fn directory_bind_resolves_and_infers_binding() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    let provider = AuthenticationProvider::new(account.id, ProviderKind::Ldap, 0);
    fixture.accounts = vec![account.clone()];
    fixture.providers = vec![provider.clone()];
    fixture.binders = vec![Arc::new(SingleSecretDirectory {
        provider_id: provider.id,
        secret: "directory secret".to_string(),
        email: Some("jdoe@example.edu".to_string()),
    })];

    let identity = Identity::new(account.id, Uuid::now_v7(), "jdoe", &hash("unrelated"));
    seed(&fixture, &identity).await;

    let resolution = fixture
        .resolver()
        .authenticate("jdoe", "directory secret", &account_ids(&fixture), REMOTE)
        .await
        .unwrap();

    let Resolution::Resolved(resolved) = resolution else {
        panic!("expected resolution");
    };
    assert_eq!(resolved.auth_provider_id, Some(provider.id));

    // The binding is durable and the directory email became a channel.
    let stored = fixture.store.get_by_id(identity.id).await.unwrap().unwrap();
    assert_eq!(stored.auth_provider_id, Some(provider.id));
    let channels = fixture.users.channels.lock().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].1, "jdoe@example.edu");
}

#[tokio::test]
async fn identity_bound_to_non_ldap_provider_skips_the_directory() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    let ldap = AuthenticationProvider::new(account.id, ProviderKind::Ldap, 0);
    let cas = AuthenticationProvider::new(account.id, ProviderKind::Cas, 1);
    fixture.accounts = vec![account.clone()];
    fixture.providers = vec![ldap.clone(), cas.clone()];
    fixture.binders = vec![Arc::new(SingleSecretDirectory {
        provider_id: ldap.id,
        secret: "directory secret".to_string(),
        email: None,
    })];

    let identity = Identity::new(account.id, Uuid::now_v7(), "jdoe", &hash("hunter2"))
        .with_provider(cas.id);
    seed(&fixture, &identity).await;

    let resolver = fixture.resolver();
    let ids = account_ids(&fixture);

    // The directory would accept this secret, but the explicit non-LDAP
    // binding excludes it; only the stored hash counts.
    let resolution = resolver
        .authenticate("jdoe", "directory secret", &ids, REMOTE)
        .await
        .unwrap();
    assert!(matches!(resolution, Resolution::NoMatch));

    let resolution = resolver
        .authenticate("jdoe", "hunter2", &ids, REMOTE)
        .await
        .unwrap();
    assert!(resolution.is_resolved());
}

#[tokio::test]
async fn first_login_confirms_registration_once() {
    let mut fixture = Fixture::new();
    let account = Account::new("Example U");
    fixture.accounts = vec![account.clone()];

    let user_id = Uuid::now_v7();
    let identity = Identity::new(account.id, user_id, "jdoe", &hash("hunter2"));
    seed(&fixture, &identity).await;

    let resolver = fixture.resolver();
    let ids = account_ids(&fixture);

    resolver
        .authenticate("jdoe", "hunter2", &ids, REMOTE)
        .await
        .unwrap();
    resolver
        .authenticate("jdoe", "hunter2", &ids, REMOTE)
        .await
        .unwrap();

    // The notification is fired off the login path; give it a moment.
    let mut confirmed = Vec::new();
    for _ in 0..50 {
        confirmed = fixture.notifier.confirmed.lock().unwrap().clone();
        if !confirmed.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(confirmed, vec![user_id]);
}

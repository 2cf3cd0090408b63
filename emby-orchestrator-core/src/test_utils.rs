#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! In-memory fakes for service-layer tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use emby_orchestrator_backend::{
    BackendDescriptor, BackendError, CreatedAccount, FavoriteItem, MediaBackend, RemoteUser,
};

use crate::error::{CoreError, CoreResult};
use crate::registry::BackendRegistry;
use crate::services::ServiceContext;
use crate::traits::{
    AlertSink, BindingRepository, CodeClaim, CodeLedger, FavoritesRepository, ProfileRepository,
};
use crate::types::{
    Binding, CodeKind, EntitlementUpdate, NewAccount, Profile, RedeemCode, UserLevel,
};

/// Minimal valid descriptor for a mock backend.
pub fn descriptor(id: &str) -> BackendDescriptor {
    BackendDescriptor {
        id: id.to_string(),
        name: format!("{id} test server"),
        base_url: format!("http://{id}.invalid"),
        api_key: "test-key".to_string(),
        public_line: format!("http://{id}.invalid"),
        vip_line: None,
        enabled: true,
    }
}

#[derive(Default)]
struct MockState {
    users: Vec<RemoteUser>,
    favorites: HashMap<String, Vec<FavoriteItem>>,
    policy_calls: Vec<(String, bool)>,
    next_account: u32,
    closed: bool,
    fail_create: bool,
    fail_delete: bool,
    fail_policy: bool,
    fail_list: bool,
    fail_favorites: bool,
    fail_close: bool,
    delay: Option<Duration>,
}

/// A scriptable in-memory media backend.
pub struct MockBackend {
    id: String,
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn shared(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            state: Mutex::new(MockState::default()),
        })
    }

    fn network_error(&self) -> BackendError {
        BackendError::NetworkError {
            backend: self.id.clone(),
            detail: "scripted failure".to_string(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }

    pub fn seed_user(&self, id: &str, name: &str) {
        self.lock().users.push(RemoteUser {
            id: id.to_string(),
            name: name.to_string(),
            disabled: false,
        });
    }

    pub fn seed_favorite(&self, account_id: &str, item_id: &str, item_name: &str) {
        self.lock()
            .favorites
            .entry(account_id.to_string())
            .or_default()
            .push(FavoriteItem {
                item_id: item_id.to_string(),
                item_name: item_name.to_string(),
            });
    }

    pub fn fail_create(&self) {
        self.lock().fail_create = true;
    }

    pub fn fail_delete(&self) {
        self.lock().fail_delete = true;
    }

    pub fn fail_policy(&self) {
        self.lock().fail_policy = true;
    }

    pub fn fail_list(&self) {
        self.lock().fail_list = true;
    }

    pub fn fail_favorites(&self) {
        self.lock().fail_favorites = true;
    }

    pub fn fail_close(&self) {
        self.lock().fail_close = true;
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_create = false;
        state.fail_delete = false;
        state.fail_policy = false;
        state.fail_list = false;
        state.fail_favorites = false;
        state.fail_close = false;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub fn policy_calls(&self) -> Vec<(String, bool)> {
        self.lock().policy_calls.clone()
    }

    pub fn was_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_user(
        &self,
        name: &str,
        days: i64,
    ) -> Result<CreatedAccount, BackendError> {
        let mut state = self.lock();
        if state.fail_create {
            return Err(self.network_error());
        }
        state.next_account += 1;
        let account_id = format!("{}-acc-{}", self.id, state.next_account);
        state.users.push(RemoteUser {
            id: account_id.clone(),
            name: name.to_string(),
            disabled: false,
        });
        Ok(CreatedAccount {
            account_id,
            password: format!("pw-{}", state.next_account),
            expires_at: Utc::now() + ChronoDuration::days(days),
        })
    }

    async fn delete_user(&self, account_id: &str) -> Result<(), BackendError> {
        self.pause().await;
        let mut state = self.lock();
        if state.fail_delete {
            return Err(self.network_error());
        }
        let before = state.users.len();
        state.users.retain(|u| u.id != account_id);
        if state.users.len() == before {
            return Err(BackendError::UserNotFound {
                backend: self.id.clone(),
                account_id: account_id.to_string(),
            });
        }
        Ok(())
    }

    async fn set_policy(&self, account_id: &str, disable: bool) -> Result<(), BackendError> {
        let mut state = self.lock();
        if state.fail_policy {
            return Err(self.network_error());
        }
        state.policy_calls.push((account_id.to_string(), disable));
        if let Some(user) = state.users.iter_mut().find(|u| u.id == account_id) {
            user.disabled = disable;
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<RemoteUser>, BackendError> {
        self.pause().await;
        let state = self.lock();
        if state.fail_list {
            return Err(self.network_error());
        }
        Ok(state.users.clone())
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<RemoteUser>, BackendError> {
        let state = self.lock();
        Ok(state.users.iter().find(|u| u.name == name).cloned())
    }

    async fn list_favorites(
        &self,
        account_id: &str,
    ) -> Result<Vec<FavoriteItem>, BackendError> {
        let state = self.lock();
        if state.fail_favorites {
            return Err(self.network_error());
        }
        Ok(state.favorites.get(account_id).cloned().unwrap_or_default())
    }

    async fn playing_count(&self) -> Result<u64, BackendError> {
        Ok(0)
    }

    async fn close(&self) -> Result<(), BackendError> {
        let mut state = self.lock();
        if state.fail_close {
            return Err(self.network_error());
        }
        state.closed = true;
        Ok(())
    }
}

/// `BindingRepository` over a mutex-guarded vector.
#[derive(Default)]
pub struct MemoryBindingRepository {
    rows: Mutex<Vec<Binding>>,
}

#[async_trait]
impl BindingRepository for MemoryBindingRepository {
    async fn add(&self, binding: &Binding) -> CoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|b| b.user_id == binding.user_id && b.backend_id == binding.backend_id)
        {
            return Err(CoreError::BindingExists {
                user_id: binding.user_id,
                backend_id: binding.backend_id.clone(),
            });
        }
        rows.push(binding.clone());
        Ok(())
    }

    async fn get(&self, user_id: i64, backend_id: &str) -> CoreResult<Option<Binding>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.user_id == user_id && b.backend_id == backend_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: i64, enabled_only: bool) -> CoreResult<Vec<Binding>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id && (!enabled_only || b.enabled))
            .cloned()
            .collect())
    }

    async fn primary(&self, user_id: i64) -> CoreResult<Option<Binding>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.user_id == user_id && b.is_primary)
            .cloned())
    }

    async fn set_primary(&self, user_id: i64, backend_id: &str) -> CoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if !rows
            .iter()
            .any(|b| b.user_id == user_id && b.backend_id == backend_id)
        {
            return Err(CoreError::BindingNotFound {
                user_id,
                backend_id: Some(backend_id.to_string()),
            });
        }
        for b in rows.iter_mut().filter(|b| b.user_id == user_id) {
            b.is_primary = b.backend_id == backend_id;
        }
        Ok(())
    }

    async fn delete(&self, user_id: i64, backend_id: &str) -> CoreResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| !(b.user_id == user_id && b.backend_id == backend_id));
        Ok(rows.len() < before)
    }

    async fn delete_all_for_user(&self, user_id: i64) -> CoreResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| b.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }

    async fn count_users(&self, backend_id: &str) -> CoreResult<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.backend_id == backend_id && b.enabled)
            .count() as u64)
    }
}

/// `ProfileRepository` over a mutex-guarded map.
#[derive(Default)]
pub struct MemoryProfileRepository {
    rows: Mutex<HashMap<i64, Profile>>,
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn find(&self, user_id: i64) -> CoreResult<Option<Profile>> {
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, profile: &Profile) -> CoreResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn attach_account(
        &self,
        user_id: i64,
        account: &NewAccount,
        consume_credit: bool,
    ) -> CoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let profile = rows
            .get_mut(&user_id)
            .ok_or(CoreError::ProfileNotFound(user_id))?;
        profile.account_id = Some(account.account_id.clone());
        profile.account_name = Some(account.account_name.clone());
        profile.password = Some(account.password.clone());
        profile.level = UserLevel::Standard;
        profile.expires_at = Some(account.expires_at);
        profile.created_at = Some(Utc::now());
        if consume_credit {
            profile.credit_days = 0;
        }
        Ok(())
    }

    async fn clear_account(&self, user_id: i64) -> CoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let profile = rows
            .get_mut(&user_id)
            .ok_or(CoreError::ProfileNotFound(user_id))?;
        profile.account_id = None;
        profile.account_name = None;
        profile.password = None;
        profile.level = UserLevel::Unregistered;
        profile.expires_at = None;
        Ok(())
    }

    async fn list_with_accounts(&self) -> CoreResult<Vec<Profile>> {
        let mut out: Vec<Profile> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.has_account())
            .cloned()
            .collect();
        out.sort_by_key(|p| p.user_id);
        Ok(out)
    }
}

/// `CodeLedger` over a mutex-guarded map, with claim semantics that mirror
/// the durable store: `begin` marks the code consumed, `abort` (or a commit
/// failure) restores it.
pub struct MemoryCodeLedger {
    codes: Arc<Mutex<HashMap<String, RedeemCode>>>,
    profiles: Arc<MemoryProfileRepository>,
}

impl MemoryCodeLedger {
    pub fn new(profiles: Arc<MemoryProfileRepository>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(HashMap::new())),
            profiles,
        }
    }
}

struct MemoryClaim {
    codes: Arc<Mutex<HashMap<String, RedeemCode>>>,
    profiles: Arc<MemoryProfileRepository>,
    code: RedeemCode,
}

impl MemoryClaim {
    fn restore(&self) {
        if let Some(row) = self.codes.lock().unwrap().get_mut(&self.code.code) {
            row.consumed_by = None;
            row.consumed_at = None;
        }
    }
}

#[async_trait]
impl CodeClaim for MemoryClaim {
    fn code(&self) -> &RedeemCode {
        &self.code
    }

    async fn commit(self: Box<Self>, update: EntitlementUpdate) -> CoreResult<()> {
        match update {
            EntitlementUpdate::Renewal {
                user_id,
                new_expiry,
                reinstate,
            } => {
                let mut rows = self.profiles.rows.lock().unwrap();
                let Some(profile) = rows.get_mut(&user_id) else {
                    drop(rows);
                    self.restore();
                    return Err(CoreError::ProfileNotFound(user_id));
                };
                profile.expires_at = Some(new_expiry);
                if reinstate && profile.level == UserLevel::Suspended {
                    profile.level = UserLevel::Standard;
                }
            }
            EntitlementUpdate::RegistrationCredit { user_id, days } => {
                let mut rows = self.profiles.rows.lock().unwrap();
                let Some(profile) = rows.get_mut(&user_id) else {
                    drop(rows);
                    self.restore();
                    return Err(CoreError::ProfileNotFound(user_id));
                };
                // Credit invariant re-checked under the claim.
                if profile.credit_days > 0 {
                    drop(rows);
                    self.restore();
                    return Err(CoreError::AlreadyHasCredit(user_id));
                }
                profile.credit_days += days;
            }
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) -> CoreResult<()> {
        self.restore();
        Ok(())
    }
}

#[async_trait]
impl CodeLedger for MemoryCodeLedger {
    async fn insert(&self, code: &RedeemCode) -> CoreResult<()> {
        self.codes
            .lock()
            .unwrap()
            .insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn find(&self, code: &str) -> CoreResult<Option<RedeemCode>> {
        Ok(self.codes.lock().unwrap().get(code).cloned())
    }

    async fn begin(&self, code: &str, redeemer: i64) -> CoreResult<Box<dyn CodeClaim>> {
        let mut codes = self.codes.lock().unwrap();
        let row = codes
            .get_mut(code)
            .ok_or_else(|| CoreError::CodeNotFound(code.to_string()))?;
        if row.consumed_by.is_some() {
            return Err(CoreError::CodeAlreadyUsed {
                code: code.to_string(),
                used_by: row.consumed_by,
            });
        }
        row.consumed_by = Some(redeemer);
        row.consumed_at = Some(Utc::now());
        let snapshot = row.clone();
        drop(codes);
        Ok(Box::new(MemoryClaim {
            codes: self.codes.clone(),
            profiles: self.profiles.clone(),
            code: snapshot,
        }))
    }
}

/// `FavoritesRepository` over a mutex-guarded map keyed by (account, backend).
#[derive(Default)]
pub struct MemoryFavoritesRepository {
    rows: Mutex<HashMap<(String, String), Vec<FavoriteItem>>>,
}

#[async_trait]
impl FavoritesRepository for MemoryFavoritesRepository {
    async fn replace(
        &self,
        remote_account_id: &str,
        backend_id: &str,
        items: &[FavoriteItem],
    ) -> CoreResult<()> {
        self.rows.lock().unwrap().insert(
            (remote_account_id.to_string(), backend_id.to_string()),
            items.to_vec(),
        );
        Ok(())
    }

    async fn list(
        &self,
        remote_account_id: &str,
        backend_id: &str,
    ) -> CoreResult<Vec<FavoriteItem>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(remote_account_id.to_string(), backend_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Alert sink that records delivered messages for assertions.
#[derive(Default)]
pub struct RecordingAlertSink {
    sent: Mutex<Vec<String>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn send(&self, message: &str) -> CoreResult<()> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// A fully wired service context over mock backends and memory stores.
pub struct TestEnv {
    pub ctx: Arc<ServiceContext>,
    pub registry: Arc<BackendRegistry>,
    pub bindings: Arc<MemoryBindingRepository>,
    pub profiles: Arc<MemoryProfileRepository>,
    pub codes: Arc<MemoryCodeLedger>,
    pub favorites: Arc<MemoryFavoritesRepository>,
    mocks: HashMap<String, Arc<MockBackend>>,
}

impl TestEnv {
    /// The mock behind a registered backend id.
    ///
    /// # Panics
    /// If no mock was registered under `id`.
    pub fn backend(&self, id: &str) -> Arc<MockBackend> {
        self.mocks[id].clone()
    }
}

/// Build a test environment with one mock backend per id.
pub async fn test_env(ids: &[&str]) -> TestEnv {
    let registry = Arc::new(BackendRegistry::new());
    let mut mocks = HashMap::new();
    for id in ids {
        let mock = MockBackend::shared(id);
        assert!(registry.register_handle(descriptor(id), mock.clone()).await);
        mocks.insert((*id).to_string(), mock);
    }

    let bindings = Arc::new(MemoryBindingRepository::default());
    let profiles = Arc::new(MemoryProfileRepository::default());
    let codes = Arc::new(MemoryCodeLedger::new(profiles.clone()));
    let favorites = Arc::new(MemoryFavoritesRepository::default());

    let ctx = Arc::new(ServiceContext::new(
        registry.clone(),
        bindings.clone(),
        profiles.clone(),
        codes.clone(),
        favorites.clone(),
    ));

    TestEnv {
        ctx,
        registry,
        bindings,
        profiles,
        codes,
        favorites,
        mocks,
    }
}

/// Insert an unconsumed code issued by user 100.
pub async fn seed_code(env: &TestEnv, code: &str, kind: CodeKind, days: i64) {
    env.codes
        .insert(&RedeemCode {
            code: code.to_string(),
            issuer: 100,
            duration_days: days,
            kind,
            consumed_by: None,
            consumed_at: None,
        })
        .await
        .unwrap();
}

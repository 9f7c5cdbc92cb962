//! Scripted in-process gateway for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use jinkops_client::{BackendGateway, Reporting};
use jinkops_core::{ApiError, ApiResult, Permission, Role, User};

type Scripted = (Duration, ApiResult<User>);

#[derive(Default)]
pub(crate) struct FakeGateway {
    accounts: Mutex<HashMap<(String, String), String>>,
    tokens: Mutex<HashMap<String, String>>,
    details: Mutex<HashMap<String, ApiResult<User>>>,
    scripted_details: Mutex<VecDeque<Scripted>>,
    detail_delay: Mutex<Duration>,
    pub login_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub last_reporting: Mutex<Option<Reporting>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// `alice`/`pw` → `T1`, editor with `posts:write`.
    pub fn alice() -> Self {
        let gw = Self::new();
        gw.add_account("alice", "pw", "T1");
        gw.set_detail("alice", Ok(editor("alice")));
        gw
    }

    pub fn add_account(&self, username: &str, password: &str, token: &str) {
        lock(&self.accounts).insert((username.into(), password.into()), token.into());
        lock(&self.tokens).insert(token.into(), username.into());
    }

    pub fn revoke(&self, token: &str) {
        lock(&self.tokens).remove(token);
    }

    pub fn set_detail(&self, username: &str, detail: ApiResult<User>) {
        lock(&self.details).insert(username.into(), detail);
    }

    pub fn set_detail_delay(&self, delay: Duration) {
        *lock(&self.detail_delay) = delay;
    }

    /// One-shot responses consumed in order before falling back to `details`.
    pub fn script_detail(&self, delay: Duration, detail: ApiResult<User>) {
        lock(&self.scripted_details).push_back((delay, detail));
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.login_calls.load(Ordering::SeqCst),
            self.verify_calls.load(Ordering::SeqCst),
            self.detail_calls.load(Ordering::SeqCst),
        )
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

#[async_trait::async_trait]
impl BackendGateway for FakeGateway {
    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.accounts)
            .get(&(username.to_string(), password.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("bad username or password"))
    }

    async fn verify_token(&self, token: &str) -> ApiResult<String> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.tokens)
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("token invalid or expired"))
    }

    async fn fetch_user_detail(&self, username: &str, reporting: Reporting) -> ApiResult<User> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_reporting) = Some(reporting);

        let scripted = lock(&self.scripted_details).pop_front();
        let (delay, result) = match scripted {
            Some(s) => s,
            None => {
                let delay = *lock(&self.detail_delay);
                let result = lock(&self.details)
                    .get(username)
                    .cloned()
                    .unwrap_or_else(|| Err(ApiError::not_found("user not found")));
                (delay, result)
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

pub(crate) fn editor(username: &str) -> User {
    User::new(username)
        .with_role(Role::new("editor").with_permission(Permission::new("posts:write")))
}

pub(crate) fn admin(username: &str) -> User {
    User::new(username).with_role(Role::new("admin"))
}

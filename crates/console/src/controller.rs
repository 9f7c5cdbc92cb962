//! Session controller: the only writer of the shared [`Session`].
//!
//! `login`, `bootstrap` and `logout` keep the in-memory session and the
//! durable [`SessionStore`] in step. Readers (guard, gate, transport) hold
//! clones of the same `Session` handle.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use jinkops_auth::{Decision, Requirement, Session, SessionState};
use jinkops_client::{BackendGateway, Reporting, SessionStore, StoreError};
use jinkops_core::{ApiError, ApiResult, User};
use tokio::sync::OnceCell;

/// How overlapping `bootstrap` calls interact.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BootstrapMode {
    /// Callers arriving while a bootstrap is in flight share its outcome.
    #[default]
    Coalesce,
    /// Every call runs to completion; the last one to finish wins.
    LastWriteWins,
}

/// A running coalesced bootstrap and what it was started for.
struct InFlight {
    token: String,
    force_verify: bool,
    cell: Arc<OnceCell<ApiResult<()>>>,
}

impl InFlight {
    /// A forced run also serves unforced callers; never the reverse.
    fn serves(&self, token: &str, force_verify: bool) -> bool {
        self.token == token && (self.force_verify || !force_verify)
    }
}

pub struct SessionController {
    session: Session,
    gateway: Arc<dyn BackendGateway>,
    store: Arc<dyn SessionStore>,
    bootstrap_timeout: Option<Duration>,
    mode: BootstrapMode,
    in_flight: Mutex<Option<InFlight>>,
}

impl core::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionController")
            .field("username", &self.session.username())
            .field("bootstrap_timeout", &self.bootstrap_timeout)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn new(
        session: Session,
        gateway: Arc<dyn BackendGateway>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            session,
            gateway,
            store,
            bootstrap_timeout: None,
            mode: BootstrapMode::default(),
            in_flight: Mutex::new(None),
        }
    }

    /// Bound every bootstrap; an elapsed bound fails with `Timeout`.
    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = Some(timeout);
        self
    }

    pub fn with_mode(mut self, mode: BootstrapMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn token(&self) -> String {
        self.session.token()
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// Any-of check against the live session; admins pass everything and an
    /// empty requirement always passes.
    pub fn has_permission(&self, required: impl Into<Requirement>) -> bool {
        let required = required.into();
        let decision = self.session.explain(required.clone());
        tracing::debug!(required = %required, %decision, "permission check");
        decision.is_allowed()
    }

    pub fn explain(&self, required: impl Into<Requirement>) -> Decision {
        self.session.explain(required)
    }

    /// Replace any current session with a fresh one for `username`.
    ///
    /// Errors from the gateway or from the follow-up bootstrap propagate
    /// unchanged.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        self.logout();

        let token = self.gateway.login(username, password).await?;
        self.session.update(|s| s.set_token(token.clone()));
        self.persist("token", |store| store.save_token(&token));
        tracing::info!(username, "login accepted");

        self.bootstrap(true).await
    }

    /// Re-derive username, detail and permissions from the backend for the
    /// current token. A no-op without a token.
    pub async fn bootstrap(&self, force_verify: bool) -> ApiResult<()> {
        match self.mode {
            BootstrapMode::LastWriteWins => {
                self.bootstrap_bounded(self.session.token(), force_verify).await
            }
            BootstrapMode::Coalesce => {
                let token = self.session.token();
                if token.is_empty() {
                    return Ok(());
                }
                let cell = {
                    let mut slot = self.in_flight_slot();
                    match slot.as_ref() {
                        Some(running) if running.serves(&token, force_verify) => {
                            running.cell.clone()
                        }
                        _ => {
                            let cell = Arc::new(OnceCell::new());
                            *slot = Some(InFlight {
                                token: token.clone(),
                                force_verify,
                                cell: cell.clone(),
                            });
                            cell
                        }
                    }
                };
                let outcome = cell
                    .get_or_init(|| self.bootstrap_bounded(token.clone(), force_verify))
                    .await
                    .clone();

                let mut slot = self.in_flight_slot();
                if slot
                    .as_ref()
                    .is_some_and(|running| Arc::ptr_eq(&running.cell, &cell))
                {
                    *slot = None;
                }
                outcome
            }
        }
    }

    /// Clear memory and durable storage. Idempotent and infallible.
    pub fn logout(&self) {
        let was_logged_in = self.session.update(|s| {
            let was = s.is_logged_in();
            s.clear();
            was
        });
        self.persist("clear", |store| store.clear());
        self.in_flight_slot().take();
        if was_logged_in {
            tracing::info!("logged out");
        }
    }

    fn in_flight_slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn bootstrap_bounded(&self, token: String, force_verify: bool) -> ApiResult<()> {
        let Some(limit) = self.bootstrap_timeout else {
            return self.reconcile(token, force_verify).await;
        };
        match tokio::time::timeout(limit, self.reconcile(token, force_verify)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "bootstrap timed out");
                Err(ApiError::timeout(format!(
                    "session bootstrap did not finish within {} ms",
                    limit.as_millis()
                )))
            }
        }
    }

    /// One bootstrap pass for `token`. Every write is dropped once the
    /// session moves on to another token.
    async fn reconcile(&self, token: String, force_verify: bool) -> ApiResult<()> {
        if token.is_empty() {
            return Ok(());
        }
        let Some(known_username) = self
            .session
            .read(|s| (s.token() == token).then(|| s.username().to_string()))
        else {
            return Ok(());
        };

        let username = if known_username.is_empty() || force_verify {
            let verified = self.gateway.verify_token(&token).await?;
            if !self.apply_if_current(&token, |s| s.set_username(verified.clone())) {
                return Ok(());
            }
            self.persist("username", |store| store.save_username(&verified));
            verified
        } else {
            known_username
        };

        match self.gateway.fetch_user_detail(&username, Reporting::Silent).await {
            Ok(user) => {
                if self.apply_if_current(&token, |s| s.apply_user_detail(user)) {
                    let permissions = self.session.permissions();
                    tracing::info!(
                        %username,
                        permissions = permissions.len(),
                        admin = self.session.is_admin(),
                        "session bootstrapped"
                    );
                }
                Ok(())
            }
            Err(err) if err.is_forbidden() => {
                tracing::warn!(%username, "user detail forbidden; continuing without permissions");
                self.apply_if_current(&token, |s| s.apply_detail_forbidden());
                Ok(())
            }
            Err(err) => {
                self.apply_if_current(&token, |s| s.clear_detail());
                Err(err)
            }
        }
    }

    /// Apply `f` only while the session still holds `token`; results of a
    /// bootstrap that outlived a logout are discarded.
    fn apply_if_current(&self, token: &str, f: impl FnOnce(&mut SessionState)) -> bool {
        let applied = self.session.update(|s| {
            if s.token() == token {
                f(s);
                true
            } else {
                false
            }
        });
        if !applied {
            tracing::debug!("session changed during bootstrap; dropping stale result");
        }
        applied
    }

    fn persist(&self, what: &str, op: impl FnOnce(&dyn SessionStore) -> Result<(), StoreError>) {
        if let Err(err) = op(self.store.as_ref()) {
            tracing::error!(error = %err, what, "failed to update persisted session");
        }
    }
}

//! Session state: who is logged in and what they may do.
//!
//! `SessionState` is pure data with mutation rules; `Session` is the one shared
//! handle created at startup and passed to every consumer (controller, guard,
//! gate, transport).

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jinkops_core::User;

use crate::authorize::{self, Decision, Requirement};
use crate::PermissionSet;

/// Current authentication state.
///
/// Invariants:
/// - an empty `token` means logged out;
/// - `permissions` is always `derive_permissions(user)` (or empty without a
///   user); there is no way to set it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    token: String,
    username: String,
    user: Option<User>,
    permissions: PermissionSet,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State restored from durable storage at startup: credentials only, no
    /// detail and no permissions until the next bootstrap.
    pub fn seeded(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn is_admin(&self) -> bool {
        authorize::is_admin(self.user(), self.permissions())
    }

    pub fn has_permission(&self, required: &Requirement) -> bool {
        authorize::has_permission(self, required)
    }

    pub fn explain(&self, required: &Requirement) -> Decision {
        authorize::explain(self, required)
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    /// Replace the user detail and recompute permissions from it.
    pub fn apply_user_detail(&mut self, user: User) {
        self.permissions = authorize::derive_permissions(&user);
        self.user = Some(user);
    }

    /// Degraded but valid session: the backend refused to disclose the detail,
    /// so the user is known by name only and holds nothing.
    pub fn apply_detail_forbidden(&mut self) {
        self.user = Some(User::stub(self.username.clone()));
        self.permissions = PermissionSet::new();
    }

    /// Drop the user detail (and therefore the permissions), keeping credentials.
    pub fn clear_detail(&mut self) {
        self.user = None;
        self.permissions = PermissionSet::new();
    }

    /// Reset every field to its logged-out default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Shared handle to the process-wide session.
///
/// Cloning is cheap; all clones observe the same state. Reads are
/// synchronous so render-time code (the permission gate) can query it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    // A panic while holding the lock cannot leave `SessionState` half-written:
    // every mutation above assigns whole fields.
    fn read_guard(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.read_guard())
    }

    /// Mutate the session. Reserved for the session controller and the
    /// transport's forced logout.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.write_guard())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read_guard().clone()
    }

    pub fn token(&self) -> String {
        self.read(|s| s.token().to_string())
    }

    pub fn username(&self) -> String {
        self.read(|s| s.username().to_string())
    }

    pub fn user(&self) -> Option<User> {
        self.read(|s| s.user().cloned())
    }

    pub fn permissions(&self) -> PermissionSet {
        self.read(|s| s.permissions().clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.read(SessionState::is_logged_in)
    }

    pub fn is_admin(&self) -> bool {
        self.read(SessionState::is_admin)
    }

    pub fn has_permission(&self, required: impl Into<Requirement>) -> bool {
        let required = required.into();
        self.read(|s| s.has_permission(&required))
    }

    pub fn explain(&self, required: impl Into<Requirement>) -> Decision {
        let required = required.into();
        self.read(|s| s.explain(&required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jinkops_core::{Permission, Role};

    #[test]
    fn seeded_state_is_logged_in_without_permissions() {
        let state = SessionState::seeded("T1", "alice");
        assert!(state.is_logged_in());
        assert!(state.user().is_none());
        assert!(state.permissions().is_empty());
    }

    #[test]
    fn user_detail_drives_permissions() {
        let mut state = SessionState::seeded("T1", "alice");
        state.apply_user_detail(
            User::new("alice").with_role(Role::new("Editor").with_permission(Permission::new("posts:write"))),
        );
        assert_eq!(state.permissions().to_strings(), vec!["POSTS:WRITE", "ROLE_EDITOR"]);

        state.clear_detail();
        assert!(state.user().is_none());
        assert!(state.permissions().is_empty());
        assert_eq!(state.token(), "T1");
    }

    #[test]
    fn forbidden_detail_yields_stub() {
        let mut state = SessionState::seeded("T1", "alice");
        state.apply_user_detail(User::new("alice").with_role(Role::new("admin")));
        state.apply_detail_forbidden();

        let user = state.user().unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.roles.is_empty());
        assert!(state.permissions().is_empty());
        assert!(!state.is_admin());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut state = SessionState::seeded("T1", "alice");
        state.apply_user_detail(User::new("alice").with_role(Role::new("x")));
        state.clear();
        let once = state.clone();
        state.clear();
        assert_eq!(state, once);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn clones_of_the_handle_share_state() {
        let session = Session::default();
        let other = session.clone();
        session.update(|s| s.set_token("T9"));
        assert_eq!(other.token(), "T9");
        assert!(other.is_logged_in());
    }

    #[test]
    fn logged_out_session_denies_codes() {
        let session = Session::default();
        assert!(!session.has_permission("ANY"));
        assert!(session.has_permission(Vec::<&str>::new()));
    }
}

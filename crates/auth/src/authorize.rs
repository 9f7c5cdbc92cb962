use jinkops_core::User;
use thiserror::Error;

use crate::roles::{ROLE_ADMIN, is_admin_role, role_permission};
use crate::{PermissionCode, PermissionSet, SessionState};

/// What a guarded element or route asks of the session.
///
/// A list is satisfied by *any* of its codes ("any of these roles suffices").
/// An empty list, an absent value or a single blank code is unrestricted. A
/// blank entry inside a non-empty list is kept and never matches, so `[""]`
/// is denied like any other unheld code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Requirement {
    #[default]
    Unrestricted,
    AnyOf(Vec<PermissionCode>),
}

impl Requirement {
    pub fn any_of<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: Vec<PermissionCode> = codes
            .into_iter()
            .map(|c| PermissionCode::new(c.as_ref().trim()))
            .collect();
        if codes.is_empty() {
            Self::Unrestricted
        } else {
            Self::AnyOf(codes)
        }
    }

    pub fn one(code: impl AsRef<str>) -> Self {
        let code = code.as_ref().trim();
        if code.is_empty() {
            Self::Unrestricted
        } else {
            Self::AnyOf(vec![PermissionCode::new(code)])
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    pub fn codes(&self) -> &[PermissionCode] {
        match self {
            Self::Unrestricted => &[],
            Self::AnyOf(codes) => codes,
        }
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unrestricted => f.write_str("<none>"),
            Self::AnyOf(codes) => {
                let joined: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
                f.write_str(&joined.join(" | "))
            }
        }
    }
}

impl From<&str> for Requirement {
    fn from(value: &str) -> Self {
        Self::one(value)
    }
}

impl From<String> for Requirement {
    fn from(value: String) -> Self {
        Self::one(value)
    }
}

impl From<&[&str]> for Requirement {
    fn from(value: &[&str]) -> Self {
        Self::any_of(value.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Requirement {
    fn from(value: [&str; N]) -> Self {
        Self::any_of(value)
    }
}

impl From<Vec<&str>> for Requirement {
    fn from(value: Vec<&str>) -> Self {
        Self::any_of(value)
    }
}

impl From<Vec<String>> for Requirement {
    fn from(value: Vec<String>) -> Self {
        Self::any_of(value)
    }
}

impl<T: Into<Requirement>> From<Option<T>> for Requirement {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Outcome of a permission check, with the reason it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The session holds an admin role; every check passes.
    Admin,
    /// Nothing was required.
    Unrestricted,
    /// The session holds this code.
    Granted(PermissionCode),
    /// The session holds no permissions at all.
    NoPermissions,
    /// None of the requested codes is held.
    Missing(Vec<PermissionCode>),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Admin | Self::Unrestricted | Self::Granted(_))
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Admin => f.write_str("allowed: admin role"),
            Self::Unrestricted => f.write_str("allowed: no permission required"),
            Self::Granted(code) => write!(f, "allowed: holds '{code}'"),
            Self::NoPermissions => f.write_str("denied: session has no permissions"),
            Self::Missing(codes) => {
                let joined: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
                write!(f, "denied: none of [{}] held", joined.join(", "))
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("forbidden: requires {0}")]
    Forbidden(Requirement),
}

/// Effective permission set of a user: `ROLE_<CODE>` for every role plus every
/// permission code attached to those roles, all upper-cased.
pub fn derive_permissions(user: &User) -> PermissionSet {
    let mut perms = PermissionSet::new();
    for role in &user.roles {
        perms.insert(role_permission(&role.code));
        perms.extend(role.permissions.iter().map(|p| PermissionCode::new(&p.code)));
    }
    perms
}

/// Admin privilege: some role code contains `ADMIN`, or `ROLE_ADMIN` is held.
pub fn is_admin(user: Option<&User>, permissions: &PermissionSet) -> bool {
    let by_role = user.is_some_and(|u| u.role_codes().any(is_admin_role));
    by_role || permissions.contains_str(ROLE_ADMIN)
}

/// Evaluate a requirement against a session and say why.
pub fn explain(state: &SessionState, required: &Requirement) -> Decision {
    if is_admin(state.user(), state.permissions()) {
        return Decision::Admin;
    }
    let codes = match required {
        Requirement::Unrestricted => return Decision::Unrestricted,
        Requirement::AnyOf(codes) => codes,
    };
    if state.permissions().is_empty() {
        return Decision::NoPermissions;
    }
    match codes
        .iter()
        .find(|c| !c.is_empty() && state.permissions().contains(c))
    {
        Some(code) => Decision::Granted(code.clone()),
        None => Decision::Missing(codes.clone()),
    }
}

/// The single definition of "authorized", shared by the navigation guard and
/// the permission gate.
pub fn has_permission(state: &SessionState, required: &Requirement) -> bool {
    explain(state, required).is_allowed()
}

/// Like [`has_permission`] but reports why access is refused. Also refuses
/// when there is no session at all.
pub fn authorize(state: &SessionState, required: &Requirement) -> Result<Decision, AuthzError> {
    if !state.is_logged_in() {
        return Err(AuthzError::NotLoggedIn);
    }
    let decision = explain(state, required);
    if decision.is_allowed() {
        Ok(decision)
    } else {
        Err(AuthzError::Forbidden(required.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jinkops_core::{Permission, Role};
    use proptest::prelude::*;

    fn session_with(user: User) -> SessionState {
        let mut state = SessionState::seeded("T1", &user.username);
        state.apply_user_detail(user);
        state
    }

    fn editor() -> User {
        User::new("alice").with_role(Role::new("editor").with_permission(Permission::new("posts:write")))
    }

    #[test]
    fn editor_scenario_permissions() {
        let perms = derive_permissions(&editor());
        assert_eq!(perms.to_strings(), vec!["POSTS:WRITE", "ROLE_EDITOR"]);
    }

    #[test]
    fn single_code_is_case_insensitive() {
        let state = session_with(editor());
        assert!(has_permission(&state, &"posts:WRITE".into()));
        assert!(has_permission(&state, &"role_editor".into()));
        assert!(!has_permission(&state, &"posts:delete".into()));
    }

    #[test]
    fn list_is_any_of() {
        let state = session_with(editor());
        assert!(has_permission(&state, &["posts:delete", "posts:write"].into()));
        assert!(!has_permission(&state, &["posts:delete", "users:list"].into()));
    }

    #[test]
    fn empty_permissions_deny_any_code() {
        let state = SessionState::seeded("T1", "bob");
        assert_eq!(explain(&state, &"x".into()), Decision::NoPermissions);
    }

    #[test]
    fn role_admin_code_grants_admin() {
        let mut perms = PermissionSet::new();
        perms.insert(PermissionCode::new("role_admin"));
        assert!(is_admin(None, &perms));
    }

    #[test]
    fn blank_single_code_is_unrestricted_but_blank_list_entries_never_match() {
        assert_eq!(Requirement::from(""), Requirement::Unrestricted);
        assert_eq!(Requirement::from(None::<&str>), Requirement::Unrestricted);
        assert_eq!(Requirement::from(Vec::<&str>::new()), Requirement::Unrestricted);
        assert_eq!(Requirement::from(vec!["", "  "]).codes().len(), 2);
        assert_eq!(Requirement::from(vec!["", "a"]).codes().len(), 2);

        let state = session_with(editor());
        assert!(!has_permission(&state, &[""].into()));
        assert!(!has_permission(&state, &vec!["", "  "].into()));
        assert!(has_permission(&state, &vec!["", "posts:write"].into()));

        let mut blank_held = SessionState::seeded("T1", "eve");
        blank_held.apply_user_detail(
            User::new("eve").with_role(Role::new("odd").with_permission(Permission::new(""))),
        );
        assert!(!has_permission(&blank_held, &[""].into()));
    }

    #[test]
    fn authorize_reports_missing_session_and_missing_code() {
        let state = SessionState::new();
        assert_eq!(authorize(&state, &"a".into()), Err(AuthzError::NotLoggedIn));

        let state = session_with(editor());
        let err = authorize(&state, &"users:list".into()).unwrap_err();
        assert_eq!(err.to_string(), "forbidden: requires USERS:LIST");
        assert_eq!(
            authorize(&state, &"posts:write".into()),
            Ok(Decision::Granted(PermissionCode::new("POSTS:WRITE")))
        );
    }

    fn code_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z]{1,6}(:[a-zA-Z]{1,6}){0,2}"
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        (code_strategy(), prop::collection::vec(code_strategy(), 0..4)).prop_map(|(code, perms)| {
            perms
                .into_iter()
                .fold(Role::new(code), |role, p| role.with_permission(Permission::new(p)))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: an empty or absent requirement is always satisfied.
        #[test]
        fn empty_requirement_always_allowed(
            roles in prop::collection::vec(role_strategy(), 0..4),
            logged_in in any::<bool>(),
        ) {
            let state = if logged_in {
                session_with(roles.into_iter().fold(User::new("u"), User::with_role))
            } else {
                SessionState::new()
            };
            prop_assert!(has_permission(&state, &Requirement::from(Vec::<String>::new())));
            prop_assert!(has_permission(&state, &Requirement::from(None::<&str>)));
        }

        /// Property: any role containing "admin" in any case satisfies everything.
        #[test]
        fn admin_role_overrides_everything(
            prefix in "[a-z]{0,3}",
            casing in prop::sample::select(vec!["admin", "ADMIN", "Admin", "aDmIn"]),
            required in prop::collection::vec(code_strategy(), 0..4),
        ) {
            let user = User::new("root").with_role(Role::new(format!("{prefix}{casing}")));
            let state = session_with(user);
            prop_assert!(has_permission(&state, &Requirement::from(required)));
        }

        /// Property: the derived set is exactly the upper-cased union of role
        /// pseudo-codes and attached permission codes, regardless of casing.
        #[test]
        fn derived_set_is_upper_cased_union(roles in prop::collection::vec(role_strategy(), 0..5)) {
            let user = roles.iter().cloned().fold(User::new("u"), User::with_role);
            let derived = derive_permissions(&user);

            let mut expected = std::collections::BTreeSet::new();
            for role in &roles {
                expected.insert(format!("ROLE_{}", role.code.to_uppercase()));
                for p in &role.permissions {
                    expected.insert(p.code.to_uppercase());
                }
            }
            prop_assert_eq!(derived.to_strings(), expected.into_iter().collect::<Vec<_>>());
        }
    }
}

//! Console views as declarative element trees.
//!
//! Action requirements mirror the backend's permission codes, so an element
//! survives the gate exactly when the backend would accept the call behind it.

use jinkops_auth::SessionState;

use crate::gate::ViewNode;
use crate::routes::Route;

pub mod codes {
    pub const USER_LIST: &str = "SYS:USER:LIST";
    pub const USER_UPDATE: &str = "SYS:USER:UPDATE";
    pub const ROLE_LIST: &str = "SYS:ROLE:LIST";
    pub const ROLE_CREATE: &str = "SYS:ROLE:CREATE";
    pub const ROLE_UPDATE: &str = "SYS:ROLE:UPDATE";
    pub const ROLE_DELETE: &str = "SYS:ROLE:DELETE";
    pub const PERM_LIST: &str = "SYS:PERM:LIST";
    pub const PERM_CREATE: &str = "SYS:PERM:CREATE";
    pub const PERM_DELETE: &str = "SYS:PERM:DELETE";
    pub const RBAC_ASSIGN: &str = "SYS:RBAC:ASSIGN";
}

/// Element tree for a route, or `None` for routes without a view (redirects).
pub fn for_route(route: &Route, state: &SessionState) -> Option<ViewNode> {
    match route.name? {
        "login" => Some(login()),
        "overview" => Some(overview(state)),
        "users" => Some(users()),
        "roles" => Some(roles()),
        "permissions" => Some(permissions()),
        "logs" => Some(logs()),
        _ => None,
    }
}

pub fn login() -> ViewNode {
    ViewNode::section("Sign in")
        .child(ViewNode::text("Use `jinkops login --username <name>` to sign in."))
}

/// What the signed-in user can do, one entry per capability.
pub fn overview(state: &SessionState) -> ViewNode {
    let who = if state.username().is_empty() {
        "Signed in".to_string()
    } else {
        format!("Signed in as {}", state.username())
    };
    let roles = state
        .user()
        .map(|u| u.role_codes().collect::<Vec<_>>().join(", "))
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "none".to_string());

    ViewNode::section("Overview")
        .child(ViewNode::text(who))
        .child(ViewNode::text(format!("Roles: {roles}")))
        .child(ViewNode::section("Capabilities").children([
            ViewNode::action("Browse users", codes::USER_LIST),
            ViewNode::action("Edit users", codes::USER_UPDATE),
            ViewNode::action("Manage roles", [codes::ROLE_LIST, codes::ROLE_CREATE, codes::ROLE_UPDATE, codes::ROLE_DELETE]),
            ViewNode::action("Manage permissions", [codes::PERM_LIST, codes::PERM_CREATE, codes::PERM_DELETE]),
            ViewNode::action("Assign roles and permissions", codes::RBAC_ASSIGN),
            ViewNode::text("Read operation logs"),
        ]))
}

pub fn users() -> ViewNode {
    ViewNode::section("Users").children([
        ViewNode::action("List users", codes::USER_LIST),
        ViewNode::action("Page through users", codes::USER_LIST),
        ViewNode::action("Create user", codes::USER_UPDATE),
        ViewNode::action("Edit user", codes::USER_UPDATE),
        ViewNode::action("Delete user", codes::USER_UPDATE),
        ViewNode::action("Assign roles", codes::RBAC_ASSIGN),
    ])
}

pub fn roles() -> ViewNode {
    ViewNode::section("Roles").children([
        ViewNode::action("List roles", codes::ROLE_LIST),
        ViewNode::action("Create role", codes::ROLE_CREATE),
        ViewNode::action("Edit role", codes::ROLE_UPDATE),
        ViewNode::action("Delete role", codes::ROLE_DELETE),
        ViewNode::action("Assign permissions", codes::RBAC_ASSIGN),
    ])
}

pub fn permissions() -> ViewNode {
    ViewNode::section("Permissions").children([
        ViewNode::action("List permissions", codes::PERM_LIST),
        ViewNode::action("Create permission", codes::PERM_CREATE),
        ViewNode::action("Delete permission", codes::PERM_DELETE),
    ])
}

pub fn logs() -> ViewNode {
    ViewNode::section("Operation logs").children([
        ViewNode::text("List recent operations"),
        ViewNode::text("Search by keyword"),
        ViewNode::text("Advanced search by time range"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::PermissionGate;
    use crate::routes::RouteTable;
    use jinkops_auth::Session;
    use jinkops_core::{Permission, Role, User};

    fn mounted(view: ViewNode, user: User) -> String {
        let mut state = SessionState::seeded("T", user.username.clone());
        state.apply_user_detail(user);
        PermissionGate::new(Session::new(state)).mount(view).render()
    }

    #[test]
    fn every_named_route_has_a_view() {
        let table = RouteTable::console();
        let state = SessionState::new();
        for route in table.routes().iter().filter(|r| r.name.is_some()) {
            assert!(for_route(route, &state).is_some(), "{}", route.path);
        }
        assert!(for_route(table.resolve("/").unwrap(), &state).is_none());
    }

    #[test]
    fn users_view_for_a_reader() {
        let reader = User::new("rita").with_role(
            Role::new("reader").with_permission(Permission::new("sys:user:list")),
        );
        assert_eq!(
            mounted(users(), reader),
            "Users\n  [List users]\n  [Page through users]\n"
        );
    }

    #[test]
    fn overview_lists_only_granted_capabilities() {
        let user = User::new("alice").with_role(
            Role::new("editor").with_permission(Permission::new("SYS:ROLE:LIST")),
        );
        let rendered = mounted(overview(&SessionState::seeded("T", "alice")), user.clone());
        assert!(rendered.contains("Signed in as alice"));
        assert!(rendered.contains("[Manage roles]"));
        assert!(!rendered.contains("[Browse users]"));
        assert!(rendered.contains("Read operation logs"));

        let mut state = SessionState::seeded("T", "alice");
        state.apply_user_detail(user);
        assert!(overview(&state).find("Roles: editor").is_some());
    }
}

//! Console route table.

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/overview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub title: &'static str,
    pub requires_auth: bool,
    pub requires_admin: bool,
    /// Static redirect, followed by the router before any guard runs.
    pub redirect: Option<&'static str>,
}

impl Route {
    const fn page(path: &'static str, name: &'static str, title: &'static str) -> Self {
        Self {
            path,
            name: Some(name),
            title,
            requires_auth: true,
            requires_admin: false,
            redirect: None,
        }
    }

    const fn admin(self) -> Self {
        Self {
            requires_admin: true,
            ..self
        }
    }

    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }
}

const CONSOLE_ROUTES: &[Route] = &[
    Route {
        path: LOGIN_PATH,
        name: Some("login"),
        title: "Sign in",
        requires_auth: false,
        requires_admin: false,
        redirect: None,
    },
    Route {
        path: "/",
        name: None,
        title: "",
        requires_auth: true,
        requires_admin: false,
        redirect: Some(LANDING_PATH),
    },
    Route::page(LANDING_PATH, "overview", "Overview"),
    Route::page("/users", "users", "Users"),
    Route::page("/roles", "roles", "Roles").admin(),
    Route::page("/permissions", "permissions", "Permissions").admin(),
    Route::page("/logs", "logs", "Operation logs"),
];

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::console()
    }
}

impl RouteTable {
    pub fn console() -> Self {
        Self {
            routes: CONSOLE_ROUTES.to_vec(),
        }
    }

    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Match a path, ignoring any query/fragment and a trailing slash.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize(path);
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == Some(name))
    }
}

fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_paths() {
        let table = RouteTable::console();
        assert_eq!(table.resolve("/users").unwrap().name, Some("users"));
        assert_eq!(table.resolve("users/").unwrap().name, Some("users"));
        assert_eq!(table.resolve("/logs?page=2").unwrap().title, "Operation logs");
        assert_eq!(table.resolve("").unwrap().redirect, Some(LANDING_PATH));
        assert!(table.resolve("/nope").is_none());
    }

    #[test]
    fn admin_flags_follow_the_table() {
        let table = RouteTable::console();
        let admin_only: Vec<&str> = table
            .routes()
            .iter()
            .filter(|r| r.requires_admin)
            .map(|r| r.path)
            .collect();
        assert_eq!(admin_only, vec!["/roles", "/permissions"]);
        assert!(!table.by_name("login").unwrap().requires_auth);
        assert!(table.by_name("login").unwrap().is_login());
    }
}

//! Router: resolves a path, runs the guard and follows redirects.

use std::sync::Mutex;

use thiserror::Error;

use crate::guard::{GuardDecision, NavigationGuard};
use crate::routes::{Route, RouteTable};

/// Upper bound on chained redirects for one navigation.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The route that was finally entered, with the paths redirected away
    /// from on the way (oldest first).
    Arrived {
        route: Route,
        redirected_from: Vec<String>,
    },
    NotFound {
        path: String,
    },
}

impl Navigation {
    pub fn route(&self) -> Option<&Route> {
        match self {
            Self::Arrived { route, .. } => Some(route),
            Self::NotFound { .. } => None,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Arrived { route, .. } => route.path,
            Self::NotFound { path } => path,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation to '{from}' exceeded {} redirects ({})", MAX_REDIRECTS, .trail.join(" -> "))]
    TooManyRedirects { from: String, trail: Vec<String> },
}

pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    current: Mutex<Option<Route>>,
}

impl Router {
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        Self {
            table,
            guard,
            current: Mutex::new(None),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Last route successfully entered.
    pub fn current(&self) -> Option<Route> {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn navigate(&self, path: &str) -> Result<Navigation, NavigationError> {
        let mut target = path.to_string();
        let mut trail: Vec<String> = Vec::new();

        loop {
            let Some(route) = self.table.resolve(&target).copied() else {
                tracing::debug!(path = %target, "no route matches");
                return Ok(Navigation::NotFound { path: target });
            };

            let next = match route.redirect {
                Some(to) => Some(to),
                None => match self.guard.before_each(&route).await {
                    GuardDecision::Allow => None,
                    GuardDecision::Redirect(to) => Some(to),
                },
            };

            let Some(next) = next else {
                *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
                    Some(route);
                tracing::debug!(to = route.path, hops = trail.len(), "navigation complete");
                return Ok(Navigation::Arrived {
                    route,
                    redirected_from: trail,
                });
            };

            if trail.len() == MAX_REDIRECTS {
                tracing::warn!(from = path, "redirect loop detected");
                return Err(NavigationError::TooManyRedirects {
                    from: path.to_string(),
                    trail,
                });
            }
            trail.push(route.path.to_string());
            tracing::debug!(from = route.path, to = next, "redirect");
            target = next.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controller::SessionController;
    use crate::routes::{LANDING_PATH, LOGIN_PATH};
    use crate::test_support::FakeGateway;
    use jinkops_auth::{Session, SessionState};
    use jinkops_client::{MemorySessionStore, RecordingNotifier};

    fn router_with(table: RouteTable, gateway: FakeGateway, state: SessionState) -> (Router, Arc<FakeGateway>) {
        let gateway = Arc::new(gateway);
        let controller = Arc::new(SessionController::new(
            Session::new(state),
            gateway.clone(),
            Arc::new(MemorySessionStore::new()),
        ));
        let guard = NavigationGuard::new(controller, Arc::new(RecordingNotifier::new()));
        (Router::new(table, guard), gateway)
    }

    #[tokio::test]
    async fn root_redirects_to_landing() {
        let (router, _) = router_with(
            RouteTable::console(),
            FakeGateway::alice(),
            SessionState::seeded("T1", "alice"),
        );

        let nav = router.navigate("/").await.unwrap();
        assert_eq!(nav.path(), LANDING_PATH);
        assert_eq!(
            nav,
            Navigation::Arrived {
                route: *router.table().resolve(LANDING_PATH).unwrap(),
                redirected_from: vec!["/".into()],
            }
        );
        assert_eq!(router.current().map(|r| r.path), Some(LANDING_PATH));
    }

    #[tokio::test]
    async fn logged_out_root_ends_on_login() {
        let (router, gateway) =
            router_with(RouteTable::console(), FakeGateway::alice(), SessionState::new());

        let nav = router.navigate("/").await.unwrap();
        assert_eq!(nav.path(), LOGIN_PATH);
        assert_eq!(
            nav,
            Navigation::Arrived {
                route: *router.table().resolve(LOGIN_PATH).unwrap(),
                redirected_from: vec!["/".into(), LANDING_PATH.into()],
            }
        );
        assert_eq!(gateway.calls(), (0, 0, 0));
    }

    #[tokio::test]
    async fn denied_admin_route_lands_on_overview_after_second_bootstrap() {
        let (router, gateway) = router_with(
            RouteTable::console(),
            FakeGateway::alice(),
            SessionState::seeded("T1", "alice"),
        );

        let nav = router.navigate("/roles").await.unwrap();
        assert_eq!(nav.path(), LANDING_PATH);
        // Chained navigations each re-run the guard and its bootstrap.
        assert_eq!(gateway.calls(), (0, 2, 2));
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let (router, _) =
            router_with(RouteTable::console(), FakeGateway::alice(), SessionState::new());

        let nav = router.navigate("/does-not-exist").await.unwrap();
        assert_eq!(
            nav,
            Navigation::NotFound {
                path: "/does-not-exist".into()
            }
        );
        assert!(nav.route().is_none());
        assert!(router.current().is_none());
    }

    #[tokio::test]
    async fn redirect_loops_are_cut_off() {
        let looped = RouteTable::new(vec![
            Route {
                path: "/a",
                name: None,
                title: "",
                requires_auth: false,
                requires_admin: false,
                redirect: Some("/b"),
            },
            Route {
                path: "/b",
                name: None,
                title: "",
                requires_auth: false,
                requires_admin: false,
                redirect: Some("/a"),
            },
        ]);
        let (router, _) = router_with(looped, FakeGateway::new(), SessionState::new());

        let err = router.navigate("/a").await.unwrap_err();
        let NavigationError::TooManyRedirects { from, trail } = err;
        assert_eq!(from, "/a");
        assert_eq!(trail.len(), MAX_REDIRECTS);
    }
}

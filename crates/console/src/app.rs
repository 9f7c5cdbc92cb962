//! Application wiring: one session, one store, one transport, shared by
//! controller, guard, router and gate.

use std::sync::Arc;

use jinkops_auth::Session;
use jinkops_client::{FileSessionStore, Notifier, RestClient, SessionStore, StoreError};
use jinkops_core::ApiError;
use thiserror::Error;

use crate::config::{ConfigError, ConsoleConfig};
use crate::controller::{BootstrapMode, SessionController};
use crate::gate::{MountedView, PermissionGate};
use crate::guard::NavigationGuard;
use crate::router::{Navigation, NavigationError, Router};
use crate::routes::RouteTable;
use crate::views;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Outcome of opening a path: where navigation ended and what was mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub navigation: Navigation,
    pub view: Option<MountedView>,
}

impl Screen {
    /// `true` when the navigation ended on `path` itself.
    pub fn arrived_at(&self, path: &str) -> bool {
        matches!(&self.navigation, Navigation::Arrived { route, .. } if route.path == path)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.view.as_ref().is_some_and(|v| v.contains(label))
    }

    pub fn render(&self) -> String {
        match &self.navigation {
            Navigation::NotFound { path } => format!("Not found: {path}\n"),
            Navigation::Arrived { route, .. } => {
                let mut out = format!("== {} ({}) ==\n", route.title, route.path);
                if let Some(view) = &self.view {
                    out.push_str(&view.render());
                }
                out
            }
        }
    }
}

pub struct Console {
    config: ConsoleConfig,
    session: Session,
    client: Arc<RestClient>,
    controller: Arc<SessionController>,
    router: Router,
    gate: PermissionGate,
}

impl core::fmt::Debug for Console {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Console")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Wire the console against the file-backed store named in `config`.
    pub fn new(config: ConsoleConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ConsoleError> {
        let store = Arc::new(FileSessionStore::new(config.session_file.clone()));
        Self::with_store(config, store, notifier)
    }

    pub fn with_store(
        config: ConsoleConfig,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConsoleError> {
        config.validate()?;

        let persisted = store.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unreadable persisted session");
            Default::default()
        });
        let session = Session::new(persisted.to_state());
        tracing::debug!(
            logged_in = session.is_logged_in(),
            username = %session.username(),
            "session seeded from store"
        );

        let client = Arc::new(RestClient::new(
            &config.rest_config(),
            session.clone(),
            store.clone(),
            notifier.clone(),
        )?);

        let mode = if config.coalesce_bootstrap {
            BootstrapMode::Coalesce
        } else {
            BootstrapMode::LastWriteWins
        };
        let controller = Arc::new(
            SessionController::new(session.clone(), client.clone(), store)
                .with_bootstrap_timeout(config.bootstrap_timeout)
                .with_mode(mode),
        );

        let guard = NavigationGuard::new(controller.clone(), notifier);
        let router = Router::new(RouteTable::console(), guard);
        let gate = PermissionGate::new(session.clone());

        Ok(Self {
            config,
            session,
            client,
            controller,
            router,
            gate,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Navigate to `path` through the guard and mount the view it lands on.
    pub async fn open(&self, path: &str) -> Result<Screen, ConsoleError> {
        let navigation = self.router.navigate(path).await?;
        let view = navigation.route().and_then(|route| {
            let tree = self.session.read(|state| views::for_route(route, state))?;
            Some(self.gate.mount(tree))
        });
        Ok(Screen { navigation, view })
    }
}

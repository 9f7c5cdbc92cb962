//! Navigation guard: decides, before each transition, whether the target
//! route may be entered.

use std::sync::Arc;

use jinkops_client::Notifier;
use jinkops_client::rest::FORBIDDEN_MESSAGE;

use crate::controller::SessionController;
use crate::routes::{LANDING_PATH, LOGIN_PATH, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

pub struct NavigationGuard {
    controller: Arc<SessionController>,
    notifier: Arc<dyn Notifier>,
}

impl NavigationGuard {
    pub fn new(controller: Arc<SessionController>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            controller,
            notifier,
        }
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Rules are checked in order; the first match decides.
    pub async fn before_each(&self, to: &Route) -> GuardDecision {
        let has_token = self.controller.is_logged_in();

        if to.requires_auth && !has_token {
            tracing::debug!(to = to.path, "no token; redirecting to login");
            return GuardDecision::Redirect(LOGIN_PATH);
        }

        if has_token && to.requires_auth {
            // Every protected entry re-verifies the token.
            if let Err(err) = self.controller.bootstrap(true).await {
                tracing::warn!(to = to.path, error = %err, "bootstrap failed; logging out");
                self.controller.logout();
                return GuardDecision::Redirect(LOGIN_PATH);
            }
        }

        if to.is_login() && has_token {
            return GuardDecision::Redirect(LANDING_PATH);
        }

        if to.requires_admin && !self.controller.is_admin() {
            tracing::debug!(
                to = to.path,
                username = %self.controller.session().username(),
                "admin route denied"
            );
            self.notifier.error(FORBIDDEN_MESSAGE);
            return GuardDecision::Redirect(LANDING_PATH);
        }

        GuardDecision::Allow
    }
}

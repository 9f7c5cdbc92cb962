//! The three backend operations the session core depends on.

use jinkops_core::{ApiResult, User};

/// Whether a failing call should surface a notice to the operator.
///
/// Callers that run their own recovery (bootstrap's detail fetch) pass
/// `Silent` so the failure is not reported twice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Reporting {
    #[default]
    Report,
    Silent,
}

impl Reporting {
    pub fn is_silent(self) -> bool {
        self == Self::Silent
    }
}

/// Backend contract consumed by the session controller.
#[async_trait::async_trait]
pub trait BackendGateway: Send + Sync {
    /// Exchange credentials for a bearer token. Fails with `Unauthorized` on
    /// bad credentials.
    async fn login(&self, username: &str, password: &str) -> ApiResult<String>;

    /// Resolve a token to the username it was issued for. Fails with
    /// `Unauthorized` when the token is invalid or expired.
    async fn verify_token(&self, token: &str) -> ApiResult<String>;

    /// Full profile with roles and their permissions. Fails with `Forbidden`
    /// when the caller may not read users, `NotFound` when absent.
    async fn fetch_user_detail(&self, username: &str, reporting: Reporting) -> ApiResult<User>;
}

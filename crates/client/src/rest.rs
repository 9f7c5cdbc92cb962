//! REST transport to the RBAC backend.
//!
//! Every call:
//! - carries `Authorization: Bearer <token>` when a token is known and a fresh
//!   `X-Trace-Id`;
//! - is decoded as an [`ApiResponse`] envelope, where `code != 200` is a failure
//!   even on HTTP 200;
//! - on failure, applies the client-wide policy (forced logout on HTTP 401,
//!   operator notices unless the call is [`Reporting::Silent`]).

use std::sync::Arc;
use std::time::Duration;

use jinkops_auth::Session;
use jinkops_core::{ApiError, ApiResponse, ApiResult, LoginRequest, LoginResponse, TraceId, User};
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::endpoints::{self, TRACE_HEADER};
use crate::gateway::{BackendGateway, Reporting};
use crate::notify::Notifier;
use crate::store::SessionStore;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please sign in again";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this operation";
const GENERIC_MESSAGE: &str = "Request failed";

/// Connection settings for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            request_timeout: Duration::from_millis(15_000),
        }
    }
}

/// Where in the exchange a failure was detected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Origin {
    /// No response at all (connect error, timeout, broken body).
    Transport,
    /// Non-2xx HTTP status.
    Status,
    /// HTTP 2xx but the envelope `code` is not 200, or the body is malformed.
    Envelope,
}

#[derive(Debug)]
struct Failure {
    error: ApiError,
    origin: Origin,
}

impl Failure {
    fn new(error: ApiError, origin: Origin) -> Self {
        Self { error, origin }
    }
}

/// HTTP client bound to the shared session.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl core::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub fn new(
        config: &RestConfig,
        session: Session,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> ApiResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            session,
            store,
            notifier,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `base + path`, e.g. `roles`.
    pub(crate) fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::validation(format!("invalid endpoint '{path}': {e}")))
    }

    /// `base + path + /segment`, percent-encoding the segment (usernames may
    /// contain anything).
    pub(crate) fn url_with_segment(&self, path: &str, segment: &str) -> ApiResult<Url> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::validation(format!("base URL cannot take segments: {}", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    fn bearer_token(&self) -> Option<String> {
        let token = self.session.token();
        if token.is_empty() {
            self.store.stored_token()
        } else {
            Some(token)
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        reporting: Reporting,
    ) -> ApiResult<Option<T>> {
        let req = self.http.get(url.clone()).query(query);
        self.execute(Method::GET, url, req, reporting).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        reporting: Reporting,
    ) -> ApiResult<Option<T>> {
        let req = self.http.post(url.clone()).json(body);
        self.execute(Method::POST, url, req, reporting).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        reporting: Reporting,
    ) -> ApiResult<Option<T>> {
        let req = self.http.put(url.clone()).json(body);
        self.execute(Method::PUT, url, req, reporting).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        url: Url,
        reporting: Reporting,
    ) -> ApiResult<Option<T>> {
        let req = self.http.delete(url.clone());
        self.execute(Method::DELETE, url, req, reporting).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        req: RequestBuilder,
        reporting: Reporting,
    ) -> ApiResult<Option<T>> {
        let trace_id = TraceId::new();
        let mut req = req.header(TRACE_HEADER, trace_id.to_string());
        if let Some(token) = self.bearer_token() {
            req = req.bearer_auth(token);
        }

        tracing::debug!(%method, path = url.path(), %trace_id, "backend request");

        match dispatch::<T>(req).await {
            Ok(data) => Ok(data),
            Err(failure) => {
                tracing::debug!(
                    %method,
                    path = url.path(),
                    %trace_id,
                    error = %failure.error,
                    origin = ?failure.origin,
                    "backend request failed"
                );
                self.on_failure(&failure, reporting);
                Err(failure.error)
            }
        }
    }

    fn on_failure(&self, failure: &Failure, reporting: Reporting) {
        let report = !reporting.is_silent();
        match (failure.origin, &failure.error) {
            (Origin::Status, ApiError::Unauthorized(_)) => {
                self.force_logout();
                if report {
                    self.notifier.error(SESSION_EXPIRED_MESSAGE);
                }
            }
            (Origin::Status, ApiError::Forbidden(_)) => {
                if report {
                    self.notifier.error(FORBIDDEN_MESSAGE);
                }
            }
            (_, error) => {
                if report {
                    let message = error.message();
                    self.notifier
                        .error(if message.trim().is_empty() { GENERIC_MESSAGE } else { message });
                }
            }
        }
    }

    /// Drop the credentials everywhere; the next guarded navigation then
    /// lands on the login page.
    fn force_logout(&self) {
        tracing::warn!(username = %self.session.username(), "backend rejected token; forcing logout");
        self.session.update(|s| s.clear());
        if let Err(err) = self.store.clear() {
            tracing::error!(error = %err, "failed to clear persisted session");
        }
    }
}

async fn dispatch<T: DeserializeOwned>(req: RequestBuilder) -> Result<Option<T>, Failure> {
    let resp = req
        .send()
        .await
        .map_err(|e| Failure::new(transport_error(e), Origin::Transport))?;
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| Failure::new(transport_error(e), Origin::Transport))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|env| env.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or(GENERIC_MESSAGE).to_string());
        return Err(Failure::new(
            ApiError::from_status(status.as_u16(), message),
            Origin::Status,
        ));
    }

    let envelope: ApiResponse<T> = serde_json::from_slice(&body)
        .map_err(|e| Failure::new(ApiError::decode(e.to_string()), Origin::Envelope))?;
    envelope
        .into_result()
        .map_err(|e| Failure::new(e, Origin::Envelope))
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(err.to_string())
    } else {
        ApiError::network(err.to_string())
    }
}

fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let mut raw = raw.trim().to_string();
    // `Url::join` drops the last segment of a base without a trailing slash.
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ApiError::validation(format!("invalid base URL '{raw}': {e}")))
}

/// Payload that must be present for the call to make sense.
pub(crate) fn required<T>(data: Option<T>, what: &str) -> ApiResult<T> {
    data.ok_or_else(|| ApiError::decode(format!("{what}: response carried no data")))
}

#[async_trait::async_trait]
impl BackendGateway for RestClient {
    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: Option<LoginResponse> = self
            .post(self.url(endpoints::auth::LOGIN)?, &body, Reporting::Report)
            .await?;
        Ok(required(resp, "login")?.token)
    }

    async fn verify_token(&self, token: &str) -> ApiResult<String> {
        let username: Option<String> = self
            .get(
                self.url(endpoints::auth::VERIFY)?,
                &[("token", token.to_string())],
                Reporting::Report,
            )
            .await?;
        required(username, "verify")
    }

    async fn fetch_user_detail(&self, username: &str, reporting: Reporting) -> ApiResult<User> {
        let user: Option<User> = self
            .get(self.url_with_segment(endpoints::users::BASE, username)?, &[], reporting)
            .await?;
        required(user, "user detail")
    }
}

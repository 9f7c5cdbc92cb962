//! Error model shared by the gateway, the session controller and the views.

use thiserror::Error;

/// Result type used across the console.
pub type ApiResult<T> = Result<T, ApiError>;

/// Coarse classification of an [`ApiError`].
///
/// Session policy only ever branches on the kind, never on the message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    Server,
    Network,
    Timeout,
    Decode,
}

/// Failure of a backend call (or of an operation bounded by one).
///
/// `Clone` so that one bootstrap outcome can be handed to every caller that
/// joined it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing, invalid or expired token (HTTP / envelope 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not entitled (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested user/role/permission does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected as malformed (400 / 422).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The entity already exists or a duplicate submit was detected (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend is shedding load (429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status; carries the code the backend reported.
    #[error("server error ({code}): {message}")]
    Server { code: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// A request or a bounded operation ran out of time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Map a backend status code (envelope `code` or HTTP status) to an error.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            400 | 422 => Self::Validation(message),
            409 => Self::Conflict(message),
            429 => Self::RateLimited(message),
            code => Self::Server { code, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Server { .. } => ErrorKind::Server,
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// The human-readable part without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Conflict(m)
            | Self::RateLimited(m)
            | Self::Network(m)
            | Self::Timeout(m)
            | Self::Decode(m) => m,
            Self::Server { message, .. } => message,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(ApiError::from_status(401, "x").kind(), ErrorKind::Unauthorized);
        assert_eq!(ApiError::from_status(403, "x").kind(), ErrorKind::Forbidden);
        assert_eq!(ApiError::from_status(404, "x").kind(), ErrorKind::NotFound);
        assert_eq!(ApiError::from_status(400, "x").kind(), ErrorKind::Validation);
        assert_eq!(ApiError::from_status(409, "x").kind(), ErrorKind::Conflict);
        assert_eq!(ApiError::from_status(429, "x").kind(), ErrorKind::RateLimited);
        assert_eq!(ApiError::from_status(500, "x").kind(), ErrorKind::Server);
        assert_eq!(ApiError::from_status(502, "x").kind(), ErrorKind::Server);
    }

    #[test]
    fn message_strips_kind_prefix() {
        let err = ApiError::from_status(503, "busy");
        assert_eq!(err.message(), "busy");
        assert_eq!(err.to_string(), "server error (503): busy");
    }
}

//! The `{code, message, data}` wrapper every backend response comes in.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Envelope code signalling success.
pub const SUCCESS_CODE: i64 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: Some("success".to_string()),
            data: Some(data),
        }
    }

    pub fn fail(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Unwrap the payload, turning a non-200 `code` into the matching error.
    ///
    /// A success envelope with `data: null` yields `Ok(None)`; endpoints such as
    /// delete legitimately answer that way.
    pub fn into_result(self) -> ApiResult<Option<T>> {
        if self.is_success() {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request failed".to_string());
        let code = u16::try_from(self.code).unwrap_or(500);
        Err(ApiError::from_status(code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_data() {
        let env: ApiResponse<String> =
            serde_json::from_value(json!({ "code": 200, "message": "ok", "data": "alice" })).unwrap();
        assert_eq!(env.into_result().unwrap(), Some("alice".to_string()));
    }

    #[test]
    fn failure_code_maps_to_error_even_without_http_status() {
        let env: ApiResponse<String> =
            serde_json::from_value(json!({ "code": 401, "message": "bad credentials", "data": null }))
                .unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "bad credentials");
    }

    #[test]
    fn blank_message_gets_generic_text() {
        let env: ApiResponse<()> = ApiResponse::fail(429, "  ");
        let err = env.into_result().unwrap_err();
        assert_eq!(err, ApiError::RateLimited("request failed".to_string()));
    }

    #[test]
    fn null_data_is_not_an_error() {
        let env: ApiResponse<String> =
            serde_json::from_value(json!({ "code": 200, "message": "deleted" })).unwrap();
        assert_eq!(env.into_result().unwrap(), None);
    }
}

//! API error type and JSON error body.
//!
//! Every failed request gets a `{error, message}` body with a machine-readable
//! code, never an empty reply.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::assistant::errors::{AssistantError, StoreError};

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `bad_request`, `upstream_error`.
    pub error: String,
    pub message: String,
    /// Upstream HTTP status, when the completion API answered with one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400: empty, oversized or undecodable request.
    BadRequest(String),
    /// 503: the assistant cannot run (no credential).
    Configuration(String),
    /// 502: the completion API failed.
    Upstream {
        status: Option<u16>,
        message: String,
    },
    /// 500: store failure or anything unexpected.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, upstream_status) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Configuration(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "configuration_error",
                msg,
                None,
            ),
            ApiError::Upstream { status, message } => {
                (StatusCode::BAD_GATEWAY, "upstream_error", message, status)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
            upstream_status,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        let message = err.to_string();
        match err {
            AssistantError::InvalidMessage { .. } => ApiError::BadRequest(message),
            AssistantError::Configuration { .. } => ApiError::Configuration(message),
            AssistantError::Upstream { status, .. } => ApiError::Upstream { status, message },
            AssistantError::Store(_) => ApiError::Internal(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

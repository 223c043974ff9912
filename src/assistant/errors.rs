//! Assistant pipeline error types.

use thiserror::Error;

use crate::inference::errors::GatewayError;
use crate::inference::tool_call_parser::ToolCallParseError;

/// Errors that abort a turn. Nothing is appended to the conversation when one
/// of these is returned.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The completion gateway is misconfigured (e.g. no credential).
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// The completion API failed: non-2xx, transport, timeout or empty choices.
    #[error("upstream error{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream { status: Option<u16>, body: String },

    /// A document or conversation store read/write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The inbound message was rejected before the pipeline ran.
    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },
}

impl From<GatewayError> for AssistantError {
    fn from(err: GatewayError) -> Self {
        if err.is_configuration() {
            return AssistantError::Configuration {
                reason: err.to_string(),
            };
        }
        AssistantError::Upstream {
            status: err.status(),
            body: err
                .error_body()
                .map(String::from)
                .unwrap_or_else(|| err.to_string()),
        }
    }
}

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Recoverable failures while interpreting tool calls or resolving citations.
///
/// Never propagated out of a turn: logged, and the affected field degrades to
/// absent.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error("malformed tool call: {0}")]
    MalformedToolCall(#[from] ToolCallParseError),

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("document not found: {id}")]
    DocumentNotFound { id: String },

    #[error("document lookup failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_maps_to_configuration() {
        let err: AssistantError = GatewayError::MissingCredential.into();
        assert!(matches!(err, AssistantError::Configuration { .. }));
    }

    #[test]
    fn test_http_error_maps_to_upstream_with_status() {
        let err: AssistantError = GatewayError::HttpError {
            status: 500,
            body: "boom".into(),
        }
        .into();
        match err {
            AssistantError::Upstream { status, body } => {
                assert_eq!(status, Some(500));
                assert_eq!(body, "boom");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_no_choices_maps_to_upstream() {
        let err: AssistantError = GatewayError::NoChoices.into();
        match &err {
            AssistantError::Upstream { status, body } => {
                assert!(status.is_none());
                assert_eq!(body, "no choices returned");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert_eq!(err.to_string(), "upstream error: no choices returned");
    }

    #[test]
    fn test_upstream_display_includes_status() {
        let err = AssistantError::Upstream {
            status: Some(503),
            body: "busy".into(),
        };
        assert_eq!(err.to_string(), "upstream error (HTTP 503): busy");
    }
}

//! Completion gateway error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility: these types carry the context needed to build
//! meaningful log entries.

use thiserror::Error;

/// Errors that can occur while talking to the completion API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No API credential configured. Raised before any request is built.
    #[error("completion API credential is not configured")]
    MissingCredential,

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    /// TCP/HTTP connection to the completion endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The completion endpoint did not respond within the configured timeout.
    #[error("completion request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the completion endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed completion response: {reason}")]
    MalformedResponse { reason: String },

    /// The response decoded but carried an empty `choices` array.
    #[error("no choices returned")]
    NoChoices,
}

impl GatewayError {
    /// Whether this error means the gateway is misconfigured (no I/O happened).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingCredential | GatewayError::ConfigError { .. }
        )
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Extract the error body text, if this is an `HttpError`.
    pub fn error_body(&self) -> Option<&str> {
        match self {
            GatewayError::HttpError { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(GatewayError::MissingCredential.is_configuration());
        assert!(GatewayError::ConfigError {
            reason: "bad".into()
        }
        .is_configuration());
        assert!(!GatewayError::NoChoices.is_configuration());
        assert!(!GatewayError::HttpError {
            status: 500,
            body: String::new()
        }
        .is_configuration());
    }

    #[test]
    fn test_status_only_for_http_errors() {
        let err = GatewayError::HttpError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.error_body(), Some("bad gateway"));

        let err = GatewayError::Timeout { duration_secs: 5 };
        assert!(err.status().is_none());
        assert!(err.error_body().is_none());
    }

    #[test]
    fn test_no_choices_message() {
        assert_eq!(GatewayError::NoChoices.to_string(), "no choices returned");
    }
}

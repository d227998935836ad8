//! Error types for the API transport.

use crate::payload::ErrorPayload;
use thiserror::Error;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("Request failed with status {status}")]
    StatusError {
        status: u16,
        payload: ErrorPayload,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Transport failure that did not come from reqwest.
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::SerializationError(err.to_string())
    }
}

impl ApiError {
    /// HTTP status of the response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::StatusError { status, .. } => Some(*status),
            ApiError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Human-readable message for display near a form.
    ///
    /// Server payloads are decoded first, then the status table, then
    /// `fallback`. Network failures without a response use `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::StatusError { status, payload } => payload.describe(*status, fallback),
            ApiError::HttpError(_) | ApiError::TransportError(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }

    /// Like [`ApiError::user_message`] but joins every field error instead of
    /// taking the first one.
    pub fn flattened_message(&self, fallback: &str) -> String {
        match self {
            ApiError::StatusError { status, payload } => payload
                .flatten()
                .unwrap_or_else(|| payload.describe(*status, fallback)),
            other => other.user_message(fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessors() {
        let err = ApiError::StatusError {
            status: 401,
            payload: ErrorPayload::Empty,
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());

        let err = ApiError::TransportError("connection reset".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_user_message_uses_payload() {
        let err = ApiError::StatusError {
            status: 400,
            payload: ErrorPayload::Detail("No active account".to_string()),
        };
        assert_eq!(err.user_message("fallback"), "No active account");
    }

    #[test]
    fn test_user_message_network_failure_uses_fallback() {
        let err = ApiError::TransportError("refused".to_string());
        assert_eq!(err.user_message("Unknown error"), "Unknown error");
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: ApiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ApiError::SerializationError(_)));
    }
}

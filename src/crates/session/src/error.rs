//! Error types for the session layer

use fieldops_http::ApiError;
use thiserror::Error;

/// Errors that can occur in session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// API error
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Durable storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation needs a logged-in session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Unknown route name or path
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Unsupported preference value
    #[error("Invalid preference: {0}")]
    InvalidPreference(String),
}

impl SessionError {
    /// Whether the underlying API call was rejected with 401
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Api(e) if e.is_unauthorized())
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

//! Error types for the chat layer

use fieldops_http::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// History request failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// No access token to open the connection with
    #[error("Cannot connect chat: not authenticated")]
    NotAuthenticated,

    /// Sending requires an open connection
    #[error("Chat connection is not open")]
    NotConnected,

    /// Outgoing content rejected before sending
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Inbound frame or history page that could not be used
    #[error("Malformed data: {0}")]
    Malformed(String),

    /// WebSocket failure
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;

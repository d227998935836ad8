//! Error types for the fieldops client

use fieldops_chat::ChatError;
use fieldops_http::ApiError;
use fieldops_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldopsError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Command failed with a message already meant for the user
    #[error("{0}")]
    Command(String),
}

/// Result type for fieldops operations
pub type Result<T> = std::result::Result<T, FieldopsError>;

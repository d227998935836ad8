//! API transport layer for fieldops.
//!
//! This crate sits between the session/chat services and the remote REST API.
//! It provides:
//!
//! ## Client (`client`)
//!
//! An [`ApiClient`] that runs every request through two interceptor hooks:
//! the request hook injects `Authorization: Bearer <token>` when a credential
//! is installed, and the response hook reports `401` responses to an
//! [`UnauthorizedHandler`] before the error reaches the caller.
//!
//! ```rust,ignore
//! use fieldops_http::{ApiClient, ClientConfig, ReqwestTransport};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::new("http://localhost:8000/api/").with_max_retries(2);
//! let transport = ReqwestTransport::new(config)?;
//! let api = ApiClient::new(Arc::new(transport));
//! api.set_bearer("eyJ...");
//! let profile: serde_json::Value = api.get("users/me/").await?;
//! ```
//!
//! ## Payload (`payload`)
//!
//! [`ErrorPayload`] decodes the differently shaped error bodies the server
//! produces into one display string.
//!
//! ## Config (`config`)
//!
//! Environment variable helpers used by the configuration loader.
//!
//! # Features
//!
//! - `mock` - [`mock::MockTransport`], a scripted transport for tests

pub mod client;
pub mod config;
pub mod error;
pub mod payload;

#[cfg(feature = "mock")]
pub mod mock;

pub use client::{
    ApiClient, ApiRequest, ApiResponse, AuthHelper, ClientConfig, ReqwestTransport, Transport,
    UnauthorizedHandler,
};
pub use config::{get_env, get_env_opt};
pub use error::{ApiError, Result};
pub use payload::{status_message, ErrorPayload, FieldErrors};

pub use reqwest::Method;

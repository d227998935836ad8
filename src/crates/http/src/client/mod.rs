//! API client with credential injection.
//!
//! [`ApiClient`] is the single path every REST call takes. It owns the
//! process-wide default credential and applies two hooks:
//! - request hook: attach `Authorization: Bearer <token>` if a credential is
//!   installed when the request is sent;
//! - response hook: on `401`, notify the installed [`UnauthorizedHandler`]
//!   once, then return the original error to the caller.

mod transport;

pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

use crate::error::{ApiError, Result};
use crate::payload::ErrorPayload;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relative request paths are joined to this (`http://localhost:8000/api/`).
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after a timeout, connect error or 5xx.
    pub max_retries: u32,
    /// Delay before the first retry; multiplied by `backoff_multiplier`
    /// after each one.
    pub retry_delay: Duration,
    pub backoff_multiplier: f32,
    pub user_agent: Option<String>,
    /// Sent with every request, before per-request headers.
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            user_agent: None,
            default_headers: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((key.into(), value.into()));
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api/")
    }
}

/// Helper for building authorization header values.
pub struct AuthHelper;

impl AuthHelper {
    /// Header name the bearer credential is sent under.
    pub const HEADER: &'static str = "Authorization";

    /// Create a bearer token authorization header value.
    pub fn bearer_token(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

/// Reacts to a rejected credential. Installed by the session layer.
#[async_trait]
pub trait UnauthorizedHandler: Send + Sync {
    async fn on_unauthorized(&self);
}

/// API client applying the credential interceptors on top of a [`Transport`].
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credential: RwLock<Option<String>>,
    unauthorized: RwLock<Option<Arc<dyn UnauthorizedHandler>>>,
}

impl ApiClient {
    /// Create a client over the given transport, with no credential installed.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            credential: RwLock::new(None),
            unauthorized: RwLock::new(None),
        }
    }

    /// Install the default bearer credential for all future requests.
    pub fn set_bearer(&self, token: impl Into<String>) {
        *self.credential.write() = Some(token.into());
    }

    /// Remove the default credential.
    pub fn clear_bearer(&self) {
        *self.credential.write() = None;
    }

    /// Whether a credential is currently installed.
    pub fn has_bearer(&self) -> bool {
        self.credential.read().is_some()
    }

    /// Install the handler notified on `401` responses.
    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        *self.unauthorized.write() = Some(handler);
    }

    /// Send a request through both hooks. Non-success statuses become
    /// [`ApiError::StatusError`] with the decoded payload.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        // Request hook: credential as of send time
        let credential = self.credential.read().clone();
        if let Some(token) = credential {
            request.set_header(AuthHelper::HEADER, AuthHelper::bearer_token(&token));
        }

        let method = request.method.clone();
        let url = request.url.clone();
        let response = self.transport.send(request).await?;
        debug!("{} {} -> {}", method, url, response.status);

        // Response hook
        if response.status == 401 {
            warn!("401 Unauthorized from {}, invalidating session", url);
            let handler = self.unauthorized.read().clone();
            if let Some(handler) = handler {
                handler.on_unauthorized().await;
            }
        }

        if !response.is_success() {
            return Err(ApiError::StatusError {
                status: response.status,
                payload: ErrorPayload::decode(&response.body),
            });
        }

        Ok(response)
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.send(ApiRequest::get(url)).await?.json()
    }

    /// POST a JSON body and decode the JSON answer.
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        self.send(ApiRequest::post_json(url, body)?).await?.json()
    }
}

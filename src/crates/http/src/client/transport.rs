//! Request/response types and the transport seam.

use crate::client::ClientConfig;
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// An outgoing API request. `url` is either a path relative to the
/// configured base URL or an absolute URL (pagination links).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Create a request without a body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request with a JSON body.
    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self> {
        let mut request = Self::new(Method::POST, url);
        request.body = Some(serde_json::to_value(body)?);
        Ok(request)
    }

    /// Set a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.headers.push((key, value.into()));
    }

    /// Builder-style [`ApiRequest::set_header`].
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(key, value);
        self
    }

    /// Look up a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// A response as seen by the interceptors: status plus raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends requests over the wire. Every status code is a successful send;
/// only failures to get a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport with retry on timeouts, connect errors and 5xx.
pub struct ReqwestTransport {
    config: ClientConfig,
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            config,
            client,
            base_url,
        })
    }

    /// Base URL every relative path is joined to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request URL against the base URL.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        self.base_url
            .join(url.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Send a request builder with retry logic.
    async fn send_with_retry(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let mut attempts = 0;
        let mut delay = self.config.retry_delay;

        loop {
            let request = req
                .try_clone()
                .ok_or_else(|| ApiError::TransportError("Failed to clone request".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    if response.status().is_success() || attempts >= self.config.max_retries {
                        return Ok(response);
                    }

                    // Only server errors are worth another attempt
                    if !response.status().is_server_error() {
                        return Ok(response);
                    }
                    warn!(
                        "Server returned {}, retrying ({}/{})",
                        response.status(),
                        attempts + 1,
                        self.config.max_retries
                    );
                }
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        return Err(ApiError::HttpError(e));
                    }

                    if !e.is_timeout() && !e.is_connect() {
                        return Err(ApiError::HttpError(e));
                    }
                    warn!(
                        "Request failed: {}, retrying ({}/{})",
                        e,
                        attempts + 1,
                        self.config.max_retries
                    );
                }
            }

            attempts += 1;
            tokio::time::sleep(delay).await;
            delay = Duration::from_secs_f32(delay.as_secs_f32() * self.config.backoff_multiplier);
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.resolve(&request.url)?;
        debug!("{} {}", request.method, url.path());

        let mut req = self.client.request(request.method, url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }
        for (key, value) in &request.headers {
            req = req.header(key, value);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = self.send_with_retry(req).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

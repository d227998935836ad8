//! Scripted in-memory transport for tests of the layers above.
//!
//! Responses are matched on method and the request URL exactly as the caller
//! passed it. Later registrations win. Unmatched requests get `404`.

use crate::client::{ApiRequest, ApiResponse, Transport};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::Semaphore;

struct MockRoute {
    method: Method,
    url: String,
    status: u16,
    body: String,
}

/// Transport that replays registered responses and records every request.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<MockRoute>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a response for `method url`.
    pub fn on(&self, method: Method, url: &str, status: u16, body: impl Into<String>) {
        self.routes.lock().push(MockRoute {
            method,
            url: url.to_string(),
            status,
            body: body.into(),
        });
    }

    /// Register a JSON response for `method url`.
    pub fn on_json(&self, method: Method, url: &str, status: u16, body: serde_json::Value) {
        self.on(method, url, status, body.to_string());
    }

    /// Park every subsequent request until [`MockTransport::release`].
    pub fn hold(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let parked and future requests through.
    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests sent to `url`.
    pub fn count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }

    /// `Authorization` header of every request, in order.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.header("Authorization").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = {
            let routes = self.routes.lock();
            routes
                .iter()
                .rev()
                .find(|r| r.method == request.method && r.url == request.url)
                .map(|r| ApiResponse::new(r.status, r.body.clone()))
                .unwrap_or_else(|| ApiResponse::new(404, ""))
        };
        self.requests.lock().push(request);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        Ok(response)
    }
}

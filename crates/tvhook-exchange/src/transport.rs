//! HTTP transport for exchange REST calls.
//!
//! The transport only moves bytes: it attaches the signed headers, sends the
//! request, and hands back whatever status and body came back. Deciding what
//! a non-2xx response means is left to the caller.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

use crate::auth::SignedHeaders;
use crate::error::{TransportError, TransportResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Path relative to the API base, starting with `/`.
    pub path: String,
    pub headers: SignedHeaders,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn get(path: impl Into<String>, headers: SignedHeaders) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            headers,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, headers: SignedHeaders, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            headers,
            body: Some(body),
        }
    }
}

/// Status and body of a completed exchange call.
///
/// Bodies that are not JSON arrive as `Value::String` so nothing is lost.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the exchange.
pub trait ExchangeTransport: Send + Sync {
    fn execute(&self, request: TransportRequest) -> BoxFuture<'_, TransportResult<TransportResponse>>;
}

/// Arc wrapper for transport trait objects.
pub type DynTransport = Arc<dyn ExchangeTransport>;

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// # Arguments
    /// * `base_url` - API root (e.g. "https://api.coinbase.com")
    /// * `timeout` - per-request timeout; expiry surfaces as a network error
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        let url = self.url(&request.path);
        trace!(method = %request.method, %url, "exchange request");

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        }
        .header(reqwest::header::AUTHORIZATION, request.headers.authorization())
        .header(reqwest::header::CONTENT_TYPE, "application/json");

        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to read response: {e}")))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(TransportResponse { status, body })
    }
}

impl ExchangeTransport for HttpTransport {
    fn execute(&self, request: TransportRequest) -> BoxFuture<'_, TransportResult<TransportResponse>> {
        Box::pin(self.send(request))
    }
}

/// Mock transport for testing.
///
/// Replies are registered per `(method, path)`; unregistered routes answer
/// 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<TransportRequest>>,
    routes: Mutex<HashMap<(HttpMethod, String), TransportResult<TransportResponse>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reply to `method path` with `status` and `body`.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .insert((method, path.to_string()), Ok(TransportResponse::new(status, body)));
    }

    /// Fail `method path` with a network error.
    pub fn fail(&self, method: HttpMethod, path: &str, error: &str) {
        self.routes.lock().insert(
            (method, path.to_string()),
            Err(TransportError::Network(error.to_string())),
        );
    }

    /// Get recorded requests.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Count recorded requests for one route.
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl ExchangeTransport for MockTransport {
    fn execute(&self, request: TransportRequest) -> BoxFuture<'_, TransportResult<TransportResponse>> {
        Box::pin(async move {
            let key = (request.method, request.path.clone());
            self.requests.lock().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.routes.lock().get(&key).cloned().unwrap_or_else(|| {
                Ok(TransportResponse::new(
                    404,
                    serde_json::json!({"error": "NOT_FOUND", "message": "no mock route"}),
                ))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_records_and_routes() {
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Get, "/a", 200, json!({"ok": true}));
        mock.fail(HttpMethod::Post, "/b", "connection reset");

        let ok = mock
            .execute(TransportRequest::get("/a", SignedHeaders::bearer("t")))
            .await
            .unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.body["ok"], true);

        let err = mock
            .execute(TransportRequest::post("/b", SignedHeaders::bearer("t"), json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));

        let missing = mock
            .execute(TransportRequest::get("/c", SignedHeaders::bearer("t")))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);

        assert_eq!(mock.requests().len(), 3);
        assert_eq!(mock.count(HttpMethod::Get, "/a"), 1);
    }

    #[test]
    fn test_http_transport_trims_base() {
        let transport = HttpTransport::new("https://api.coinbase.com/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            transport.url("/api/v3/brokerage/accounts"),
            "https://api.coinbase.com/api/v3/brokerage/accounts"
        );
    }
}

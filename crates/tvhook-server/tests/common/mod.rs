//! Shared harness for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tvhook_exchange::{HttpMethod, MockAuthenticator, MockTransport};
use tvhook_executor::ORDERS_PATH;
use tvhook_server::{AppConfig, Application};

pub const BTC_PRODUCT: &str = "/api/v3/brokerage/products/BTC-USD";
pub const WEBHOOK: &str = "/api/arbWebhook";

pub struct TestApp {
    pub router: Router,
    pub transport: Arc<MockTransport>,
    pub auth: Arc<MockAuthenticator>,
}

impl TestApp {
    /// App backed by a mock exchange that knows BTC-USD and accepts orders.
    pub fn new(config: AppConfig) -> Self {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            HttpMethod::Get,
            BTC_PRODUCT,
            200,
            json!({"product_id": "BTC-USD", "base_increment": "0.00000001", "quote_increment": "0.01"}),
        );
        transport.respond(
            HttpMethod::Post,
            ORDERS_PATH,
            200,
            json!({"success": true, "success_response": {"order_id": "ord-1"}}),
        );
        let auth = Arc::new(MockAuthenticator::new());
        let app = Application::with_exchange(config, auth.clone(), transport.clone()).unwrap();
        Self {
            router: app.router(),
            transport,
            auth,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, text) = self.send_text(request).await;
        (status, serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    pub async fn send_text(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn posted_orders(&self) -> usize {
        self.transport.count(HttpMethod::Post, ORDERS_PATH)
    }
}

pub fn signal(action: &str, quantity_type: &str) -> Value {
    json!({
        "symbol": "BTCUSD",
        "action": action,
        "quantity_type": quantity_type,
        "quantity": "100",
        "close": "50000.00"
    })
}

/// POST to the webhook route with a JSON content type; add headers as needed.
pub fn webhook_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri(WEBHOOK)
        .header("content-type", "application/json")
}

pub fn post_json(body: &Value) -> Request<Body> {
    webhook_request()
        .body(Body::from(body.to_string()))
        .unwrap()
}

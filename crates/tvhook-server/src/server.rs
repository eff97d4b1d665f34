//! HTTP server implementation using axum.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info_span, warn};
use tvhook_executor::{Execution, PipelineError, SignalPipeline};
use tvhook_gate::InboundRequest;
use tvhook_telemetry::{execution_message, rejection_message, Metrics, TelegramNotifier};

use crate::config::ServerConfig;

const CLIENT_CERT_HEADER: &str = "x-arr-clientcert-subject";

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<SignalPipeline>,
    notifier: Arc<TelegramNotifier>,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<SignalPipeline>, notifier: Arc<TelegramNotifier>) -> Self {
        Self {
            pipeline,
            notifier,
            max_body_bytes: ServerConfig::default().max_body_bytes,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Create the axum router.
pub fn create_router(state: AppState, webhook_route: &str, metrics_enabled: bool) -> Router {
    let mut router = Router::new()
        .route(webhook_route, post(webhook))
        .route("/health", get(health));
    if metrics_enabled {
        router = router.route("/metrics", get(metrics));
    }
    // Path only: the query string may carry the webhook password.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path()
        )
    });
    router.layer(trace).with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn metrics() -> Response {
    match Metrics::render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Receive one signal and run it through the pipeline.
async fn webhook(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    let inbound = inbound_request(&parts.headers, query, peer);

    let body = match read_body(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let result = state.pipeline.process(&inbound, &body).await;
    notify(&state.notifier, &result);
    match result {
        Ok(execution) => success_response(&execution),
        Err(e) => error_response(e),
    }
}

async fn read_body(body: Body, limit: usize) -> Result<axum::body::Bytes, Response> {
    to_bytes(body, limit).await.map_err(|e| {
        warn!(error = %e, limit, "Request body rejected");
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "Request body too large" })),
        )
            .into_response()
    })
}

/// Translate the hosting layer's view of a request into gate input.
///
/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// the socket peer.
pub fn inbound_request(
    headers: &HeaderMap,
    query: HashMap<String, String>,
    peer: Option<IpAddr>,
) -> InboundRequest {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let forwarded = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(parse_client_ip);
    let real_ip = header_str("x-real-ip").and_then(parse_client_ip);

    let mut inbound = InboundRequest::new();
    if let Some(ip) = forwarded.or(real_ip).or(peer) {
        inbound = inbound.with_source_addr(ip);
    }
    if let Some(subject) = header_str(CLIENT_CERT_HEADER) {
        inbound = inbound.with_peer_subject(subject);
    }
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            inbound = inbound.with_header(name.as_str(), value);
        }
    }
    for (name, value) in query {
        inbound = inbound.with_query(name, value);
    }
    inbound
}

/// Proxies may append the source port (`1.2.3.4:5678`, `[::1]:5678`).
fn parse_client_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|a| a.ip()))
}

fn notify(notifier: &Arc<TelegramNotifier>, result: &Result<Execution, PipelineError>) {
    let text = match result {
        Ok(execution) => execution_message(&execution.signal, &execution.outcome),
        Err(PipelineError::SubmissionError(execution)) => {
            execution_message(&execution.signal, &execution.outcome)
        }
        // Unauthenticated traffic must not be able to drive the chat.
        Err(PipelineError::RejectedByGate(_)) => return,
        Err(e) => rejection_message(e.kind(), &e.to_string()),
    };
    notifier.notify(text);
}

fn success_response(execution: &Execution) -> Response {
    let signal = &execution.signal;
    let order = &execution.order;
    let outcome = &execution.outcome;

    let message = if outcome.dry_run {
        "Webhook received and validated (DRY RUN - no order placed)"
    } else {
        "Order placed"
    };

    let body = json!({
        "status": "success",
        "message": message,
        "dry_run": outcome.dry_run,
        "data": {
            "symbol": signal.symbol,
            "action": signal.action,
            "quantity": signal.quantity.to_string(),
            "quantity_type": signal.quantity_type,
            "close": signal.reference_price.to_string(),
        },
        "order": {
            "client_order_id": order.client_order_id,
            "product_id": order.pair.product_id(),
            "side": order.side.as_wire(),
            "size_kind": order.size_kind,
            "size": order.size.to_wire(),
            "limit_price": order.limit_price.to_wire(),
            "order_id": outcome.order_id,
        },
    });
    debug!(client_order_id = %order.client_order_id, "Webhook succeeded");
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(error: PipelineError) -> Response {
    let (status, body) = match &error {
        PipelineError::RejectedByGate(_) => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
        PipelineError::InvalidSignal(v) if v.field == "payload" => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid JSON payload", "detail": v.reason }),
        ),
        PipelineError::InvalidSignal(v) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": v.to_string(), "field": v.field }),
        ),
        PipelineError::SizeBelowIncrement(e)
        | PipelineError::SizeOutOfRange(e)
        | PipelineError::UnsupportedSizing(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": e.to_string(), "kind": error.kind() }),
        ),
        PipelineError::PrecisionUnavailable(detail) => (
            StatusCode::BAD_GATEWAY,
            json!({ "error": "Product precision unavailable", "detail": detail }),
        ),
        PipelineError::SubmissionError(execution) => (
            StatusCode::BAD_GATEWAY,
            json!({
                "error": "Order rejected by exchange",
                "detail": execution.outcome.error_detail,
                "client_order_id": execution.order.client_order_id,
                "exchange_response": execution.outcome.raw_response,
            }),
        ),
        PipelineError::CredentialError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal server error" }),
        ),
    };
    (status, Json(body)).into_response()
}

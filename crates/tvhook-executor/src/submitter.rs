//! Order placement.
//!
//! One POST per order, never retried. Whatever the exchange says comes back
//! as an `OrderOutcome`; only a signing failure is an error.

use std::time::Instant;

use serde_json::{json, Value};
use tracing::{error, info, warn};
use tvhook_core::{OrderOutcome, OrderRequest};
use tvhook_exchange::{CredentialError, DynAuthenticator, DynTransport, TransportRequest};
use tvhook_telemetry::Metrics;

/// Order placement endpoint.
pub const ORDERS_PATH: &str = "/api/v3/brokerage/orders";

/// Exchange request body for a GTC limit order.
///
/// Decimals are rendered without trailing zeros.
pub fn order_body(order: &OrderRequest) -> Value {
    let mut config = serde_json::Map::new();
    config.insert(order.size_kind.field_name().to_string(), json!(order.size.to_wire()));
    config.insert("limit_price".to_string(), json!(order.limit_price.to_wire()));
    config.insert("post_only".to_string(), json!(false));

    json!({
        "client_order_id": order.client_order_id.as_str(),
        "product_id": order.pair.product_id(),
        "side": order.side.as_wire(),
        "order_configuration": {
            "limit_limit_gtc": Value::Object(config),
        },
    })
}

/// Sends built orders to the exchange.
pub struct OrderSubmitter {
    auth: DynAuthenticator,
    transport: DynTransport,
}

impl OrderSubmitter {
    pub fn new(auth: DynAuthenticator, transport: DynTransport) -> Self {
        Self { auth, transport }
    }

    /// Submit `order`, or describe it without sending when `dry_run` is set.
    pub async fn submit(
        &self,
        order: &OrderRequest,
        dry_run: bool,
    ) -> Result<OrderOutcome, CredentialError> {
        let body = order_body(order);

        if dry_run {
            info!(%order, "DRY RUN: order not placed");
            Metrics::order_completed("dry_run", order.side.as_wire());
            return Ok(OrderOutcome::dry_run(json!({
                "dry_run": true,
                "request": body,
            })));
        }

        let headers = self.auth.sign("POST", ORDERS_PATH).map_err(|e| {
            error!(error = %e, "Failed to sign order request");
            e
        })?;

        let started = Instant::now();
        let result = self
            .transport
            .execute(TransportRequest::post(ORDERS_PATH, headers, body))
            .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = match result {
            Err(e) => OrderOutcome::failed(e.to_string(), Value::Null),
            Ok(response) if !response.is_success() => {
                let detail = format!("HTTP {}: {}", response.status, response.body);
                OrderOutcome::failed(detail, response.body)
            }
            Ok(response) => interpret_envelope(response.body),
        };

        let label = if outcome.success { "accepted" } else { "rejected" };
        Metrics::order_completed(label, order.side.as_wire());
        Metrics::order_latency(label, latency_ms);

        if outcome.success {
            info!(
                %order,
                order_id = outcome.order_id.as_deref().unwrap_or(""),
                latency_ms,
                "Order accepted"
            );
        } else {
            warn!(
                %order,
                detail = outcome.error_detail.as_deref().unwrap_or(""),
                latency_ms,
                "Order rejected"
            );
        }
        Ok(outcome)
    }
}

/// Read the `{success, success_response | error_response}` envelope.
fn interpret_envelope(body: Value) -> OrderOutcome {
    let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    if success {
        let order_id = body
            .pointer("/success_response/order_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        return OrderOutcome {
            success: true,
            order_id,
            raw_response: body,
            error_detail: None,
            dry_run: false,
        };
    }

    let detail = body
        .get("error_response")
        .map(Value::to_string)
        .unwrap_or_else(|| body.to_string());
    OrderOutcome::failed(detail, body)
}

/// Whether a rejection points at stale increments.
pub fn is_precision_rejection(outcome: &OrderOutcome) -> bool {
    !outcome.success
        && outcome
            .error_detail
            .as_deref()
            .map(|d| d.contains("PRECISION"))
            .unwrap_or(false)
}

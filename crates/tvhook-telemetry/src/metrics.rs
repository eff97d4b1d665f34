//! Prometheus metrics for the signal bridge.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error that should crash
//! at startup. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Inbound webhook requests.
pub static SIGNALS_RECEIVED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "tvhook_signals_received_total",
        "Total inbound webhook requests"
    )
    .unwrap()
});

/// Requests rejected by the security gate.
/// Labels: reason
pub static GATE_REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tvhook_gate_rejections_total",
        "Requests rejected by the security gate",
        &["reason"]
    )
    .unwrap()
});

/// Signals that failed validation.
/// Labels: field
pub static VALIDATION_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tvhook_validation_failures_total",
        "Signals rejected by the validator",
        &["field"]
    )
    .unwrap()
});

/// Orders by terminal outcome.
/// Labels: outcome (accepted/rejected/dry_run), side
pub static ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tvhook_orders_total",
        "Orders processed by terminal outcome",
        &["outcome", "side"]
    )
    .unwrap()
});

/// Order placement round-trip latency.
pub static ORDER_SUBMIT_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tvhook_order_submit_latency_ms",
        "Order placement round-trip latency in milliseconds",
        &["outcome"],
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Product metadata fetches.
/// Labels: result (ok/error)
pub static PRECISION_FETCHES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tvhook_precision_fetches_total",
        "Product precision metadata fetches",
        &["result"]
    )
    .unwrap()
});

/// Signed tokens generated (cache misses).
pub static TOKEN_GENERATIONS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "tvhook_token_generations_total",
        "Exchange auth tokens generated"
    )
    .unwrap()
});

/// Pipeline failures after the gate.
/// Labels: kind
pub static PIPELINE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tvhook_pipeline_errors_total",
        "Signals that failed after admission",
        &["kind"]
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    pub fn signal_received() {
        SIGNALS_RECEIVED_TOTAL.inc();
    }

    pub fn gate_rejected(reason: &str) {
        GATE_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn validation_failed(field: &str) {
        VALIDATION_FAILURES_TOTAL.with_label_values(&[field]).inc();
    }

    /// Record a terminal order outcome.
    pub fn order_completed(outcome: &str, side: &str) {
        ORDERS_TOTAL.with_label_values(&[outcome, side]).inc();
    }

    pub fn order_latency(outcome: &str, latency_ms: f64) {
        ORDER_SUBMIT_LATENCY_MS
            .with_label_values(&[outcome])
            .observe(latency_ms);
    }

    pub fn precision_fetched(ok: bool) {
        let result = if ok { "ok" } else { "error" };
        PRECISION_FETCHES_TOTAL.with_label_values(&[result]).inc();
    }

    pub fn token_generated() {
        TOKEN_GENERATIONS_TOTAL.inc();
    }

    pub fn pipeline_error(kind: &str) {
        PIPELINE_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Render the default registry in text exposition format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metrics() {
        Metrics::signal_received();
        Metrics::gate_rejected("origin_not_allowed");
        let text = Metrics::render().unwrap();
        assert!(text.contains("tvhook_signals_received_total"));
        assert!(text.contains("origin_not_allowed"));
    }
}

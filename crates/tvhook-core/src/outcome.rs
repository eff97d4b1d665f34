//! Terminal result of an order submission.

use serde::Serialize;
use serde_json::Value;

/// What happened to a built order. Terminal; never retried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderOutcome {
    pub success: bool,
    pub order_id: Option<String>,
    /// Exchange response body as received (or a synthetic body for dry runs).
    pub raw_response: Value,
    /// Exchange-supplied failure detail, preserved verbatim.
    pub error_detail: Option<String>,
    pub dry_run: bool,
}

impl OrderOutcome {
    pub fn accepted(order_id: impl Into<String>, raw_response: Value) -> Self {
        Self {
            success: true,
            order_id: Some(order_id.into()),
            raw_response,
            error_detail: None,
            dry_run: false,
        }
    }

    pub fn failed(error_detail: impl Into<String>, raw_response: Value) -> Self {
        Self {
            success: false,
            order_id: None,
            raw_response,
            error_detail: Some(error_detail.into()),
            dry_run: false,
        }
    }

    /// Synthetic outcome for a request that was never sent.
    pub fn dry_run(raw_response: Value) -> Self {
        Self {
            success: true,
            order_id: None,
            raw_response,
            error_detail: None,
            dry_run: true,
        }
    }
}

//! Order-related types and identifiers.
//!
//! Provides order side, size denomination, time-in-force, client order ID
//! and the fully specified limit-order request handed to the submitter.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::{Price, Size};
use crate::pair::TradingPair;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Exchange wire literal.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Which amount the order size is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeKind {
    /// Size is in base-asset units (`base_size`).
    BaseSize,
    /// Size is in quote currency (`quote_size`).
    QuoteSize,
}

impl SizeKind {
    /// Exchange field name carrying the size.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::BaseSize => "base_size",
            Self::QuoteSize => "quote_size",
        }
    }
}

/// Time-in-force for orders.
///
/// Unattended execution only ever rests limit orders on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[default]
    #[serde(rename = "gtc")]
    GoodTilCancelled,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCancelled => write!(f, "gtc"),
        }
    }
}

/// Client order ID, generated fresh for every submission attempt.
///
/// The exchange deduplicates on this value, so it must never be reused
/// across requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `tvhook_{timestamp_ms}_{uuid}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        Self(format!("tvhook_{ts}_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully specified, precision-compliant limit order.
///
/// Built fresh per submission and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub client_order_id: ClientOrderId,
    pub pair: TradingPair,
    pub side: OrderSide,
    pub size_kind: SizeKind,
    pub size: Size,
    pub limit_price: Price,
    pub time_in_force: TimeInForce,
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}={} @ {} ({})",
            self.side,
            self.pair,
            self.size_kind.field_name(),
            self.size,
            self.limit_price,
            self.time_in_force
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire() {
        assert_eq!(OrderSide::Buy.as_wire(), "BUY");
        assert_eq!(OrderSide::Sell.as_wire(), "SELL");
    }

    #[test]
    fn test_size_kind_field() {
        assert_eq!(SizeKind::BaseSize.field_name(), "base_size");
        assert_eq!(SizeKind::QuoteSize.field_name(), "quote_size");
    }

    #[test]
    fn test_client_order_id_unique() {
        let id1 = ClientOrderId::new();
        let id2 = ClientOrderId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("tvhook_"));
    }
}

//! Inbound trading signal and its validator.
//!
//! The charting side posts a flat JSON object:
//!
//! ```json
//! {"symbol": "BTCUSD", "action": "buy", "quantity_type": "cash",
//!  "quantity": "100", "close": "50000.00"}
//! ```
//!
//! Numeric fields may arrive either as JSON strings or JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::decimal::Price;
use crate::error::ValidationError;
use crate::order::OrderSide;
use crate::pair::TradingPair;

const REQUIRED_FIELDS: [&str; 5] = ["symbol", "action", "quantity_type", "quantity", "close"];

/// How the signal's `quantity` is denominated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    /// Amount of quote currency.
    Cash,
    /// Amount of base asset.
    Units,
    /// Share of available balance. Not executable yet.
    Percent,
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Units => write!(f, "units"),
            Self::Percent => write!(f, "percent"),
        }
    }
}

/// A validated trading signal. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub symbol: String,
    pub pair: TradingPair,
    pub action: OrderSide,
    pub quantity_type: QuantityType,
    pub quantity: Decimal,
    pub reference_price: Price,
}

impl Signal {
    /// Validate a raw JSON payload into a `Signal`.
    pub fn parse(raw: &Value) -> Result<Self, ValidationError> {
        let map = raw
            .as_object()
            .ok_or_else(|| ValidationError::new("payload", "expected a JSON object"))?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| map.get(*f).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::missing(&missing));
        }

        let symbol = string_field(map, "symbol")?.trim().to_string();
        if symbol.is_empty() {
            return Err(ValidationError::new("symbol", "must not be empty"));
        }
        let pair = TradingPair::from_symbol(&symbol)
            .map_err(|_| ValidationError::new("symbol", format!("cannot derive trading pair from '{symbol}'")))?;

        let action = match string_field(map, "action")?.trim().to_ascii_lowercase().as_str() {
            "buy" => OrderSide::Buy,
            "sell" => OrderSide::Sell,
            other => {
                return Err(ValidationError::new(
                    "action",
                    format!("expected buy or sell, got '{other}'"),
                ))
            }
        };

        let quantity_type = match string_field(map, "quantity_type")?
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "cash" => QuantityType::Cash,
            "units" | "contracts" => QuantityType::Units,
            "percent" => QuantityType::Percent,
            other => {
                return Err(ValidationError::new(
                    "quantity_type",
                    format!("expected cash, units or percent, got '{other}'"),
                ))
            }
        };

        let quantity = positive_decimal(map, "quantity")?;
        let reference_price = Price::new(positive_decimal(map, "close")?);

        Ok(Self {
            symbol,
            pair,
            action,
            quantity_type,
            quantity,
            reference_price,
        })
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} @ {}",
            self.action, self.quantity, self.quantity_type, self.pair, self.reference_price
        )
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a str, ValidationError> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::new(field, "expected a string"))
}

fn positive_decimal(map: &Map<String, Value>, field: &str) -> Result<Decimal, ValidationError> {
    let value = match map.get(field) {
        Some(Value::String(s)) => parse_decimal(s.trim()),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        _ => None,
    }
    .ok_or_else(|| ValidationError::new(field, "expected a decimal number"))?;

    if value <= Decimal::ZERO {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(value)
}

// Floats render as `1e-5` once small enough, so fall back to scientific.
fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_valid_buy() {
        let signal = Signal::parse(&json!({
            "symbol": "BTCUSD",
            "action": "BUY",
            "quantity_type": "Cash",
            "quantity": "100",
            "close": "50000.00"
        }))
        .unwrap();

        assert_eq!(signal.pair.to_string(), "BTC-USD");
        assert_eq!(signal.action, OrderSide::Buy);
        assert_eq!(signal.quantity_type, QuantityType::Cash);
        assert_eq!(signal.quantity, dec!(100));
        assert_eq!(signal.reference_price, Price::new(dec!(50000.00)));
    }

    #[test]
    fn test_parse_numeric_fields() {
        let signal = Signal::parse(&json!({
            "symbol": "ETHUSD",
            "action": "sell",
            "quantity_type": "contracts",
            "quantity": 0.5,
            "close": 3000
        }))
        .unwrap();

        assert_eq!(signal.quantity_type, QuantityType::Units);
        assert_eq!(signal.quantity, dec!(0.5));
        assert_eq!(signal.reference_price.inner(), dec!(3000));
    }

    #[test]
    fn test_missing_fields_all_listed() {
        let err = Signal::parse(&json!({"symbol": "BTCUSD", "action": "buy"})).unwrap_err();
        assert_eq!(err.field, "quantity_type, quantity, close");
    }

    #[test]
    fn test_non_positive_rejected() {
        let err = Signal::parse(&json!({
            "symbol": "BTCUSD",
            "action": "buy",
            "quantity_type": "cash",
            "quantity": "0",
            "close": "50000"
        }))
        .unwrap_err();
        assert_eq!(err.field, "quantity");

        let err = Signal::parse(&json!({
            "symbol": "BTCUSD",
            "action": "buy",
            "quantity_type": "cash",
            "quantity": "10",
            "close": -1
        }))
        .unwrap_err();
        assert_eq!(err.field, "close");
    }

    #[test]
    fn test_unknown_literals_rejected() {
        let base = json!({
            "symbol": "BTCUSD",
            "action": "hold",
            "quantity_type": "cash",
            "quantity": "1",
            "close": "1"
        });
        assert_eq!(Signal::parse(&base).unwrap_err().field, "action");

        let mut bad_type = base.clone();
        bad_type["action"] = json!("buy");
        bad_type["quantity_type"] = json!("lots");
        assert_eq!(Signal::parse(&bad_type).unwrap_err().field, "quantity_type");
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = Signal::parse(&json!({
            "symbol": 42,
            "action": "buy",
            "quantity_type": "cash",
            "quantity": "1",
            "close": "1"
        }))
        .unwrap_err();
        assert_eq!(err.field, "symbol");

        let err = Signal::parse(&json!({
            "symbol": "BTCUSD",
            "action": "buy",
            "quantity_type": "cash",
            "quantity": "abc",
            "close": "1"
        }))
        .unwrap_err();
        assert_eq!(err.field, "quantity");

        assert_eq!(Signal::parse(&json!([1, 2])).unwrap_err().field, "payload");
    }

    #[test]
    fn test_underivable_symbol_is_symbol_error() {
        let err = Signal::parse(&json!({
            "symbol": "NOTAPAIR",
            "action": "buy",
            "quantity_type": "cash",
            "quantity": "1",
            "close": "1"
        }))
        .unwrap_err();
        assert_eq!(err.field, "symbol");
    }
}

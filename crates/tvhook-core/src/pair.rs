//! Exchange trading pair derived from a charting symbol.
//!
//! Signals carry symbols the way charting tools print them (`BTCUSD`,
//! `COINBASE:ETHUSDC`, `SOL/USD`); the exchange wants `BASE-QUOTE`.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Quote currencies recognised when a symbol has no separator.
/// Longer codes first so `USDC` wins over `USD`.
const KNOWN_QUOTES: &[&str] = &[
    "USDC", "USDT", "PYUSD", "EURC", "USD", "EUR", "GBP", "BTC", "ETH", "DAI", "SOL",
];

/// A base/quote pair such as `BTC-USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradingPair {
    base: String,
    quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_ascii_uppercase(),
            quote: quote.into().to_ascii_uppercase(),
        }
    }

    /// Derive the pair from a charting symbol.
    ///
    /// Accepts an optional `EXCHANGE:` prefix, explicit `-` or `/`
    /// separators, and bare concatenations ending in a known quote code.
    pub fn from_symbol(symbol: &str) -> Result<Self, CoreError> {
        let trimmed = symbol.trim();
        let bare = trimmed
            .rsplit_once(':')
            .map(|(_, s)| s)
            .unwrap_or(trimmed)
            .to_ascii_uppercase();

        if let Some((base, quote)) = bare.split_once(['-', '/']) {
            if is_code(base) && is_code(quote) {
                return Ok(Self::new(base, quote));
            }
            return Err(CoreError::InvalidSymbol(symbol.to_string()));
        }

        KNOWN_QUOTES
            .iter()
            .filter_map(|quote| {
                bare.strip_suffix(quote)
                    .filter(|base| is_code(base))
                    .map(|base| Self::new(base, *quote))
            })
            .next()
            .ok_or_else(|| CoreError::InvalidSymbol(symbol.to_string()))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Exchange product identifier (`BASE-QUOTE`).
    pub fn product_id(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

fn is_code(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for TradingPair {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}

impl Serialize for TradingPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

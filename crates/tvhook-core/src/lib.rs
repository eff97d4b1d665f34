//! Core domain types for the tvhook signal bridge.
//!
//! This crate provides the types shared by every stage of the pipeline:
//! - `Signal`: validated inbound trading signal
//! - `TradingPair`: exchange product derived from a charting symbol
//! - `Price`, `Size`: precision-safe numeric types with truncating quantization
//! - `OrderRequest`, `OrderOutcome`: what gets submitted and what came back

pub mod decimal;
pub mod error;
pub mod order;
pub mod outcome;
pub mod pair;
pub mod signal;

pub use decimal::{quantize_down, to_wire_string, Price, Size};
pub use error::{CoreError, ValidationError};
pub use order::{ClientOrderId, OrderRequest, OrderSide, SizeKind, TimeInForce};
pub use outcome::OrderOutcome;
pub use pair::TradingPair;
pub use signal::{QuantityType, Signal};

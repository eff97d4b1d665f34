//! Observability for the tvhook signal bridge.
//!
//! - Prometheus counters for signals, gate rejections, orders
//! - Structured logging via `tracing-subscriber`
//! - Telegram notifications summarising each processed signal

pub mod error;
pub mod logging;
pub mod metrics;
pub mod notify;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use notify::{
    execution_message, rejection_message, truncate_message, TelegramConfig, TelegramNotifier,
    MAX_TELEGRAM_MESSAGE,
};

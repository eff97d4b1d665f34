//! tvhook webhook host.
//!
//! Receives alert webhooks over HTTP and hands them to the signal pipeline.
//!
//! ## Routes
//!
//! - `POST {server.webhook_route}` (default `/api/arbWebhook`)
//! - `GET /health`
//! - `GET /metrics` (when `telemetry.metrics_enabled`)
//!
//! ## Status codes
//!
//! | outcome | status |
//! |---|---|
//! | order placed / dry run | 200 |
//! | bad JSON, invalid signal | 400 |
//! | gate rejection | 403 |
//! | sizing rejected | 422 |
//! | precision or exchange failure | 502 |
//! | credential failure | 500 |

pub mod app;
pub mod config;
pub mod error;
pub mod server;

pub use app::Application;
pub use config::{AppConfig, ExchangeConfig, ServerConfig, TelemetryConfig, ENV_PREFIX};
pub use error::{AppError, AppResult};
pub use server::{create_router, inbound_request, AppState};

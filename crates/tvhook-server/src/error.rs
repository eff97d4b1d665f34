//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(#[from] tvhook_exchange::CredentialError),

    #[error("Transport error: {0}")]
    Transport(#[from] tvhook_exchange::TransportError),

    #[error("Gate configuration error: {0}")]
    Gate(#[from] tvhook_gate::GateError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tvhook_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

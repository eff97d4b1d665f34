//! Exchange error types.

use thiserror::Error;

/// Credential loading or token signing failed. Never retried.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("Environment variable '{0}' is not set")]
    EnvVarNotSet(String),

    #[error("Invalid JSON in '{source_name}': {reason}")]
    InvalidJson { source_name: String, reason: String },

    #[error("Missing required credential fields: {0}")]
    MissingFields(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Failed to read credentials from '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Invalid token policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

pub type AuthResult<T> = Result<T, CredentialError>;

/// The request never produced an HTTP response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Product increments could not be resolved.
#[derive(Debug, Clone, Error)]
pub enum PrecisionError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Precision unavailable for {pair}: {reason}")]
    Unavailable { pair: String, reason: String },
}

pub type PrecisionResult<T> = Result<T, PrecisionError>;

/// General exchange call failure (connectivity probe).
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

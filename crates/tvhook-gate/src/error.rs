//! Gate error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Invalid allow-list entry: {0}")]
    InvalidOrigin(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),
}

pub type GateResult<T> = Result<T, GateError>;

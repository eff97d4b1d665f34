//! Error types for tvhook-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// A signal field failed validation.
///
/// `field` names the offending field; when several required fields are
/// absent it lists all of them, comma separated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(fields: &[&str]) -> Self {
        Self::new(fields.join(", "), "missing required field")
    }
}

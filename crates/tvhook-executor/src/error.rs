//! Pipeline error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tvhook_core::{QuantityType, ValidationError};
use tvhook_exchange::CredentialError;
use tvhook_gate::GateReason;

use crate::pipeline::Execution;

/// Order construction refused the signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{field} {value} truncates to zero at increment {increment}")]
    SizeBelowIncrement {
        field: &'static str,
        value: Decimal,
        increment: Decimal,
    },

    #[error("{field} {value} is out of range for order sizing")]
    SizeOutOfRange { field: &'static str, value: Decimal },

    #[error("quantity type '{0}' is not supported for order sizing")]
    UnsupportedSizing(QuantityType),
}

/// Terminal failure of one signal. Every variant is returned to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Request rejected by security gate: {0}")]
    RejectedByGate(GateReason),

    #[error("Invalid signal: {0}")]
    InvalidSignal(#[from] ValidationError),

    #[error("Credential error: {0}")]
    CredentialError(#[from] CredentialError),

    #[error("Precision unavailable: {0}")]
    PrecisionUnavailable(String),

    #[error("Size below increment: {0}")]
    SizeBelowIncrement(BuildError),

    #[error("Size out of range: {0}")]
    SizeOutOfRange(BuildError),

    #[error("Unsupported sizing: {0}")]
    UnsupportedSizing(BuildError),

    #[error("Order submission failed: {}", .0.outcome.error_detail.as_deref().unwrap_or("unknown error"))]
    SubmissionError(Box<Execution>),
}

impl PipelineError {
    /// Short stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RejectedByGate(_) => "rejected_by_gate",
            Self::InvalidSignal(_) => "invalid_signal",
            Self::CredentialError(_) => "credential_error",
            Self::PrecisionUnavailable(_) => "precision_unavailable",
            Self::SizeBelowIncrement(_) => "size_below_increment",
            Self::SizeOutOfRange(_) => "size_out_of_range",
            Self::UnsupportedSizing(_) => "unsupported_sizing",
            Self::SubmissionError(_) => "submission_error",
        }
    }
}

impl From<BuildError> for PipelineError {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::SizeBelowIncrement { .. } => Self::SizeBelowIncrement(e),
            BuildError::SizeOutOfRange { .. } => Self::SizeOutOfRange(e),
            BuildError::UnsupportedSizing(_) => Self::UnsupportedSizing(e),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

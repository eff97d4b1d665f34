//! Signal-to-order pipeline.
//!
//! # Stages (in `SignalPipeline::process`)
//!
//! 1. SecurityGate      -> RejectedByGate
//! 2. Signal::parse     -> InvalidSignal
//! 3. PrecisionResolver -> PrecisionUnavailable / CredentialError
//! 4. OrderBuilder      -> SizeBelowIncrement / SizeOutOfRange / UnsupportedSizing
//! 5. OrderSubmitter    -> SubmissionError / CredentialError
//!
//! Each stage runs only if the previous one succeeded.

pub mod builder;
pub mod error;
pub mod pipeline;
pub mod submitter;

pub use builder::OrderBuilder;
pub use error::{BuildError, PipelineError, PipelineResult};
pub use pipeline::{Execution, SignalPipeline};
pub use submitter::{is_precision_rejection, order_body, OrderSubmitter, ORDERS_PATH};

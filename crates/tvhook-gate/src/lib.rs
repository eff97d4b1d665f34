//! Security gate for inbound webhook requests.
//!
//! Composes independent admission checks into a single decision, evaluated
//! in order with short-circuit:
//! - Origin: source address on the allow-list
//! - Identity: transport peer certificate subject matches
//! - Secret: shared webhook password presented
//! - ContentType: body declared as JSON
//! - Mode: dry-run tag (never rejects)
//!
//! Every check is disabled by default.

pub mod config;
pub mod error;
pub mod gates;
pub mod request;

pub use config::SecurityConfig;
pub use error::{GateError, GateResult};
pub use gates::{CheckResult, GateReason, SecurityDecision, SecurityGate};
pub use request::{parse_subject, InboundRequest};

//! End-to-end processing of one inbound signal.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use tvhook_core::{OrderOutcome, OrderRequest, Signal, ValidationError};
use tvhook_exchange::{PrecisionError, PrecisionResolver};
use tvhook_gate::{InboundRequest, SecurityGate};
use tvhook_telemetry::Metrics;

use crate::builder::OrderBuilder;
use crate::error::{PipelineError, PipelineResult};
use crate::submitter::{is_precision_rejection, OrderSubmitter};

/// A signal that reached the submitter, with what came back.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    pub signal: Signal,
    pub order: OrderRequest,
    pub outcome: OrderOutcome,
}

/// Gate -> validate -> resolve -> build -> submit.
///
/// Shared across request tasks; all mutable state lives in the resolver
/// and authenticator caches.
pub struct SignalPipeline {
    gate: SecurityGate,
    resolver: Arc<PrecisionResolver>,
    submitter: OrderSubmitter,
}

impl SignalPipeline {
    pub fn new(gate: SecurityGate, resolver: Arc<PrecisionResolver>, submitter: OrderSubmitter) -> Self {
        Self {
            gate,
            resolver,
            submitter,
        }
    }

    pub fn resolver(&self) -> &Arc<PrecisionResolver> {
        &self.resolver
    }

    /// Process one request. The gate runs before the body is even parsed.
    pub async fn process(&self, request: &InboundRequest, body: &[u8]) -> PipelineResult<Execution> {
        Metrics::signal_received();

        let decision = self.gate.admit(request);
        if !decision.admitted {
            Metrics::gate_rejected(decision.reason.as_str());
            warn!(reason = %decision.reason, source = ?request.source_addr, "Request rejected by gate");
            return Err(PipelineError::RejectedByGate(decision.reason));
        }

        let result = self.execute(body, decision.dry_run).await;
        if let Err(e) = &result {
            Metrics::pipeline_error(e.kind());
            match e {
                PipelineError::CredentialError(_) => error!(error = %e, "Signal failed"),
                _ => warn!(kind = e.kind(), error = %e, "Signal failed"),
            }
        }
        result
    }

    async fn execute(&self, body: &[u8], dry_run: bool) -> PipelineResult<Execution> {
        let signal = serde_json::from_slice::<Value>(body)
            .map_err(|e| ValidationError::new("payload", format!("invalid JSON: {e}")))
            .and_then(|raw| Signal::parse(&raw))
            .map_err(|e| {
                Metrics::validation_failed(&e.field);
                e
            })?;
        info!(%signal, dry_run, "Signal accepted");

        let precision = self
            .resolver
            .resolve(&signal.pair)
            .await
            .map_err(|e| match e {
                PrecisionError::Credential(c) => PipelineError::CredentialError(c),
                other => PipelineError::PrecisionUnavailable(other.to_string()),
            })?;

        let order = OrderBuilder::build(&signal, &precision)?;
        debug!(
            %order,
            unquantized = ?OrderBuilder::unquantized_size(&signal),
            "Order built"
        );

        let outcome = self.submitter.submit(&order, dry_run).await?;
        if !outcome.success {
            if is_precision_rejection(&outcome) {
                self.resolver.invalidate(&signal.pair);
            }
            return Err(PipelineError::SubmissionError(Box::new(Execution {
                signal,
                order,
                outcome,
            })));
        }

        Ok(Execution {
            signal,
            order,
            outcome,
        })
    }
}

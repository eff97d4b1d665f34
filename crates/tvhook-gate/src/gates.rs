//! Admission checks.
//!
//! # Evaluation Order
//! 1. origin - source address allow-list
//! 2. identity - peer certificate subject
//! 3. secret - shared webhook password
//! 4. content_type - JSON body declared
//! 5. mode - dry-run tag, never a rejection
//!
//! The first blocking check decides; later checks are not evaluated.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::SecurityConfig;
use crate::error::{GateError, GateResult};
use crate::request::{parse_subject, InboundRequest};

/// Why a request was admitted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    Admitted,
    OriginNotAllowed,
    OriginUnknown,
    IdentityMismatch,
    IdentityMissing,
    SecretMismatch,
    UnsupportedContentType,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::OriginNotAllowed => "origin_not_allowed",
            Self::OriginUnknown => "origin_unknown",
            Self::IdentityMismatch => "identity_mismatch",
            Self::IdentityMissing => "identity_missing",
            Self::SecretMismatch => "secret_mismatch",
            Self::UnsupportedContentType => "unsupported_content_type",
        }
    }
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Pass,
    Block(GateReason),
}

/// Decision for one request. Produced once, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecurityDecision {
    pub admitted: bool,
    pub reason: GateReason,
    /// Set when the operating mode forces dry run.
    pub dry_run: bool,
}

impl SecurityDecision {
    fn reject(reason: GateReason) -> Self {
        Self {
            admitted: false,
            reason,
            dry_run: false,
        }
    }
}

/// Security gate.
///
/// Built once from configuration; `admit` is pure and safe to call
/// concurrently.
#[derive(Debug, Clone)]
pub struct SecurityGate {
    config: SecurityConfig,
    allowed_origins: HashSet<IpAddr>,
    expected_identity: Vec<(String, String)>,
}

impl SecurityGate {
    /// Create a gate, validating the allow-list and identity up front.
    pub fn new(config: SecurityConfig) -> GateResult<Self> {
        let allowed_origins = config
            .allowed_origins
            .iter()
            .map(|s| {
                s.trim()
                    .parse::<IpAddr>()
                    .map_err(|_| GateError::InvalidOrigin(s.clone()))
            })
            .collect::<GateResult<HashSet<_>>>()?;

        let expected_identity = parse_subject(&config.expected_identity);
        if config.enforce_peer_identity && expected_identity.is_empty() {
            return Err(GateError::InvalidIdentity(
                "peer identity enforced but no expected identity configured".to_string(),
            ));
        }

        Ok(Self {
            config,
            allowed_origins,
            expected_identity,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Run all checks in order and decide.
    pub fn admit(&self, request: &InboundRequest) -> SecurityDecision {
        let checks: [(&str, fn(&Self, &InboundRequest) -> CheckResult); 4] = [
            ("origin", Self::check_origin),
            ("identity", Self::check_identity),
            ("secret", Self::check_secret),
            ("content_type", Self::check_content_type),
        ];
        for (gate, check) in checks {
            if let CheckResult::Block(reason) = check(self, request) {
                debug!(gate, %reason, source = ?request.source_addr, "request rejected");
                return SecurityDecision::reject(reason);
            }
            trace!(gate, "check passed");
        }

        SecurityDecision {
            admitted: true,
            reason: GateReason::Admitted,
            dry_run: self.config.dry_run,
        }
    }

    pub fn check_origin(&self, request: &InboundRequest) -> CheckResult {
        if !self.config.enforce_origin_allowlist {
            return CheckResult::Pass;
        }
        match request.source_addr {
            None => CheckResult::Block(GateReason::OriginUnknown),
            Some(addr) if self.allowed_origins.contains(&canonical(addr)) => CheckResult::Pass,
            Some(_) => CheckResult::Block(GateReason::OriginNotAllowed),
        }
    }

    pub fn check_identity(&self, request: &InboundRequest) -> CheckResult {
        if !self.config.enforce_peer_identity {
            return CheckResult::Pass;
        }
        match request.peer_subject.as_deref() {
            None => CheckResult::Block(GateReason::IdentityMissing),
            Some(subject) if subject.trim().is_empty() => {
                CheckResult::Block(GateReason::IdentityMissing)
            }
            Some(subject) if parse_subject(subject) == self.expected_identity => CheckResult::Pass,
            Some(_) => CheckResult::Block(GateReason::IdentityMismatch),
        }
    }

    pub fn check_secret(&self, request: &InboundRequest) -> CheckResult {
        let expected = match self.config.webhook_password.as_deref() {
            Some(pw) if !pw.is_empty() => pw,
            _ => return CheckResult::Pass,
        };

        let presented = request
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .or_else(|| request.header("x-webhook-password"))
            .or_else(|| request.query("password"));

        match presented {
            Some(pw) if constant_time_eq(pw.as_bytes(), expected.as_bytes()) => CheckResult::Pass,
            _ => CheckResult::Block(GateReason::SecretMismatch),
        }
    }

    pub fn check_content_type(&self, request: &InboundRequest) -> CheckResult {
        if !self.config.enforce_content_type {
            return CheckResult::Pass;
        }
        let is_json = request
            .header("content-type")
            .and_then(|v| v.split(';').next())
            .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false);
        if is_json {
            CheckResult::Pass
        } else {
            CheckResult::Block(GateReason::UnsupportedContentType)
        }
    }
}

/// Map IPv4-mapped IPv6 addresses back to IPv4 so `::ffff:1.2.3.4`
/// matches an allow-list entry of `1.2.3.4`.
fn canonical(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

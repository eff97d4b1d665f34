//! Gate configuration.

use serde::{Deserialize, Serialize};

/// Security gate configuration.
///
/// Every check is off unless switched on, so an empty `[security]` section
/// admits all requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Reject requests whose source address is not in `allowed_origins`.
    #[serde(default)]
    pub enforce_origin_allowlist: bool,
    /// IPv4/IPv6 addresses allowed when the allow-list is enforced.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Require the peer certificate subject to match `expected_identity`.
    #[serde(default)]
    pub enforce_peer_identity: bool,
    /// Expected subject, written as `C=US, ST=Ohio, O=Example`.
    #[serde(default)]
    pub expected_identity: String,
    /// Shared secret the caller must present. Unset disables the check.
    #[serde(default)]
    pub webhook_password: Option<String>,
    /// Require `Content-Type: application/json`.
    #[serde(default)]
    pub enforce_content_type: bool,
    /// Admit and tag every request as dry run; no orders are placed.
    #[serde(default)]
    pub dry_run: bool,
}

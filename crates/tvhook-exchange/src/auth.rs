//! Pluggable request authentication.
//!
//! Each exchange signs outbound calls its own way; callers only see
//! `SignedHeaders`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{AuthResult, CredentialError};

/// Upper bound the exchange accepts for a token's validity window.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(120);

/// Default remaining validity below which a cached token is not handed out.
pub const DEFAULT_TOKEN_MARGIN: Duration = Duration::from_secs(10);

/// Headers to attach to one authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    authorization: String,
}

impl SignedHeaders {
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: format!("Bearer {token}"),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }
}

impl fmt::Debug for SignedHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedHeaders")
            .field("authorization", &"[REDACTED]")
            .finish()
    }
}

/// A short-lived signed credential.
#[derive(Clone)]
pub struct SignedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SignedToken {
    /// Validity left at `now`; zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the token may still be handed out at `now`.
    pub fn is_reusable(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.remaining(now) > margin
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedToken")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token lifetime and reuse margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    lifetime: Duration,
    margin: Duration,
}

impl TokenPolicy {
    /// Lifetimes above the exchange maximum are clamped.
    pub fn new(lifetime: Duration, margin: Duration) -> AuthResult<Self> {
        let lifetime = if lifetime > MAX_TOKEN_LIFETIME {
            warn!(
                requested_secs = lifetime.as_secs(),
                max_secs = MAX_TOKEN_LIFETIME.as_secs(),
                "Token lifetime clamped"
            );
            MAX_TOKEN_LIFETIME
        } else {
            lifetime
        };
        if lifetime.as_secs() == 0 {
            return Err(CredentialError::InvalidPolicy(
                "lifetime must be at least one second".to_string(),
            ));
        }
        if margin >= lifetime {
            return Err(CredentialError::InvalidPolicy(format!(
                "margin {}s must be shorter than lifetime {}s",
                margin.as_secs(),
                lifetime.as_secs()
            )));
        }
        Ok(Self { lifetime, margin })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            lifetime: MAX_TOKEN_LIFETIME,
            margin: DEFAULT_TOKEN_MARGIN,
        }
    }
}

/// Signs outbound exchange requests.
///
/// Implementations own their credential and any token cache; `sign` is
/// called concurrently from request tasks.
pub trait ExchangeAuthenticator: Send + Sync {
    /// Exchange name for logs.
    fn exchange(&self) -> &'static str;

    /// Produce headers for `method` (e.g. `GET`) on `path`
    /// (e.g. `/api/v3/brokerage/orders`).
    fn sign(&self, method: &str, path: &str) -> AuthResult<SignedHeaders>;
}

/// Arc wrapper for authenticator trait objects.
pub type DynAuthenticator = Arc<dyn ExchangeAuthenticator>;

/// Mock authenticator for testing.
#[derive(Debug, Default)]
pub struct MockAuthenticator {
    signs: AtomicU64,
    fail: AtomicBool,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `sign` calls fail with a signing error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sign_count(&self) -> u64 {
        self.signs.load(Ordering::SeqCst)
    }
}

impl ExchangeAuthenticator for MockAuthenticator {
    fn exchange(&self) -> &'static str {
        "mock"
    }

    fn sign(&self, method: &str, path: &str) -> AuthResult<SignedHeaders> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CredentialError::Signing("mock signing failure".to_string()));
        }
        self.signs.fetch_add(1, Ordering::SeqCst);
        Ok(SignedHeaders::bearer(&format!("mock {method} {path}")))
    }
}

//! Per-pair price and size increments.
//!
//! Fetched once per pair from the product endpoint and cached for the
//! process lifetime. Concurrent misses for the same pair share one
//! in-flight fetch and all receive its result, failures included. A failed
//! fetch leaves the slot empty so the next caller retries.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{FutureExt, Shared};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use tvhook_core::TradingPair;
use tvhook_telemetry::Metrics;

use crate::auth::DynAuthenticator;
use crate::error::{PrecisionError, PrecisionResult};
use crate::transport::{BoxFuture, DynTransport, TransportRequest};

/// Product metadata endpoint; the pair is appended as the last segment.
pub const PRODUCTS_PATH: &str = "/api/v3/brokerage/products";

/// Smallest tradable steps for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrecisionSpec {
    /// Base-asset size step (e.g. 0.00000001 BTC).
    pub base_increment: Decimal,
    /// Quote-currency price/size step (e.g. 0.01 USD).
    pub quote_increment: Decimal,
}

impl PrecisionSpec {
    pub fn new(base_increment: Decimal, quote_increment: Decimal) -> Self {
        Self {
            base_increment,
            quote_increment,
        }
    }

    /// Parse a product response body. Both increments must be positive.
    pub fn from_product(body: &Value) -> Result<Self, String> {
        let field = |name: &str| -> Result<Decimal, String> {
            let raw = body
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| format!("missing {name}"))?;
            let value = Decimal::from_str(raw).map_err(|e| format!("invalid {name} '{raw}': {e}"))?;
            if value <= Decimal::ZERO {
                return Err(format!("{name} must be positive, got {raw}"));
            }
            Ok(value)
        };
        Ok(Self::new(field("base_increment")?, field("quote_increment")?))
    }
}

type InFlight = Shared<BoxFuture<'static, PrecisionResult<PrecisionSpec>>>;

enum Slot {
    Ready(PrecisionSpec),
    /// `id` tells a settling waiter whether the slot still holds its fetch.
    Pending { id: u64, fetch: InFlight },
}

/// Cache of `PrecisionSpec` by pair.
pub struct PrecisionResolver {
    auth: DynAuthenticator,
    transport: DynTransport,
    cache: DashMap<TradingPair, Slot>,
    next_fetch_id: AtomicU64,
}

impl PrecisionResolver {
    pub fn new(auth: DynAuthenticator, transport: DynTransport) -> Self {
        Self {
            auth,
            transport,
            cache: DashMap::new(),
            next_fetch_id: AtomicU64::new(0),
        }
    }

    /// Increments for `pair`, fetching on first use.
    pub async fn resolve(&self, pair: &TradingPair) -> PrecisionResult<PrecisionSpec> {
        // The map guard is released before the await.
        let (id, fetch) = match self.cache.entry(pair.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(spec) => return Ok(*spec),
                Slot::Pending { id, fetch } => (*id, fetch.clone()),
            },
            Entry::Vacant(entry) => {
                let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let fetch: BoxFuture<'static, _> = Box::pin(fetch_precision(
                    Arc::clone(&self.auth),
                    Arc::clone(&self.transport),
                    pair.clone(),
                ));
                let fetch = fetch.shared();
                entry.insert(Slot::Pending {
                    id,
                    fetch: fetch.clone(),
                });
                (id, fetch)
            }
        };

        let result = fetch.await;
        self.settle(pair, id, &result);
        result
    }

    /// Replace this fetch's pending slot with its outcome. A slot that was
    /// invalidated or refilled meanwhile is left alone.
    fn settle(&self, pair: &TradingPair, id: u64, result: &PrecisionResult<PrecisionSpec>) {
        let is_this_fetch =
            |slot: &Slot| matches!(slot, Slot::Pending { id: current, .. } if *current == id);
        match result {
            Ok(spec) => {
                if let Some(mut slot) = self.cache.get_mut(pair) {
                    if is_this_fetch(slot.value()) {
                        *slot = Slot::Ready(*spec);
                    }
                }
            }
            Err(_) => {
                self.cache.remove_if(pair, |_, slot| is_this_fetch(slot));
            }
        }
    }

    /// Drop the cached entry so the next `resolve` refetches.
    pub fn invalidate(&self, pair: &TradingPair) -> bool {
        let removed = self.cache.remove(pair).is_some();
        if removed {
            info!(%pair, "Precision cache entry invalidated");
        }
        removed
    }

    /// Cached increments, if already resolved.
    pub fn cached(&self, pair: &TradingPair) -> Option<PrecisionSpec> {
        self.cache.get(pair).and_then(|slot| match *slot {
            Slot::Ready(spec) => Some(spec),
            Slot::Pending { .. } => None,
        })
    }
}

async fn fetch_precision(
    auth: DynAuthenticator,
    transport: DynTransport,
    pair: TradingPair,
) -> PrecisionResult<PrecisionSpec> {
    let path = format!("{PRODUCTS_PATH}/{}", pair.product_id());
    let headers = auth.sign("GET", &path)?;

    let unavailable = |reason: String| {
        Metrics::precision_fetched(false);
        warn!(%pair, %reason, "Precision fetch failed");
        PrecisionError::Unavailable {
            pair: pair.to_string(),
            reason,
        }
    };

    let response = transport
        .execute(TransportRequest::get(path, headers))
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    if !response.is_success() {
        return Err(unavailable(format!(
            "HTTP {}: {}",
            response.status, response.body
        )));
    }

    let spec = PrecisionSpec::from_product(&response.body).map_err(unavailable)?;
    Metrics::precision_fetched(true);
    debug!(
        %pair,
        base_increment = %spec.base_increment,
        quote_increment = %spec.quote_increment,
        "Precision resolved"
    );
    Ok(spec)
}

//! Startup connectivity check.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::info;

use crate::auth::ExchangeAuthenticator;
use crate::error::{ExchangeError, ExchangeResult};
use crate::transport::{ExchangeTransport, TransportRequest};

/// Accounts listing used to prove credentials and connectivity.
pub const ACCOUNTS_PATH: &str = "/api/v3/brokerage/accounts";

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    currency: String,
    available_balance: Balance,
}

#[derive(Debug, Deserialize)]
struct Balance {
    value: String,
    currency: String,
}

/// List available balances as `currency -> "<value> <currency>"`.
///
/// An empty map means the call succeeded but the key sees no accounts.
pub async fn verify_connection(
    auth: &dyn ExchangeAuthenticator,
    transport: &dyn ExchangeTransport,
) -> ExchangeResult<BTreeMap<String, String>> {
    let headers = auth.sign("GET", ACCOUNTS_PATH)?;
    let response = transport
        .execute(TransportRequest::get(ACCOUNTS_PATH, headers))
        .await?;

    if !response.is_success() {
        return Err(ExchangeError::Http {
            status: response.status,
            body: response.body.to_string(),
        });
    }

    let parsed: AccountsResponse = serde_json::from_value(response.body)
        .map_err(|e| ExchangeError::Decode(format!("accounts response: {e}")))?;

    let balances: BTreeMap<String, String> = parsed
        .accounts
        .into_iter()
        .map(|a| {
            let formatted = format!("{} {}", a.available_balance.value, a.available_balance.currency);
            (a.currency, formatted)
        })
        .collect();

    info!(
        exchange = auth.exchange(),
        accounts = balances.len(),
        "Exchange connectivity verified"
    );
    Ok(balances)
}

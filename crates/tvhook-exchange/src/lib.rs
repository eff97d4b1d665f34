//! Exchange connectivity for the tvhook signal bridge.
//!
//! - `ExchangeAuthenticator`: per-exchange request signing (Coinbase JWT/ES256)
//! - `ExchangeTransport`: HTTP plumbing, swappable for `MockTransport` in tests
//! - `PrecisionResolver`: cached per-pair size/price increments
//! - `verify_connection`: startup connectivity probe

pub mod auth;
pub mod clock;
pub mod coinbase;
pub mod credentials;
pub mod error;
pub mod precision;
pub mod probe;
pub mod transport;

pub use auth::{
    DynAuthenticator, ExchangeAuthenticator, MockAuthenticator, SignedHeaders, SignedToken,
    TokenPolicy,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coinbase::{CoinbaseAuthenticator, COINBASE_API_BASE};
pub use credentials::{CoinbaseCredentials, CredentialSource};
pub use error::{
    AuthResult, CredentialError, ExchangeError, ExchangeResult, PrecisionError, PrecisionResult,
    TransportError, TransportResult,
};
pub use precision::{PrecisionResolver, PrecisionSpec, PRODUCTS_PATH};
pub use probe::{verify_connection, ACCOUNTS_PATH};
pub use transport::{
    BoxFuture, DynTransport, ExchangeTransport, HttpMethod, HttpTransport, MockTransport,
    TransportRequest, TransportResponse,
};

//! Application wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};
use tvhook_exchange::{
    verify_connection, CoinbaseAuthenticator, CoinbaseCredentials, DynAuthenticator, DynTransport,
    HttpTransport, PrecisionResolver,
};
use tvhook_executor::{OrderSubmitter, SignalPipeline};
use tvhook_gate::SecurityGate;
use tvhook_telemetry::TelegramNotifier;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::server::{create_router, AppState};

/// The webhook service with every collaborator built.
pub struct Application {
    config: AppConfig,
    auth: DynAuthenticator,
    transport: DynTransport,
    state: AppState,
}

impl Application {
    /// Build against the live exchange. Credentials are read once, here.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let source = config.exchange.credential_source();
        info!(source = %source, "Loading exchange credentials");
        let credentials = CoinbaseCredentials::load(&source)?;

        let auth: DynAuthenticator = Arc::new(CoinbaseAuthenticator::from_credentials(
            &credentials,
            &config.exchange.api_base,
            config.exchange.token_policy()?,
        )?);
        let transport: DynTransport = Arc::new(HttpTransport::new(
            config.exchange.api_base.clone(),
            config.exchange.http_timeout(),
        )?);

        Self::with_exchange(config, auth, transport)
    }

    /// Build around an existing authenticator and transport.
    pub fn with_exchange(
        config: AppConfig,
        auth: DynAuthenticator,
        transport: DynTransport,
    ) -> AppResult<Self> {
        let gate = SecurityGate::new(config.security.clone())?;
        if gate.is_dry_run() {
            warn!("DRY RUN mode: signals are validated but no orders are placed");
        }

        let resolver = Arc::new(PrecisionResolver::new(auth.clone(), transport.clone()));
        let submitter = OrderSubmitter::new(auth.clone(), transport.clone());
        let pipeline = Arc::new(SignalPipeline::new(gate, resolver, submitter));
        let notifier = Arc::new(TelegramNotifier::new(&config.notifications)?);

        let state = AppState::new(pipeline, notifier)
            .with_max_body_bytes(config.server.max_body_bytes);

        Ok(Self {
            config,
            auth,
            transport,
            state,
        })
    }

    pub fn router(&self) -> Router {
        create_router(
            self.state.clone(),
            &self.config.server.webhook_route,
            self.config.telemetry.metrics_enabled,
        )
    }

    /// Optional connectivity check. Failures are reported, never fatal.
    pub async fn run_preflight(&self) -> bool {
        if !self.config.exchange.verify_on_startup {
            info!("Startup connectivity check disabled");
            return true;
        }
        match verify_connection(self.auth.as_ref(), self.transport.as_ref()).await {
            Ok(balances) => {
                for (currency, balance) in &balances {
                    info!(%currency, %balance, "Available balance");
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "Exchange connectivity check failed; continuing");
                false
            }
        }
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        )
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address: {e}")))?;

        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            %addr,
            route = %self.config.server.webhook_route,
            "Webhook server listening"
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("Webhook server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tvhook_exchange::{HttpMethod, MockAuthenticator, MockTransport, ACCOUNTS_PATH};

    fn app(verify: bool, transport: Arc<MockTransport>) -> Application {
        let mut config = AppConfig::default();
        config.exchange.verify_on_startup = verify;
        Application::with_exchange(config, Arc::new(MockAuthenticator::new()), transport).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_success() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            HttpMethod::Get,
            ACCOUNTS_PATH,
            200,
            json!({"accounts": [{"currency": "USD", "available_balance": {"value": "10.5", "currency": "USD"}}]}),
        );
        assert!(app(true, transport.clone()).run_preflight().await);
        assert_eq!(transport.count(HttpMethod::Get, ACCOUNTS_PATH), 1);
    }

    #[tokio::test]
    async fn test_preflight_failure_is_not_fatal() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(HttpMethod::Get, ACCOUNTS_PATH, 401, json!({"error": "unauthorized"}));
        assert!(!app(true, transport).run_preflight().await);
    }

    #[tokio::test]
    async fn test_preflight_disabled() {
        let transport = Arc::new(MockTransport::new());
        assert!(app(false, transport.clone()).run_preflight().await);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_bad_allowlist_fails_construction() {
        let mut config = AppConfig::default();
        config.security.allowed_origins = vec!["not-an-ip".to_string()];
        let result = Application::with_exchange(
            config,
            Arc::new(MockAuthenticator::new()),
            Arc::new(MockTransport::new()),
        );
        assert!(matches!(result, Err(AppError::Gate(_))));
    }
}

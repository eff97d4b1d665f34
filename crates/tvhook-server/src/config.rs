//! Application configuration.
//!
//! Layering, lowest precedence first:
//!
//! 1. built-in defaults (`Default` impls below)
//! 2. TOML file (optional)
//! 3. `TVHOOK__SECTION__KEY` environment variables
//! 4. legacy variables (`DRY_RUN_MODE`, `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`)
//!    filling values the layers above left unset

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tvhook_exchange::{CoinbaseCredentials, CredentialSource, TokenPolicy, COINBASE_API_BASE};
use tvhook_gate::SecurityConfig;
use tvhook_telemetry::TelegramConfig;

use crate::error::{AppError, AppResult};

/// Prefix for environment overrides, e.g. `TVHOOK__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "TVHOOK";
const ENV_SEPARATOR: &str = "__";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the webhook is mounted on.
    #[serde(default = "default_webhook_route")]
    pub webhook_route: String,
    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_route() -> String {
    "/api/arbWebhook".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            webhook_route: default_webhook_route(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Exchange connectivity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variable holding the credential JSON.
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
    /// Credential file. Takes precedence over `credentials_env` when set.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// JWT lifetime (seconds). Capped at 120.
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
    /// A cached JWT is regenerated once fewer than this many seconds remain.
    #[serde(default = "default_token_margin_secs")]
    pub token_margin_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Check credentials against the accounts endpoint at startup.
    #[serde(default = "default_verify_on_startup")]
    pub verify_on_startup: bool,
}

fn default_api_base() -> String {
    COINBASE_API_BASE.to_string()
}

fn default_credentials_env() -> String {
    CoinbaseCredentials::DEFAULT_ENV_VAR.to_string()
}

fn default_token_lifetime_secs() -> u64 {
    120
}

fn default_token_margin_secs() -> u64 {
    10
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_verify_on_startup() -> bool {
    true
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            credentials_env: default_credentials_env(),
            credentials_file: None,
            token_lifetime_secs: default_token_lifetime_secs(),
            token_margin_secs: default_token_margin_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            verify_on_startup: default_verify_on_startup(),
        }
    }
}

impl ExchangeConfig {
    pub fn credential_source(&self) -> CredentialSource {
        match &self.credentials_file {
            Some(path) => CredentialSource::File { path: path.clone() },
            None => CredentialSource::EnvVar {
                var_name: self.credentials_env.clone(),
            },
        }
    }

    pub fn token_policy(&self) -> AppResult<TokenPolicy> {
        Ok(TokenPolicy::new(
            Duration::from_secs(self.token_lifetime_secs),
            Duration::from_secs(self.token_margin_secs),
        )?)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Telemetry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Expose `GET /metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub notifications: TelegramConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from an optional TOML file plus the process environment.
    pub fn load(path: &str) -> AppResult<Self> {
        let exists = std::path::Path::new(path).exists();
        if !exists {
            tracing::warn!(path, "Config file not found, using defaults and environment");
        }

        let mut config: Self = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("security.allowed_origins"),
            )
            .build()?
            .try_deserialize()?;

        config.apply_legacy_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill unset values from the variables older deployments used.
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DRY_RUN_MODE") {
            if is_truthy(&v) {
                self.security.dry_run = true;
            }
        }
        if self.notifications.bot_token.is_none() {
            self.notifications.bot_token = lookup("TELEGRAM_TOKEN").filter(|v| !v.is_empty());
        }
        if self.notifications.chat_id.is_none() {
            self.notifications.chat_id = lookup("TELEGRAM_CHAT_ID").filter(|v| !v.is_empty());
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.server.port == 0 {
            return Err(AppError::Config("server.port must be non-zero".to_string()));
        }
        if !self.server.webhook_route.starts_with('/') {
            return Err(AppError::Config(format!(
                "server.webhook_route must start with '/': {}",
                self.server.webhook_route
            )));
        }
        if matches!(self.server.webhook_route.as_str(), "/health" | "/metrics") {
            return Err(AppError::Config(format!(
                "server.webhook_route collides with a built-in route: {}",
                self.server.webhook_route
            )));
        }
        self.exchange.token_policy()?;
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

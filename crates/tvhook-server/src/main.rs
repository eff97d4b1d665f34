//! tvhook - alert webhook to exchange limit order bridge.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Alert webhook to exchange limit order bridge
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TVHOOK_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Skip the startup connectivity check
    #[arg(long)]
    skip_preflight: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tvhook_telemetry::init_logging()?;

    info!("Starting tvhook v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > TVHOOK_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("TVHOOK_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = tvhook_server::AppConfig::load(&config_path)?;
    info!(
        dry_run = config.security.dry_run,
        api_base = %config.exchange.api_base,
        "Configuration loaded"
    );

    let app = tvhook_server::Application::new(config)?;

    if !args.skip_preflight {
        app.run_preflight().await;
    }

    app.run().await?;

    Ok(())
}

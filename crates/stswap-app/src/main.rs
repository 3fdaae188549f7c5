//! stswap entry point: headless USDC to sTSLA swap client.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;
use zeroize::Zeroizing;

/// Headless USDC to sTSLA swap client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via STSWAP_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    stswap_app::init_logging()?;

    info!("Starting stswap v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.config {
        Some(path) => stswap_app::AppConfig::from_file(&path)?,
        None => stswap_app::AppConfig::load()?,
    };
    info!(rpc_url = %config.rpc_url, "Configuration loaded");

    let private_key = Zeroizing::new(
        std::env::var("STSWAP_PRIVATE_KEY").context("STSWAP_PRIVATE_KEY is not set")?,
    );
    let provider = stswap_chain::connect_http(
        &config.rpc_url,
        private_key.as_str(),
        Duration::from_millis(config.poll_interval_ms),
    )?;

    let app = stswap_app::Application::new(config, provider);
    app.run().await?;

    Ok(())
}

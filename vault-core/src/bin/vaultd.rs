//! Vault ledger daemon

use std::sync::Arc;
use vault_core::events::TracingSink;
use vault_core::{Config, Ledger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting VaultLedger daemon");

    // File config wins over environment when VAULT_CONFIG is set
    let config = match std::env::var("VAULT_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env()?,
    };

    let ledger = Ledger::open_with_sink(config, Arc::new(TracingSink)).await?;
    tracing::info!("Ledger opened successfully");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down vault ledger");
    ledger.shutdown().await?;
    Ok(())
}

use anyhow::{Context, Result};
use dotenv::dotenv;
use price_tracker_rust::TrackerConfig;
use pricewatch_core::{
    AssetCatalog, CoinGeckoClient, PriceTracker, Shutdown, SnapshotBuilder, StaticCatalog,
};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting price_tracker_rust...");

    let config = TrackerConfig::from_env().context("Invalid configuration")?;
    info!(
        currency = %config.currency,
        interval_secs = config.refresh_interval_secs,
        max_assets = config.max_assets,
        offline = config.offline,
        "Configuration loaded"
    );

    // Clients
    let client = Arc::new(
        CoinGeckoClient::new(config.coingecko_config())
            .context("Failed to build CoinGecko client")?,
    );
    let catalog: Arc<dyn AssetCatalog> = if config.offline {
        Arc::new(StaticCatalog::default())
    } else {
        client.clone()
    };

    let builder = SnapshotBuilder::new(client, config.currency.clone());
    let display = config.console_display(io::stdout(), true);
    let mut tracker = PriceTracker::new(
        catalog,
        builder,
        Box::new(display),
        config.tracker_settings()?,
    )?;

    // Shutdown on ctrl-c
    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received ctrl-c, shutting down");
                trigger.trigger();
            }
            Err(e) => warn!("Failed to listen for ctrl-c: {}", e),
        }
    });

    if let Err(e) = tracker.run(shutdown).await {
        error!("Price tracker failed: {}", e);
        return Err(e).context("Price tracker terminated");
    }

    Ok(())
}

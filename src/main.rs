use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{self, EnvFilter};

use cryptosight::config::AppConfig;
use cryptosight::data::coingecko::CoinGeckoClient;
use cryptosight::data::sqlite::SqliteStore;
use cryptosight::data::SampleStore;
use cryptosight::server::DashboardServer;
use cryptosight::tools;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    store.ensure_schema()?;

    // Fetch + dedupe every asset before the dashboard comes up.
    let source = CoinGeckoClient::new(&config).context("Failed to build HTTP client")?;
    let report = tools::sync::execute(store.as_ref(), &source, &config).await?;
    tracing::info!(
        inserted = report.inserted(),
        failed = report.failures(),
        "Startup sync complete"
    );

    let config = Arc::new(config);
    let app = DashboardServer::new(store, Arc::clone(&config)).router();

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("CryptoSight dashboard on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

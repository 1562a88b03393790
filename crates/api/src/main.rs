use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use pickup_api::app;
use pickup_api::config::Config;
use pickup_api::jobs::{DeactivatePastGamesJob, JobScheduler, PoolMetricsJob};
use pickup_api::middleware::{init_metrics, logging::init_logging};
use pickup_api::services::LocalAssetStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting Pickup API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let assets = LocalAssetStore::open(&config.assets).await?;
    info!(storage_dir = %config.assets.storage_dir, "Asset store ready");

    let mut scheduler = JobScheduler::new();
    if config.jobs.enabled {
        scheduler.register(PoolMetricsJob::new(pool.clone()));
        scheduler.register(DeactivatePastGamesJob::new(pool.clone()));
        scheduler.start();
    }

    let addr = config.socket_addr()?;
    let app = app::create_app(config, pool, Arc::new(assets));

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

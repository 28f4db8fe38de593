//! marks-sync - keeps a local bookmark store in sync with the remote API.

use futures::StreamExt;
use marks_client::{
    spawn_connectivity_probe, spawn_scheduler, Config, FileStore, HttpGateway, NetworkStatus,
    SyncCoordinator,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marks_client=debug,marks_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        "Starting marks-sync against {} (data in {})",
        config.api_url,
        config.data_dir.display()
    );

    let store = Arc::new(FileStore::open(&config.data_dir)?);
    let gateway = Arc::new(HttpGateway::from_config(&config)?);
    let status = Arc::new(NetworkStatus::new(gateway.ping().await));

    let coordinator = Arc::new(
        SyncCoordinator::open(store, gateway.clone(), status.clone())?
            .with_request_timeout(config.request_timeout),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let probe = spawn_connectivity_probe(
        gateway,
        status,
        config.health_interval,
        shutdown_rx.clone(),
    );
    let scheduler = spawn_scheduler(coordinator.clone(), config.sync_interval, shutdown_rx);

    let mut changes = coordinator.subscribe().into_stream().boxed();
    let reporter = tokio::spawn(async move {
        while let Some(collection) = changes.next().await {
            tracing::info!(bookmarks = collection.len(), "collection updated");
        }
    });

    coordinator.load().await?;
    coordinator.sync().await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    shutdown_tx.send(true).ok();
    scheduler.await.ok();
    probe.await.ok();
    reporter.abort();

    let state = coordinator.sync_state();
    if state.pending > 0 {
        tracing::warn!(pending = state.pending, "operations remain queued for the next run");
    }

    Ok(())
}

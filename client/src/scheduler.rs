//! Background triggers: periodic sync, reconnect sync, connectivity probe.

use crate::connectivity::NetworkStatus;
use crate::coordinator::SyncCoordinator;
use crate::gateway::HttpGateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Run `sync()` every `every` and whenever connectivity goes offline→online.
///
/// Stops when `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_scheduler(
    engine: Arc<SyncCoordinator>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut online = engine.connectivity().subscribe();
        let mut was_online = *online.borrow_and_update();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let synced = engine.sync().await;
                    debug!(synced, "periodic sync");
                }
                changed = online.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now_online = *online.borrow_and_update();
                    if now_online && !was_online {
                        info!("back online, syncing");
                        engine.sync().await;
                    }
                    was_online = now_online;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("scheduler stopped");
    })
}

/// Probe the API health endpoint every `every` and record the result.
pub fn spawn_connectivity_probe(
    gateway: Arc<HttpGateway>,
    status: Arc<NetworkStatus>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    status.set_online(gateway.ping().await);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("connectivity probe stopped");
    })
}

//! Connectivity capability injected into the coordinator.

use tokio::sync::watch;

/// Reports whether the environment is online and announces transitions.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;

    /// Watch for online/offline transitions.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// A settable connectivity flag.
///
/// The binary drives it from a health probe; tests flip it directly.
#[derive(Debug)]
pub struct NetworkStatus {
    tx: watch::Sender<bool>,
}

impl NetworkStatus {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Record the current state. Subscribers only wake on an actual change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Connectivity for NetworkStatus {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

//! # Marks Client
//!
//! Offline-first synchronization for a personal bookmark collection.
//!
//! Every mutation is applied locally first, recorded in a durable pending
//! log, and delivered to the remote API in order once connectivity allows.
//! Observers always see the server's last known state with the pending
//! operations replayed on top (see [`marks_engine::project`]).
//!
//! ## Wiring
//!
//! ```no_run
//! use marks_client::{HttpGateway, MemoryStore, NetworkStatus, SyncCoordinator};
//! use marks_engine::BookmarkDraft;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> marks_client::Result<()> {
//! let gateway = HttpGateway::new(
//!     "https://api.example.com",
//!     None,
//!     Duration::from_secs(10),
//!     Duration::from_secs(8),
//! )?;
//! let coordinator = SyncCoordinator::open(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(gateway),
//!     Arc::new(NetworkStatus::new(true)),
//! )?;
//!
//! coordinator.load().await?;
//! coordinator
//!     .create(BookmarkDraft::new("Rust", "https://rust-lang.org"))
//!     .await?;
//! coordinator.sync().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod import;
pub mod mirror;
pub mod notifier;
pub mod pending_log;
pub mod scheduler;
pub mod state;
pub mod storage;

pub use config::{Config, ConfigError};
pub use connectivity::{Connectivity, NetworkStatus};
pub use coordinator::{Delivery, MutationOutcome, SyncCoordinator, DEFAULT_REQUEST_TIMEOUT};
pub use error::{Error, Result};
pub use gateway::{HttpGateway, ListFilter, RemoteError, RemoteGateway};
pub use import::ImportReport;
pub use notifier::{ChangeNotifier, Subscription, SubscriptionId};
pub use scheduler::{spawn_connectivity_probe, spawn_scheduler};
pub use state::{SyncState, SyncStatus};
pub use storage::{FileStore, KvStore, MemoryStore, StorageError};

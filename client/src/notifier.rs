//! Change notifier.
//!
//! Tracks subscribers and fans the projected collection out to all of them
//! after every mutation or sync cycle.

use dashmap::DashMap;
use futures::stream::{self, Stream};
use marks_engine::Collection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifier handed out by [`ChangeNotifier::subscribe`].
pub type SubscriptionId = u64;

/// Sender half kept by the notifier.
type CollectionSender = mpsc::UnboundedSender<Arc<Collection>>;

/// A registered observer.
#[derive(Debug)]
pub struct Subscription {
    /// Pass to [`ChangeNotifier::unsubscribe`] to stop receiving.
    pub id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<Arc<Collection>>,
}

impl Subscription {
    /// Wait for the next published collection. `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<Arc<Collection>> {
        self.receiver.recv().await
    }

    /// Take the most recent already-published collection without waiting.
    pub fn latest(&mut self) -> Option<Arc<Collection>> {
        let mut latest = None;
        while let Ok(collection) = self.receiver.try_recv() {
            latest = Some(collection);
        }
        latest
    }

    /// Turn the subscription into a stream of collections.
    pub fn into_stream(self) -> impl Stream<Item = Arc<Collection>> {
        stream::unfold(self, |mut sub| async move {
            let next = sub.recv().await?;
            Some((next, sub))
        })
    }
}

/// Publish/subscribe fan-out of projected collections.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: DashMap<SubscriptionId, CollectionSender>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);

        tracing::debug!(subscription = id, "observer subscribed");

        Subscription { id, receiver: rx }
    }

    /// Remove an observer.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.subscribers.remove(&id).is_some() {
            tracing::debug!(subscription = id, "observer unsubscribed");
        }
    }

    /// Send a collection to every observer.
    ///
    /// Observers whose receiver was dropped are pruned. Returns the number
    /// of observers that received it.
    pub fn publish(&self, collection: Arc<Collection>) -> usize {
        let mut sent_count = 0;
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            if entry.value().send(collection.clone()).is_ok() {
                sent_count += 1;
            } else {
                closed.push(*entry.key());
            }
        }

        for id in closed {
            self.subscribers.remove(&id);
        }

        tracing::trace!(recipients = sent_count, size = collection.len(), "published collection");

        sent_count
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

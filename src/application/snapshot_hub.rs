// Snapshot hub - fans one poller's snapshots out to many consumers
use crate::domain::snapshot::TelemetrySnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::poller::SnapshotCallback;

const STREAM_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct HubInner {
    subscribers: RwLock<Vec<(SubscriptionId, SnapshotCallback)>>,
    latest: RwLock<Option<Arc<TelemetrySnapshot>>>,
    broadcaster: broadcast::Sender<Arc<TelemetrySnapshot>>,
    next_id: AtomicU64,
}

/// Shared poller callback with any number of registered consumers.
///
/// The hub remembers the last snapshot, hands it to new subscribers straight
/// away, and also re-broadcasts every snapshot to streaming receivers.
#[derive(Clone)]
pub struct SnapshotHub {
    inner: Arc<HubInner>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        let (broadcaster, _) = broadcast::channel(STREAM_CAPACITY);
        Self {
            inner: Arc::new(HubInner {
                subscribers: RwLock::new(Vec::new()),
                latest: RwLock::new(None),
                broadcaster,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register `on_snapshot` and replay the latest snapshot to it.
    ///
    /// Registration and replay happen under the subscriber lock, so a
    /// concurrent `publish` delivers its snapshot after the replay and never
    /// skips the new subscriber. The callback must not subscribe from within
    /// its own replay.
    pub fn subscribe<F>(&self, on_snapshot: F) -> SubscriptionId
    where
        F: Fn(Arc<TelemetrySnapshot>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: SnapshotCallback = Arc::new(on_snapshot);

        let mut subscribers = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.push((id, callback.clone()));
        if let Some(latest) = self.latest() {
            callback(latest);
        }
        info!("Added snapshot subscriber {:?} (total: {})", id, subscribers.len());
        id
    }

    #[cfg(test)]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn latest(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.inner
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receiver of every snapshot published from now on
    pub fn stream(&self) -> broadcast::Receiver<Arc<TelemetrySnapshot>> {
        self.inner.broadcaster.subscribe()
    }

    pub fn publish(&self, snapshot: Arc<TelemetrySnapshot>) {
        let (sequence, live) = (snapshot.sequence, snapshot.is_live());
        *self
            .inner
            .latest
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());

        // Callbacks run outside the lock so they may subscribe or unsubscribe
        let subscribers: Vec<SnapshotCallback> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in &subscribers {
            callback(snapshot.clone());
        }

        // No stream receivers is not an error
        let receivers = self.inner.broadcaster.send(snapshot).unwrap_or(0);
        debug!(
            sequence,
            live,
            "Fanned snapshot out to {} subscribers and {} stream receivers",
            subscribers.len(),
            receivers
        );
    }

    /// The hub as a poller callback
    pub fn publisher(&self) -> impl Fn(Arc<TelemetrySnapshot>) + Send + Sync + 'static {
        let hub = self.clone();
        move |snapshot: Arc<TelemetrySnapshot>| hub.publish(snapshot)
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new()
    }
}

//! Subscription broker: fan-out of "something changed" to parked waiters.
//!
//! Each subscriber owns a capacity-1 channel. The notifier only ever uses
//! `try_send`, so:
//! - a full channel means a wake-up is already pending (coalesced)
//! - a subscriber that never reads cannot block the notifier
//! - a dropped receiver is pruned on the next fan-out

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Unique subscriber handle. Never reused while the process runs.
pub type SubscriberId = u64;

#[derive(Default)]
struct Subscribers {
    /// Last id handed out; ids start at 1.
    last_id: SubscriberId,
    senders: FxHashMap<SubscriberId, Sender<()>>,
}

/// Process-wide set of waiting subscribers.
#[derive(Default)]
pub struct SubscriptionBroker {
    inner: Mutex<Subscribers>,
}

impl SubscriptionBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    #[cfg(test)]
    pub fn register(self: &Arc<Self>) -> Subscription {
        let mut inner = self.inner.lock();
        self.insert(&mut inner)
    }

    /// Register a new subscriber unless `already_changed` holds.
    ///
    /// The guard runs under the subscriber lock, so a notifier that publishes
    /// state before calling [`notify_all`](Self::notify_all) is ordered
    /// against it: either the guard sees the new state, or the notifier sees
    /// the new subscriber.
    pub fn register_unless(
        self: &Arc<Self>,
        already_changed: impl FnOnce() -> bool,
    ) -> Option<Subscription> {
        let mut inner = self.inner.lock();
        if already_changed() {
            return None;
        }
        Some(self.insert(&mut inner))
    }

    fn insert(self: &Arc<Self>, inner: &mut Subscribers) -> Subscription {
        inner.last_id += 1;
        let id = inner.last_id;
        let (tx, rx) = channel::bounded(1);
        inner.senders.insert(id, tx);

        crate::debug!("poll"; "subscriber {} registered", id);
        Subscription {
            id,
            rx,
            broker: Arc::clone(self),
        }
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored.
    pub fn deregister(&self, id: SubscriberId) {
        if self.inner.lock().senders.remove(&id).is_some() {
            crate::debug!("poll"; "subscriber {} deregistered", id);
        }
    }

    /// Wake every registered subscriber. Never blocks.
    ///
    /// Returns how many subscribers hold a pending wake-up afterwards.
    pub fn notify_all(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.senders.retain(|id, tx| match tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => {
                crate::debug!("poll"; "pruning abandoned subscriber {}", id);
                false
            }
        });
        inner.senders.len()
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.inner.lock().senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A registered interest in the next change.
///
/// Deregisters itself on drop, so every exit path of a wait cleans up.
pub struct Subscription {
    id: SubscriberId,
    rx: Receiver<()>,
    broker: Arc<SubscriptionBroker>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Channel that fires once per (coalesced) change.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broker.deregister(self.id);
    }
}

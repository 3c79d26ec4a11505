//! Ordered list of snapshot observers.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::snapshot::PlaybackSnapshot;
use crate::plugin::isolation::call_plugin_safely_value;

/// Observer callback
pub type ObserverFn = Arc<dyn Fn(&Arc<PlaybackSnapshot>) + Send + Sync>;

#[derive(Default)]
struct Slots {
    observers: RwLock<Vec<(u64, ObserverFn)>>,
    next_id: AtomicU64,
}

/// Observers in registration order
#[derive(Clone, Default)]
pub struct ObserverList {
    slots: Arc<Slots>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Arc<PlaybackSnapshot>) + Send + Sync + 'static,
    {
        let id = self.slots.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.observers.write().push((id, Arc::new(observer)));
        Subscription {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Call every observer with `snapshot`, in registration order.
    ///
    /// A panicking observer is logged and the remaining ones still run.
    pub fn notify(&self, snapshot: &Arc<PlaybackSnapshot>) {
        // Observers may register or unsubscribe while being notified
        let observers: Vec<(u64, ObserverFn)> = self.slots.observers.read().clone();

        for (id, observer) in observers {
            let snapshot = Arc::clone(snapshot);
            let result = call_plugin_safely_value(AssertUnwindSafe(move || observer(&snapshot)));
            if let Err(e) = result {
                tracing::warn!(observer_id = id, error = %e, "Song-info observer failed");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`ObserverList::register`].
///
/// Dropping it keeps the observer registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    slots: Weak<Slots>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the observer. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(slots) = self.slots.upgrade() else {
            return false;
        };
        let mut observers = slots.observers.write();
        let before = observers.len();
        observers.retain(|(id, _)| *id != self.id);
        observers.len() != before
    }
}

//! Timer-Driven Delivery
//!
//! [`SharedStore`] puts a [`Store`] behind a lock and fires its pending
//! deliveries from Tokio timers instead of explicit `flush` calls.
//!
//! # How It Works
//!
//! 1. Every operation runs through [`SharedStore::with`], under the lock.
//!    The wrapped store defers its observer hooks, and `with` runs them
//!    after the lock is released, so a hook may call back into the store.
//!
//! 2. When the operation returns, each subscription it (re)scheduled gets a
//!    timer task that sleeps for the debounce window. An older timer for the
//!    same subscription is aborted first, so only the last one fires.
//!
//! 3. When a timer fires it takes that subscription's delivery under the
//!    lock, computing membership at that moment, then releases the lock and
//!    runs the callback. Callbacks may therefore call back into the store.
//!
//! Without a Tokio runtime no timers are armed and deliveries stay queued
//! until [`SharedStore::flush`] is called.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{trace, warn};

use super::subscription::SubscriptionId;
use crate::graph::Store;

struct Shared {
    store: Mutex<Store>,
    timers: DashMap<SubscriptionId, AbortHandle>,
    debounce: Duration,
}

impl Shared {
    fn fire(&self, id: SubscriptionId) {
        // A newer timer may already own the slot.
        let current = tokio::task::try_id();
        self.timers
            .remove_if(&id, |_, timer| current == Some(timer.id()));
        let delivery = self.store.lock().take_delivery(id);
        if let Some(delivery) = delivery {
            trace!(?id, tag = %delivery.tag(), count = delivery.ids().len(), "delivering");
            delivery.deliver();
        }
    }
}

/// A store shared between tasks, with debounced timer delivery.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Shared>,
}

impl SharedStore {
    /// Wrap a store. The debounce window comes from its configuration.
    ///
    /// Deliveries already pending in `store` get their timers here.
    pub fn new(mut store: Store) -> Self {
        let debounce = store.config().debounce();
        store.set_defer_hooks(true);
        let rescheduled = store.notifier().take_rescheduled();
        let shared = Self {
            inner: Arc::new(Shared {
                store: Mutex::new(store),
                timers: DashMap::new(),
                debounce,
            }),
        };
        shared.arm(rescheduled);
        shared
    }

    /// Run `op` against the store, then run the observer hooks it raised
    /// and arm timers for what it scheduled.
    pub fn with<R, F>(&self, op: F) -> R
    where
        F: FnOnce(&mut Store) -> R,
    {
        let (result, hooks, rescheduled) = {
            let mut store = self.inner.store.lock();
            let result = op(&mut store);
            (
                result,
                store.take_hook_calls(),
                store.notifier().take_rescheduled(),
            )
        };
        self.arm(rescheduled);
        if !hooks.is_empty() {
            trace!(count = hooks.len(), "running observer hooks");
        }
        for hook in hooks {
            hook.run();
        }
        result
    }

    /// Run every pending delivery now, cancelling their timers.
    pub fn flush(&self) -> usize {
        let deliveries = self.inner.store.lock().take_deliveries();
        let count = deliveries.len();
        for delivery in deliveries {
            if let Some((_, timer)) = self.inner.timers.remove(&delivery.subscription()) {
                timer.abort();
            }
            delivery.deliver();
        }
        count
    }

    /// Number of armed timers.
    pub fn armed_timers(&self) -> usize {
        self.inner.timers.len()
    }

    fn arm(&self, rescheduled: Vec<SubscriptionId>) {
        if rescheduled.is_empty() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                count = rescheduled.len(),
                "no tokio runtime; deliveries stay pending until flush"
            );
            return;
        };

        for id in rescheduled {
            let shared = Arc::clone(&self.inner);
            let task = runtime.spawn(async move {
                tokio::time::sleep(shared.debounce).await;
                shared.fire(id);
            });
            if let Some(previous) = self.inner.timers.insert(id, task.abort_handle()) {
                previous.abort();
            }
        }
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("debounce", &self.inner.debounce)
            .field("armed_timers", &self.inner.timers.len())
            .finish()
    }
}

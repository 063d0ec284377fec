//! Tag Notifier
//!
//! The notifier keeps callback registrations per tag and the queue of
//! deliveries that are waiting to fire.
//!
//! # Debouncing
//!
//! `notify(tag)` does not call anything. It (re)schedules one pending
//! delivery for each subscription under the tag. Scheduling a subscription
//! that is already pending replaces the old entry, moving it to the back of
//! the queue, so a burst of mutations collapses into a single delivery.
//!
//! The membership list is not captured here. The store computes it when the
//! delivery is taken, so the callback always sees the state at fire time.
//!
//! # Locking
//!
//! The registry sits behind a `parking_lot::Mutex` shared with every
//! [`Subscription`] handle. The lock is never held while a callback runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use tracing::trace;

use super::subscription::{Callback, Subscription, SubscriptionId};
use crate::graph::{NodeId, Tag};

/// Registrations and pending deliveries.
#[derive(Default)]
pub(crate) struct Registry {
    /// Callbacks per tag. A tag with no callbacks has no entry.
    callbacks: HashMap<Tag, IndexMap<SubscriptionId, Callback>>,

    /// Subscriptions waiting to fire, in scheduling order.
    pending: IndexMap<SubscriptionId, Tag>,

    /// Subscriptions (re)scheduled since the last `take_rescheduled`.
    rescheduled: IndexSet<SubscriptionId>,
}

impl Registry {
    pub(crate) fn remove(&mut self, tag: &Tag, id: SubscriptionId) -> bool {
        let Some(callbacks) = self.callbacks.get_mut(tag) else {
            return false;
        };
        let removed = callbacks.shift_remove(&id).is_some();
        if callbacks.is_empty() {
            self.callbacks.remove(tag);
        }
        self.pending.shift_remove(&id);
        self.rescheduled.shift_remove(&id);
        if removed {
            trace!(%tag, ?id, "subscription removed");
        }
        removed
    }

    fn callback(&self, tag: &Tag, id: SubscriptionId) -> Option<Callback> {
        self.callbacks.get(tag)?.get(&id).cloned()
    }
}

/// Per-tag callback registry with debounced delivery.
pub struct Notifier {
    registry: Arc<Mutex<Registry>>,
}

impl Notifier {
    /// Create a notifier with no subscriptions.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Register a callback under `tag`.
    pub fn subscribe(&self, tag: Tag, callback: Callback) -> Subscription {
        let id = SubscriptionId::new();
        let mut registry = self.registry.lock();
        registry
            .callbacks
            .entry(tag.clone())
            .or_default()
            .insert(id, callback);
        trace!(%tag, ?id, "subscribed");
        Subscription::new(id, tag, &self.registry)
    }

    /// Remove a subscription by id. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock();
        let tag = registry
            .callbacks
            .iter()
            .find(|(_, callbacks)| callbacks.contains_key(&id))
            .map(|(tag, _)| tag.clone());
        match tag {
            Some(tag) => registry.remove(&tag, id),
            None => false,
        }
    }

    /// Schedule one delivery for every subscription under `tag`.
    ///
    /// A tag without subscribers is ignored.
    pub fn notify(&self, tag: &str) {
        let mut registry = self.registry.lock();
        let Some(callbacks) = registry.callbacks.get(tag) else {
            return;
        };
        let ids: Vec<SubscriptionId> = callbacks.keys().copied().collect();
        let tag = Tag::from(tag);
        for id in ids {
            registry.pending.shift_remove(&id);
            registry.pending.insert(id, tag.clone());
            registry.rescheduled.insert(id);
        }
    }

    /// Number of callbacks registered under `tag`.
    pub fn subscriber_count(&self, tag: &str) -> usize {
        self.registry
            .lock()
            .callbacks
            .get(tag)
            .map_or(0, IndexMap::len)
    }

    /// Number of deliveries waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.registry.lock().pending.len()
    }

    /// Whether a delivery is waiting for this subscription.
    pub fn is_pending(&self, id: SubscriptionId) -> bool {
        self.registry.lock().pending.contains_key(&id)
    }

    /// Drain the pending queue in scheduling order.
    pub(crate) fn take_pending(&self) -> Vec<(SubscriptionId, Tag, Callback)> {
        let mut registry = self.registry.lock();
        let pending = std::mem::take(&mut registry.pending);
        registry.rescheduled.clear();
        pending
            .into_iter()
            .filter_map(|(id, tag)| {
                let callback = registry.callback(&tag, id)?;
                Some((id, tag, callback))
            })
            .collect()
    }

    /// Take the pending delivery of one subscription.
    pub(crate) fn take_one(&self, id: SubscriptionId) -> Option<(Tag, Callback)> {
        let mut registry = self.registry.lock();
        let tag = registry.pending.shift_remove(&id)?;
        let callback = registry.callback(&tag, id)?;
        Some((tag, callback))
    }

    /// Subscriptions scheduled since the last call, for timer-driven delivery.
    pub(crate) fn take_rescheduled(&self) -> Vec<SubscriptionId> {
        std::mem::take(&mut self.registry.lock().rescheduled)
            .into_iter()
            .collect()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("Notifier")
            .field("tags", &registry.callbacks.len())
            .field("pending", &registry.pending.len())
            .finish()
    }
}

/// A callback paired with the membership it should receive.
pub struct Delivery {
    subscription: SubscriptionId,
    tag: Tag,
    ids: Vec<NodeId>,
    callback: Callback,
}

impl Delivery {
    pub(crate) fn new(
        subscription: SubscriptionId,
        tag: Tag,
        ids: Vec<NodeId>,
        callback: Callback,
    ) -> Self {
        Self {
            subscription,
            tag,
            ids,
            callback,
        }
    }

    /// The subscription this delivery is for.
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// The tag whose membership is delivered.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The membership computed when the delivery was taken.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Invoke the callback.
    pub fn deliver(self) {
        (self.callback)(&self.ids);
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("subscription", &self.subscription)
            .field("tag", &self.tag)
            .field("ids", &self.ids)
            .finish()
    }
}

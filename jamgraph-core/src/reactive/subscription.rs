//! Subscription handles.
//!
//! A [`Subscription`] is returned by `Store::subscribe` and acts as its
//! disposer: dropping it (or calling [`Subscription::remove`]) unregisters
//! the callback and cancels any delivery still pending for it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::notifier::Registry;
use crate::graph::{NodeId, Tag};

/// Callback invoked with the current membership of a tag.
pub type Callback = Arc<dyn Fn(&[NodeId]) + Send + Sync>;

/// Unique identifier for a subscription.
///
/// Debouncing is keyed by this id: each subscription has at most one
/// pending delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposer for a registered callback.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: SubscriptionId,
    tag: Tag,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, tag: Tag, registry: &Arc<Mutex<Registry>>) -> Self {
        Self {
            id,
            tag,
            registry: Arc::downgrade(registry),
        }
    }

    /// The subscription's unique ID.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The tag this subscription watches.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Unregister the callback now.
    pub fn remove(self) {
        drop(self);
    }

    /// Keep the callback registered for the life of the store.
    ///
    /// The returned id can still be passed to `Store::unsubscribe`.
    pub fn detach(mut self) -> SubscriptionId {
        self.registry = Weak::new();
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.tag, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("attached", &(self.registry.strong_count() > 0))
            .finish()
    }
}

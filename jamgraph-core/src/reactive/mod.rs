//! Tag Subscriptions
//!
//! This module implements change notification: callbacks registered per tag
//! that receive the tag's current membership after the store changes.
//!
//! # Concepts
//!
//! ## Subscriptions
//!
//! `Store::subscribe(tag, callback, deliver_immediately)` registers a
//! callback and returns a [`Subscription`] that unregisters it when dropped.
//!
//! ## Debounced Delivery
//!
//! Mutations that touch a tag schedule a delivery for each of its callbacks.
//! Each subscription has at most one pending delivery; rescheduling replaces
//! it. The callback receives `ids_by_tag(tag)` computed when the delivery
//! fires, so a burst of mutations yields one call carrying the final state.
//!
//! ## Driving Deliveries
//!
//! Deliveries fire either synchronously through `Store::flush`, or from
//! Tokio timers through [`SharedStore`], which waits out the configured
//! debounce window per subscription.

mod notifier;
mod runtime;
mod subscription;

pub use notifier::{Delivery, Notifier};
pub use runtime::SharedStore;
pub use subscription::{Callback, Subscription, SubscriptionId};

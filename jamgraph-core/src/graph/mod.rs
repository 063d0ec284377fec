//! Graph Store
//!
//! This module implements the node table: identity, values, links, and the
//! tag index built on top of them.
//!
//! # Overview
//!
//! The graph is a directed graph where:
//!
//! - Nodes hold a value and a tag, and are addressed by a string id
//! - Links point from one node to another; a node's links form a set
//!
//! Links are deliberately not kept symmetric. `link` adds one direction,
//! `link_both` adds two, and `unlink` removes one. Deleting a node removes
//! the back-references held by the nodes it links to, and nothing else.
//!
//! # Design Decisions
//!
//! 1. The store is an explicit value, not a process-wide singleton. Anything
//!    that needs it gets it by reference.
//!
//! 2. The table is an `IndexMap`, so `keys`, `search` and the tag queries
//!    report nodes in insertion order.
//!
//! 3. Change propagation goes through the [`Observer`] trait on records
//!    instead of inspecting values for hook methods.
//!
//! 4. A store used directly runs observer hooks inline. A store with
//!    deferred hooks queues them as [`HookCall`]s instead, so a caller
//!    holding the store behind a lock can run them once the lock is free.

mod ids;
mod index;
mod node;
mod store;
mod value;

pub use ids::{IdSource, UuidSource};
pub use node::{Node, NodeDraft, NodeId, Tag};
pub use store::Store;
pub use value::{HookCall, Observer, Record, Value};

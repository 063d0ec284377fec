//! Jamgraph Core
//!
//! This crate provides an in-memory, tag-indexed graph store for small
//! reactive applications such as UI state graphs. It implements:
//!
//! - Nodes with generated identities, tags, and scalar or record values
//! - Directed links with one-hop change propagation to linked observers
//! - A tag index with full-text search over JSON-serialised values
//! - Per-tag subscriptions with debounced, coalesced delivery
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: The node table, values, links, and tag index
//! - `reactive`: Subscriptions, debouncing, and timer-driven delivery
//! - `config`: Store settings
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use jamgraph_core::graph::{Store, Value};
//! use serde_json::json;
//!
//! let mut store = Store::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_cb = seen.clone();
//!
//! // Watch the "user" tag
//! let _subscription = store.subscribe(
//!     "user",
//!     move |ids| *seen_cb.lock().unwrap() = ids.to_vec(),
//!     false,
//! );
//!
//! // Add two users and link them
//! let ann = store.add_value(Value::from_json(json!({ "name": "ann" })), Some("user")).unwrap();
//! let bob = store.add_value(Value::from_json(json!({ "name": "bob" })), Some("user")).unwrap();
//! store.link_both(&ann, &bob);
//!
//! // All of the above collapses into one delivery
//! assert_eq!(store.flush(), 1);
//! assert_eq!(*seen.lock().unwrap(), vec![ann, bob]);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::StoreConfig;
pub use error::{GraphError, Result};
pub use graph::{Node, NodeDraft, NodeId, Store, Tag, Value};
pub use reactive::{SharedStore, Subscription};

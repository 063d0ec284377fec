//! Store Configuration
//!
//! Settings are plain data so they can be embedded in a host application's
//! own configuration document. Every field has a default, so an empty JSON
//! object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tag assigned to nodes created without one.
pub const DEFAULT_TAG: &str = "UNLABELED";

/// Configuration for a [`Store`](crate::graph::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Tag used when a node is added without a tag (or with an empty one).
    pub default_tag: String,

    /// Debounce window for the async driver, in milliseconds.
    ///
    /// Zero defers delivery to the next timer tick.
    pub debounce_ms: u64,

    /// Whether nodes created through `add_value` take part in full-text search.
    pub searchable_by_default: bool,
}

impl StoreConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The debounce window as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_TAG.to_string(),
            debounce_ms: 0,
            searchable_by_default: true,
        }
    }
}

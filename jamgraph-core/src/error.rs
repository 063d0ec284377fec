//! Error Types
//!
//! Only caller contract violations surface as errors. Soft validation
//! failures (duplicate ids, self links, mutations on missing nodes) are
//! reported through `tracing` and turn the operation into a no-op.

use thiserror::Error;

use crate::graph::NodeId;

/// Hard failures raised by the store.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A value was dereferenced for an id that is not in the store.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A configuration document could not be parsed.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

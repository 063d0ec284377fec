//! Graph Nodes
//!
//! This module defines the records that live in the store: identifiers,
//! tags, the [`Node`] itself, and the [`NodeDraft`] a caller fills in before
//! the store assigns an id.

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;

use super::value::Value;

/// Identifier of a node within one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Get the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Classification of a node, used for indexing and notification scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    /// Get the raw tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Tag {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The contents of a node before it has been given an id.
///
/// # Example
///
/// ```rust
/// use jamgraph_core::graph::{NodeDraft, Value};
///
/// let draft = NodeDraft::new(Value::scalar("hello"))
///     .tagged("greeting")
///     .searchable(false);
/// assert_eq!(draft.tag(), Some("greeting"));
/// ```
#[derive(Debug, Clone)]
pub struct NodeDraft {
    tag: Option<String>,
    links: IndexSet<NodeId>,
    value: Value,
    searchable: bool,
}

impl NodeDraft {
    /// Create a draft holding the given value, untagged and searchable.
    pub fn new(value: Value) -> Self {
        Self {
            tag: None,
            links: IndexSet::new(),
            value,
            searchable: true,
        }
    }

    /// Set the tag. An empty tag is treated as no tag.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = if tag.is_empty() { None } else { Some(tag) };
        self
    }

    /// Add outgoing links. Duplicates collapse.
    pub fn linked_to<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.links.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Include or exclude the value from full-text search.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// The tag, if one was set.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub(crate) fn into_node(self, id: NodeId, default_tag: &str) -> Node {
        Node {
            id,
            tag: Tag::from(self.tag.unwrap_or_else(|| default_tag.to_string())),
            links: self.links,
            value: self.value,
            searchable: self.searchable,
            timestamp: Utc::now(),
        }
    }
}

impl From<&Node> for NodeDraft {
    /// Copy a node's fields. Record values keep sharing the same handle.
    fn from(node: &Node) -> Self {
        Self {
            tag: Some(node.tag.to_string()),
            links: node.links.clone(),
            value: node.value.clone(),
            searchable: node.searchable,
        }
    }
}

/// A node stored in the graph.
///
/// Nodes are only created by the store, which is also the only place their
/// links and values are mutated.
#[derive(Debug, Clone)]
pub struct Node {
    /// Identifier, assigned once at insertion.
    id: NodeId,

    /// Classification used for indexing and notifications.
    tag: Tag,

    /// Outgoing edges. Order is not significant.
    links: IndexSet<NodeId>,

    /// The payload.
    value: Value,

    /// Whether the payload takes part in full-text search.
    searchable: bool,

    /// Instant of the last mutation.
    timestamp: DateTime<Utc>,
}

impl Node {
    /// Get the node's ID.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Get the node's tag.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Get the outgoing links.
    pub fn links(&self) -> &IndexSet<NodeId> {
        &self.links
    }

    /// Check for an outgoing link to `id`.
    pub fn links_to(&self, id: &str) -> bool {
        self.links.contains(id)
    }

    /// Get the payload.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the payload takes part in full-text search.
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Instant of the last mutation.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub(crate) fn touch(&mut self) {
        self.timestamp = Utc::now();
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Add an outgoing link. Returns false if it was already present.
    pub(crate) fn add_link(&mut self, id: NodeId) -> bool {
        self.links.insert(id)
    }

    /// Remove an outgoing link. Returns false if there was none.
    pub(crate) fn remove_link(&mut self, id: &str) -> bool {
        self.links.shift_remove(id)
    }
}

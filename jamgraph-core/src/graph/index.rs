//! Tag Index and Search
//!
//! Read-side queries over the node table plus the bulk removals that go with
//! them. There is no secondary index: every query is a linear scan, which is
//! fine for the UI-sized graphs the store is meant for.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::node::{Node, NodeId, Tag};
use super::store::Store;
use super::value::is_truthy;

impl Store {
    /// Snapshot of every id, in insertion order.
    pub fn keys(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Ids whose JSON text contains `query`.
    ///
    /// With `field`, only that field is searched when the node has it (and
    /// it is not null, false, zero or empty). Otherwise the whole value is
    /// searched, unless the node is not searchable. Matching is an exact,
    /// case-sensitive substring test.
    pub fn search(&self, query: &str, field: Option<&str>) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| searchable_text(node, field).contains(query))
            .map(|node| node.id().clone())
            .collect()
    }

    /// A node's neighbours, grouped by their tag.
    ///
    /// Dangling links are skipped. An unknown id yields an empty map.
    pub fn links_by_tag(&self, id: &str) -> IndexMap<Tag, Vec<NodeId>> {
        let mut groups: IndexMap<Tag, Vec<NodeId>> = IndexMap::new();
        let Some(node) = self.get(id) else {
            tracing::warn!(id, "unable to group links: node not found");
            return groups;
        };
        for link in node.links() {
            if let Some(linked) = self.get(link) {
                groups
                    .entry(linked.tag().clone())
                    .or_default()
                    .push(link.clone());
            }
        }
        groups
    }

    /// Ids of every node carrying `tag`.
    pub fn ids_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.tag().as_str() == tag)
            .map(|node| node.id().clone())
            .collect()
    }

    /// Every tag currently in use.
    pub fn tags(&self) -> IndexSet<Tag> {
        self.nodes.values().map(|node| node.tag().clone()).collect()
    }

    /// Delete every node carrying `tag`. Returns how many were removed.
    pub fn remove_by_tag(&mut self, tag: &str) -> usize {
        let mut removed = 0;
        for id in self.ids_by_tag(tag) {
            if self.detach(&id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(tag, removed, "removed nodes by tag");
            self.notify(tag);
        }
        removed
    }

    /// Ids from `ids` (or all ids) whose node satisfies `predicate`.
    ///
    /// Ids that are not in the store are skipped.
    pub fn filter<P>(&self, mut predicate: P, ids: Option<&[NodeId]>) -> Vec<NodeId>
    where
        P: FnMut(&Node) -> bool,
    {
        match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.get(id))
                .filter(|&node| predicate(node))
                .map(|node| node.id().clone())
                .collect(),
            None => self
                .nodes
                .values()
                .filter(|&node| predicate(node))
                .map(|node| node.id().clone())
                .collect(),
        }
    }

    /// Drop every node. Subscriptions survive; nothing is notified.
    pub fn clear(&mut self) {
        debug!(nodes = self.nodes.len(), "store cleared");
        self.nodes.clear();
    }
}

/// The text `search` matches against for one node.
fn searchable_text(node: &Node, field: Option<&str>) -> String {
    let requested = field
        .and_then(|field| node.value().field(field))
        .filter(is_truthy);
    match requested {
        Some(value) => value.to_string(),
        None if node.is_searchable() => serde_json::to_string(node.value()).unwrap_or_default(),
        None => String::new(),
    }
}

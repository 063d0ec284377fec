//! Node Store
//!
//! The store owns the node table and is the only code that assigns ids or
//! touches link sets. Every operation is synchronous and runs to completion.
//!
//! # Failure Modes
//!
//! Mutations with bad input (duplicate explicit id, self link, unknown id)
//! log a warning and leave the table untouched; they report failure through
//! `None` or `false`. Reading the value of an unknown id is a caller bug and
//! returns [`GraphError::NodeNotFound`].
//!
//! # Propagation
//!
//! `update` and `set_property` push the change to the observers of directly
//! linked nodes, skipping the dispatcher. Propagation is one hop only: an
//! observer that wants to go further must do so itself.
//!
//! Hooks normally run before the mutating call returns. With
//! [`Store::set_defer_hooks`] they are queued instead and handed out by
//! [`Store::take_hook_calls`], which is how `SharedStore` runs them outside
//! its lock.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use tracing::{debug, trace, warn};

use super::ids::{IdSource, UuidSource};
use super::node::{Node, NodeDraft, NodeId, Tag};
use super::value::{is_truthy, HookCall, Record, Value};
use crate::config::StoreConfig;
use crate::error::{GraphError, Result};
use crate::reactive::{Delivery, Notifier, Subscription, SubscriptionId};

/// In-memory graph of tagged, linked values.
pub struct Store {
    /// All nodes, in insertion order.
    pub(super) nodes: IndexMap<NodeId, Node>,

    /// Source of candidate ids.
    ids: Box<dyn IdSource>,

    /// Per-tag subscriptions.
    notifier: Notifier,

    /// Queue hooks instead of running them inline.
    defer_hooks: bool,

    /// Hooks waiting for `take_hook_calls`.
    hook_calls: Vec<HookCall>,

    config: StoreConfig,
}

impl Store {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_id_source(config, UuidSource)
    }

    /// Create an empty store that draws ids from `ids`.
    pub fn with_id_source<S>(config: StoreConfig, ids: S) -> Self
    where
        S: IdSource + 'static,
    {
        Self {
            nodes: IndexMap::new(),
            ids: Box::new(ids),
            notifier: Notifier::new(),
            defer_hooks: false,
            hook_calls: Vec::new(),
            config,
        }
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Queue observer hooks instead of running them inline.
    ///
    /// Turning deferral off runs whatever is still queued.
    pub fn set_defer_hooks(&mut self, defer: bool) {
        self.defer_hooks = defer;
        if !defer {
            for call in self.take_hook_calls() {
                call.run();
            }
        }
    }

    /// Drain the queued hooks, in the order they were raised.
    pub fn take_hook_calls(&mut self) -> Vec<HookCall> {
        std::mem::take(&mut self.hook_calls)
    }

    fn dispatch(&mut self, call: HookCall) {
        if self.defer_hooks {
            self.hook_calls.push(call);
        } else {
            call.run();
        }
    }

    // ------------------------------------------------------------------------
    // Identity and values
    // ------------------------------------------------------------------------

    /// Insert a node.
    ///
    /// Without an explicit id a fresh one is generated. An explicit id that is
    /// already taken leaves the store unchanged and returns `None`.
    pub fn add(&mut self, draft: NodeDraft, explicit_id: Option<&str>) -> Option<NodeId> {
        let id = match explicit_id.filter(|id| !id.is_empty()) {
            Some(id) if self.nodes.contains_key(id) => {
                warn!(id, "node already exists");
                return None;
            }
            Some(id) => NodeId::from(id),
            None => self.fresh_id(),
        };

        let node = draft.into_node(id.clone(), &self.config.default_tag);
        let tag = node.tag().clone();
        self.nodes.insert(id.clone(), node);
        debug!(%id, %tag, "node added");

        self.notifier.notify(&tag);
        Some(id)
    }

    /// Box a value into a new node and insert it.
    ///
    /// A falsy scalar (null, false, zero or the empty string) is boxed as an
    /// empty record.
    pub fn add_value(&mut self, value: impl Into<Value>, tag: Option<&str>) -> Option<NodeId> {
        let value = match value.into() {
            Value::Scalar(scalar) if !is_truthy(&scalar) => Value::record(Map::new()),
            value => value,
        };
        let mut draft = NodeDraft::new(value).searchable(self.config.searchable_by_default);
        if let Some(tag) = tag {
            draft = draft.tagged(tag);
        }
        self.add(draft, None)
    }

    /// Draw ids until one is free.
    fn fresh_id(&mut self) -> NodeId {
        loop {
            let candidate = self.ids.generate();
            if !self.nodes.contains_key(candidate.as_str()) {
                return NodeId::from(candidate);
            }
            trace!(%candidate, "generated id already taken, retrying");
        }
    }

    /// Get a node.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get several nodes, preserving the order of `ids`.
    pub fn get_many<I>(&self, ids: &[I]) -> Vec<Option<&Node>>
    where
        I: AsRef<str>,
    {
        ids.iter().map(|id| self.get(id.as_ref())).collect()
    }

    /// Get a node's value.
    pub fn get_value(&self, id: &str) -> Result<Value> {
        self.get(id)
            .map(|node| node.value().clone())
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::from(id)))
    }

    /// Get the values of several nodes, failing on the first unknown id.
    pub fn get_values<I>(&self, ids: &[I]) -> Result<Vec<Value>>
    where
        I: AsRef<str>,
    {
        ids.iter().map(|id| self.get_value(id.as_ref())).collect()
    }

    /// Apply `patch` to a node and forward it to linked observers.
    ///
    /// Scalar values are replaced by the patch; records get a shallow merge
    /// of the patch's fields. Linked nodes whose value is `dispatcher` are
    /// skipped.
    pub fn update(
        &mut self,
        id: &str,
        patch: impl Into<Value>,
        dispatcher: Option<&Value>,
    ) -> bool {
        let patch = patch.into();
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(id, "unable to update node: not found");
            return false;
        };

        node.touch();
        if node.value().is_scalar() {
            node.set_value(patch.clone());
        } else if let (Some(record), Some(fields)) = (node.value().as_record(), patch.as_record()) {
            record.merge(&fields.fields());
        }
        let tag = node.tag().clone();
        let links: Vec<NodeId> = node.links().iter().cloned().collect();

        for record in self.linked_records(&links, dispatcher) {
            self.dispatch(HookCall::update(record, patch.clone()));
        }

        self.notifier.notify(&tag);
        true
    }

    /// Set a single property of a record-valued node.
    ///
    /// Linked observers that watch `key` are told about the new value.
    /// Scalars have no properties, so this fails softly on them.
    pub fn set_property(
        &mut self,
        id: &str,
        key: &str,
        value: impl Into<Json>,
        dispatcher: Option<&Value>,
    ) -> bool {
        let value = value.into();
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(id, key, "unable to set property: node not found");
            return false;
        };
        let Some(record) = node.value().as_record() else {
            warn!(id, key, "unable to set property on a scalar value");
            return false;
        };

        record.set(key, value.clone());
        node.touch();
        let tag = node.tag().clone();
        let links: Vec<NodeId> = node.links().iter().cloned().collect();

        for record in self.linked_records(&links, dispatcher) {
            let watches = record
                .observer()
                .is_some_and(|observer| observer.observes_property(key));
            if watches {
                self.dispatch(HookCall::property_changed(record, key, value.clone()));
            }
        }

        self.notifier.notify(&tag);
        true
    }

    /// Observed records of the existing nodes in `links`, minus the dispatcher.
    fn linked_records(&self, links: &[NodeId], dispatcher: Option<&Value>) -> Vec<Record> {
        links
            .iter()
            .filter_map(|link| {
                let linked = self.nodes.get(link.as_str());
                if linked.is_none() {
                    trace!(%link, "skipping dangling link");
                }
                linked
            })
            .map(Node::value)
            .filter(|value| dispatcher.map_or(true, |d| !value.same(d)))
            .filter_map(|value| value.as_record().cloned())
            .filter(|record| record.observer().is_some())
            .collect()
    }

    /// Remove a node and the back-references its neighbours hold to it.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(node) = self.detach(id) else {
            warn!(id, "unable to delete node: not found");
            return false;
        };
        debug!(id, tag = %node.tag(), "node deleted");
        self.notifier.notify(node.tag());
        true
    }

    /// Remove a node from the table.
    ///
    /// Every node it links to loses its link back. Nodes that point at it
    /// without being pointed at keep their (now dangling) link.
    pub(super) fn detach(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.shift_remove(id)?;
        for neighbour in node.links() {
            if let Some(neighbour) = self.nodes.get_mut(neighbour.as_str()) {
                neighbour.remove_link(id);
            }
        }
        Some(node)
    }

    /// Copy a node under a new id. Record values stay shared with the source.
    pub fn clone_node(&mut self, id: &str, explicit_id: Option<&str>) -> Option<NodeId> {
        let Some(node) = self.nodes.get(id) else {
            warn!(id, "unable to clone node: not found");
            return None;
        };
        let draft = NodeDraft::from(node);
        self.add(draft, explicit_id)
    }

    // ------------------------------------------------------------------------
    // Linking
    // ------------------------------------------------------------------------

    /// Add a directed link `from -> to`.
    ///
    /// The target's observer is handed the source's value once.
    pub fn link(&mut self, from: &str, to: &str) -> bool {
        let Some((source, target)) = self.link_endpoints(from, to) else {
            return false;
        };

        if let Some(node) = self.nodes.get_mut(from) {
            node.add_link(NodeId::from(to));
            node.touch();
        }
        self.sync_observer(&target.1, &source.1);
        debug!(from, to, "nodes linked");

        self.notifier.notify(&source.0);
        self.notifier.notify(&target.0);
        true
    }

    /// Link two nodes in both directions.
    ///
    /// Each side's observer is handed the other side's value once.
    pub fn link_both(&mut self, a: &str, b: &str) -> bool {
        let Some((first, second)) = self.link_endpoints(a, b) else {
            return false;
        };

        if let Some(node) = self.nodes.get_mut(a) {
            node.add_link(NodeId::from(b));
            node.touch();
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.add_link(NodeId::from(a));
            node.touch();
        }
        self.sync_observer(&second.1, &first.1);
        self.sync_observer(&first.1, &second.1);
        debug!(a, b, "nodes linked both ways");

        self.notifier.notify(&first.0);
        self.notifier.notify(&second.0);
        true
    }

    /// Hand `patch` to the observer of `target`, if it has one.
    fn sync_observer(&mut self, target: &Value, patch: &Value) {
        if let Some(record) = target.as_record().filter(|r| r.observer().is_some()) {
            self.dispatch(HookCall::update(record.clone(), patch.clone()));
        }
    }

    /// Check both ends of a prospective link and snapshot their tag and value.
    fn link_endpoints(&self, from: &str, to: &str) -> Option<((Tag, Value), (Tag, Value))> {
        if from == to {
            warn!(id = from, "cannot link node to itself");
            return None;
        }
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(source), Some(target)) => Some((
                (source.tag().clone(), source.value().clone()),
                (target.tag().clone(), target.value().clone()),
            )),
            _ => {
                warn!(from, to, "could not link nodes");
                None
            }
        }
    }

    /// Remove the link `from -> to`. The reverse link, if any, is kept.
    pub fn unlink(&mut self, from: &str, to: &str) -> bool {
        let removed = self
            .nodes
            .get_mut(from)
            .map(|node| {
                let removed = node.remove_link(to);
                if removed {
                    node.touch();
                }
                removed
            })
            .unwrap_or(false);
        trace!(from, to, removed, "unlink");
        removed
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Register `callback` for changes to the membership of `tag`.
    ///
    /// With `deliver_immediately` a first delivery carrying the current
    /// membership is scheduled right away, even if it is empty.
    pub fn subscribe<F>(&self, tag: &str, callback: F, deliver_immediately: bool) -> Subscription
    where
        F: Fn(&[NodeId]) + Send + Sync + 'static,
    {
        let subscription = self.notifier.subscribe(Tag::from(tag), Arc::new(callback));
        if deliver_immediately {
            self.notifier.notify(tag);
        }
        subscription
    }

    /// Remove a subscription by id. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Schedule a delivery for every subscriber of `tag`.
    pub fn notify(&self, tag: &str) {
        self.notifier.notify(tag);
    }

    /// The store's notifier.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Take every pending delivery, computing membership now.
    pub fn take_deliveries(&self) -> Vec<Delivery> {
        self.notifier
            .take_pending()
            .into_iter()
            .map(|(subscription, tag, callback)| {
                let ids = self.ids_by_tag(&tag);
                Delivery::new(subscription, tag, ids, callback)
            })
            .collect()
    }

    /// Take the pending delivery for one subscription, if any.
    pub fn take_delivery(&self, id: SubscriptionId) -> Option<Delivery> {
        self.notifier.take_one(id).map(|(tag, callback)| {
            let ids = self.ids_by_tag(&tag);
            Delivery::new(id, tag, ids, callback)
        })
    }

    /// Run every pending delivery now. Returns how many callbacks ran.
    pub fn flush(&self) -> usize {
        let deliveries = self.take_deliveries();
        let count = deliveries.len();
        for delivery in deliveries {
            delivery.deliver();
        }
        if count > 0 {
            trace!(count, "flushed deliveries");
        }
        count
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("nodes", &self.nodes.len())
            .field("config", &self.config)
            .field("queued_hooks", &self.hook_calls.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::graph::Observer;

    fn object(value: Json) -> Value {
        Value::from_json(value)
    }

    /// Id source that repeats each id before moving on.
    fn stuttering_ids() -> impl IdSource {
        let mut n = 0u32;
        move || {
            n += 1;
            format!("id-{}", n / 2)
        }
    }

    #[test]
    fn generated_ids_skip_collisions() {
        let mut store = Store::with_id_source(StoreConfig::default(), stuttering_ids());
        let ids: Vec<NodeId> = (0..5)
            .map(|i| store.add_value(json!(i), None).unwrap())
            .collect();

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn duplicate_explicit_id_is_rejected() {
        let mut store = Store::new();
        let first = store.add(NodeDraft::new(Value::scalar("first")), Some("fixed"));
        assert_eq!(first.as_deref(), Some("fixed"));

        let second = store.add(NodeDraft::new(Value::scalar("second")), Some("fixed"));
        assert!(second.is_none());
        assert_eq!(store.get_value("fixed").unwrap(), Value::scalar("first"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_value_applies_default_tag() {
        let mut store = Store::new();
        let id = store.add_value(json!(1), None).unwrap();
        assert_eq!(store.get(&id).unwrap().tag(), &"UNLABELED");

        let tagged = store.add_value(json!(1), Some("user")).unwrap();
        assert_eq!(store.get(&tagged).unwrap().tag(), &"user");
    }

    #[test]
    fn get_value_of_missing_node_fails() {
        let store = Store::new();
        assert!(matches!(
            store.get_value("nope"),
            Err(GraphError::NodeNotFound(id)) if id == "nope"
        ));
        assert!(store.get_values(&["nope"]).is_err());
    }

    #[test]
    fn get_many_preserves_order() {
        let mut store = Store::new();
        let a = store.add_value(json!("a"), None).unwrap();
        let b = store.add_value(json!("b"), None).unwrap();

        let nodes = store.get_many(&[b.as_str(), "missing", a.as_str()]);
        assert_eq!(nodes[0].unwrap().id(), &b);
        assert!(nodes[1].is_none());
        assert_eq!(nodes[2].unwrap().id(), &a);
    }

    #[test]
    fn update_merges_records_and_replaces_scalars() {
        let mut store = Store::new();
        let record = store.add_value(object(json!({ "y": 2 })), None).unwrap();
        let scalar = store.add_value(json!(5), None).unwrap();

        assert!(store.update(&record, object(json!({ "x": 1 })), None));
        assert!(store.update(&scalar, object(json!({ "x": 1 })), None));

        assert_eq!(store.get_value(&record).unwrap().to_json(), json!({ "y": 2, "x": 1 }));
        assert_eq!(store.get_value(&scalar).unwrap().to_json(), json!({ "x": 1 }));
    }

    #[test]
    fn update_of_missing_node_is_soft() {
        let mut store = Store::new();
        assert!(!store.update("ghost", json!(1), None));
        assert!(store.is_empty());
    }

    #[test]
    fn set_property_on_scalar_is_soft() {
        let mut store = Store::new();
        let id = store.add_value(json!(5), None).unwrap();
        assert!(!store.set_property(&id, "x", 1, None));
        assert_eq!(store.get_value(&id).unwrap(), Value::scalar(5));
    }

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<Json>>,
        changes: Mutex<Vec<(String, Json)>>,
    }

    struct Watch {
        log: Arc<Recorder>,
        key: &'static str,
    }

    impl Observer for Watch {
        fn on_update(&self, _record: &Record, patch: &Value) {
            self.log.updates.lock().unwrap().push(patch.to_json());
        }

        fn observes_property(&self, key: &str) -> bool {
            key == self.key
        }

        fn on_property_changed(&self, _record: &Record, key: &str, value: &Json) {
            self.log.changes.lock().unwrap().push((key.to_string(), value.clone()));
        }
    }

    fn watched(log: &Arc<Recorder>, key: &'static str) -> Value {
        Value::Record(Record::with_observer(
            serde_json::Map::new(),
            Watch { log: log.clone(), key },
        ))
    }

    #[test]
    fn update_propagates_one_hop_and_skips_dispatcher() {
        let mut store = Store::new();
        let log = Arc::new(Recorder::default());
        let far_log = Arc::new(Recorder::default());

        let source = store.add_value(object(json!({})), None).unwrap();
        let near = store.add_value(watched(&log, "name"), None).unwrap();
        let far = store.add_value(watched(&far_log, "name"), None).unwrap();
        store.link(&source, &near);
        store.link(&near, &far);
        log.updates.lock().unwrap().clear();
        far_log.updates.lock().unwrap().clear();

        store.update(&source, object(json!({ "n": 1 })), None);
        assert_eq!(*log.updates.lock().unwrap(), vec![json!({ "n": 1 })]);
        assert!(far_log.updates.lock().unwrap().is_empty());

        let near_value = store.get_value(&near).unwrap();
        store.update(&source, object(json!({ "n": 2 })), Some(&near_value));
        assert_eq!(log.updates.lock().unwrap().len(), 1);
    }

    #[test]
    fn set_property_calls_matching_hook_only() {
        let mut store = Store::new();
        let log = Arc::new(Recorder::default());

        let source = store.add_value(object(json!({})), None).unwrap();
        let watcher = store.add_value(watched(&log, "color"), None).unwrap();
        store.link(&source, &watcher);

        store.set_property(&source, "color", "red", None);
        store.set_property(&source, "size", 3, None);

        assert_eq!(
            *log.changes.lock().unwrap(),
            vec![("color".to_string(), json!("red"))]
        );
        assert_eq!(store.get_value(&source).unwrap().field("size"), Some(json!(3)));
    }

    #[test]
    fn link_is_idempotent_and_guards_self() {
        let mut store = Store::new();
        let a = store.add_value(json!("a"), None).unwrap();
        let b = store.add_value(json!("b"), None).unwrap();

        assert!(store.link(&a, &b));
        assert!(store.link(&a, &b));
        assert_eq!(store.get(&a).unwrap().links().len(), 1);
        assert!(store.get(&b).unwrap().links().is_empty());

        assert!(!store.link(&a, &a));
        assert!(!store.link_both(&a, &a));
        assert!(!store.link(&a, "missing"));
    }

    #[test]
    fn link_hands_source_value_to_target_observer() {
        let mut store = Store::new();
        let log = Arc::new(Recorder::default());
        let source = store.add_value(object(json!({ "name": "src" })), None).unwrap();
        let target = store.add_value(watched(&log, "name"), None).unwrap();

        store.link(&source, &target);
        assert_eq!(*log.updates.lock().unwrap(), vec![json!({ "name": "src" })]);
    }

    #[test]
    fn link_both_and_unlink() {
        let mut store = Store::new();
        let a = store.add_value(json!("a"), None).unwrap();
        let b = store.add_value(json!("b"), None).unwrap();

        assert!(store.link_both(&a, &b));
        assert!(store.get(&a).unwrap().links_to(&b));
        assert!(store.get(&b).unwrap().links_to(&a));

        assert!(store.unlink(&a, &b));
        assert!(!store.get(&a).unwrap().links_to(&b));
        assert!(store.get(&b).unwrap().links_to(&a));
        assert!(!store.unlink(&a, &b));
    }

    #[test]
    fn delete_clears_back_references() {
        let mut store = Store::new();
        let a = store.add_value(json!("a"), None).unwrap();
        let b = store.add_value(json!("b"), None).unwrap();
        let c = store.add_value(json!("c"), None).unwrap();
        store.link_both(&a, &b);
        store.link(&c, &a);

        assert!(store.delete(&a));
        assert!(store.get(&a).is_none());
        assert!(!store.get(&b).unwrap().links_to(&a));
        // c was never linked from a, so its edge dangles.
        assert!(store.get(&c).unwrap().links_to(&a));

        assert!(!store.delete(&a));
    }

    #[test]
    fn clone_shares_record_under_new_id() {
        let mut store = Store::new();
        let a = store.add_value(object(json!({ "n": 1 })), Some("item")).unwrap();
        let copy = store.clone_node(&a, None).unwrap();

        assert_ne!(copy, a);
        assert_eq!(store.get(&copy).unwrap().tag(), &"item");

        store.set_property(&a, "n", 2, None);
        assert_eq!(store.get_value(&copy).unwrap().field("n"), Some(json!(2)));

        assert!(store.clone_node("missing", None).is_none());
        assert!(store.clone_node(&a, Some(a.as_str())).is_none());
    }

    #[test]
    fn timestamps_move_on_mutation() {
        let mut store = Store::new();
        let id = store.add_value(object(json!({})), None).unwrap();
        let created = store.get(&id).unwrap().timestamp();
        store.set_property(&id, "k", 1, None);
        assert!(store.get(&id).unwrap().timestamp() >= created);
    }

    #[test]
    fn flush_delivers_membership_at_fire_time() {
        let mut store = Store::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let (seen_cb, calls_cb) = (seen.clone(), calls.clone());
        let _sub = store.subscribe(
            "user",
            move |ids| {
                calls_cb.fetch_add(1, Ordering::SeqCst);
                *seen_cb.lock().unwrap() = ids.to_vec();
            },
            false,
        );

        let a = store.add_value(json!("a"), Some("user")).unwrap();
        let b = store.add_value(json!("b"), Some("user")).unwrap();
        store.delete(&a);

        assert_eq!(store.flush(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![b]);
        assert_eq!(store.flush(), 0);
    }

    #[test]
    fn falsy_scalars_are_boxed_as_empty_records() {
        let mut store = Store::new();
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            let id = store.add_value(falsy, None).unwrap();
            let value = store.get_value(&id).unwrap();
            assert!(value.as_record().is_some_and(Record::is_empty));
            assert!(store.set_property(&id, "k", 1, None));
        }

        let id = store.add_value(json!(7), None).unwrap();
        assert_eq!(store.get_value(&id).unwrap(), Value::scalar(7));
        let draft = store.add(NodeDraft::new(Value::scalar(Json::Null)), None).unwrap();
        assert!(store.get_value(&draft).unwrap().is_scalar());
    }

    #[test]
    fn link_both_hands_each_side_the_other_value() {
        let mut store = Store::new();
        let (left_log, right_log) = (Arc::new(Recorder::default()), Arc::new(Recorder::default()));
        let side = |log: &Arc<Recorder>, name: &str| {
            let mut fields = serde_json::Map::new();
            fields.insert("side".into(), json!(name));
            Value::Record(Record::with_observer(fields, Watch { log: log.clone(), key: "side" }))
        };
        let left = store.add_value(side(&left_log, "left"), None).unwrap();
        let right = store.add_value(side(&right_log, "right"), None).unwrap();

        assert!(store.link_both(&left, &right));
        assert_eq!(*left_log.updates.lock().unwrap(), vec![json!({ "side": "right" })]);
        assert_eq!(*right_log.updates.lock().unwrap(), vec![json!({ "side": "left" })]);
    }

    #[test]
    fn deferred_hooks_wait_to_be_taken() {
        let mut store = Store::new();
        let log = Arc::new(Recorder::default());
        let source = store.add_value(object(json!({})), None).unwrap();
        let watcher = store.add_value(watched(&log, "color"), None).unwrap();

        store.set_defer_hooks(true);
        store.link(&source, &watcher);
        store.set_property(&source, "color", "red", None);
        store.set_property(&source, "size", 1, None);
        assert!(log.updates.lock().unwrap().is_empty());

        let calls = store.take_hook_calls();
        assert_eq!(calls.len(), 2);
        for call in calls {
            call.run();
        }
        assert_eq!(log.updates.lock().unwrap().len(), 1);
        assert_eq!(log.changes.lock().unwrap().len(), 1);

        store.update(&source, object(json!({ "n": 1 })), None);
        store.set_defer_hooks(false);
        assert_eq!(log.updates.lock().unwrap().len(), 2);
        assert!(store.take_hook_calls().is_empty());
    }

    #[test]
    fn update_schedules_a_delivery() {
        let mut store = Store::new();
        let id = store.add_value(object(json!({})), Some("user")).unwrap();
        let _sub = store.subscribe("user", |_| {}, false);

        assert!(store.update(&id, object(json!({ "n": 1 })), None));
        assert_eq!(store.notifier().pending_count(), 1);
        assert_eq!(store.flush(), 1);

        assert!(!store.update("ghost", json!(1), None));
        assert_eq!(store.flush(), 0);
    }

    #[test]
    fn unlink_is_silent() {
        let mut store = Store::new();
        let a = store.add_value(json!("a"), Some("user")).unwrap();
        let b = store.add_value(json!("b"), Some("user")).unwrap();
        let _sub = store.subscribe("user", |_| {}, false);
        store.link(&a, &b);
        assert_eq!(store.flush(), 1);

        assert!(store.unlink(&a, &b));
        assert_eq!(store.notifier().pending_count(), 0);
        assert_eq!(store.flush(), 0);
    }
}

//! Node Values
//!
//! A node's payload is either a scalar, which is replaced wholesale on
//! update, or a [`Record`]: a shared handle to a JSON object that is merged
//! into on update. Cloning a record clones the handle, so two nodes created
//! by `clone_node` observe each other's writes.
//!
//! # Observers
//!
//! A record may carry an [`Observer`]. The store uses it to push changes one
//! hop along the graph: when a node is updated, every linked record with an
//! observer hears about the patch. Records without an observer, and scalars,
//! are skipped.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};

/// Capability interface for values that react to changes on linked nodes.
///
/// Every method has a no-op default; implement only the hooks you need.
pub trait Observer: Send + Sync {
    /// Called when a linked node was updated with `patch`, or when this
    /// node was just linked from a node whose value is `patch`.
    fn on_update(&self, record: &Record, patch: &Value) {
        let _ = (record, patch);
    }

    /// Whether [`on_property_changed`](Observer::on_property_changed) should
    /// be called for `key`.
    fn observes_property(&self, key: &str) -> bool {
        let _ = key;
        false
    }

    /// Called when property `key` of a linked node was set to `value`.
    fn on_property_changed(&self, record: &Record, key: &str, value: &Json) {
        let _ = (record, key, value);
    }
}

/// One observer call, captured so it can run after the store is released.
pub struct HookCall {
    record: Record,
    event: HookEvent,
}

enum HookEvent {
    Update(Value),
    PropertyChanged(String, Json),
}

impl HookCall {
    /// `on_update` on `record`'s observer.
    pub(crate) fn update(record: Record, patch: Value) -> Self {
        Self {
            record,
            event: HookEvent::Update(patch),
        }
    }

    /// `on_property_changed` on `record`'s observer.
    pub(crate) fn property_changed(record: Record, key: &str, value: Json) -> Self {
        Self {
            record,
            event: HookEvent::PropertyChanged(key.to_string(), value),
        }
    }

    /// Invoke the hook. Records without an observer are skipped.
    pub fn run(self) {
        let Some(observer) = self.record.observer() else {
            return;
        };
        match &self.event {
            HookEvent::Update(patch) => observer.on_update(&self.record, patch),
            HookEvent::PropertyChanged(key, value) => {
                observer.on_property_changed(&self.record, key, value)
            }
        }
    }
}

impl fmt::Debug for HookCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = match &self.event {
            HookEvent::Update(_) => "update",
            HookEvent::PropertyChanged(..) => "property_changed",
        };
        f.debug_struct("HookCall").field("event", &event).finish()
    }
}

struct RecordInner {
    fields: RwLock<Map<String, Json>>,
    observer: Option<Arc<dyn Observer>>,
}

/// Shared, mutable JSON object with an optional observer.
#[derive(Clone)]
pub struct Record(Arc<RecordInner>);

impl Record {
    /// Create a record with no observer.
    pub fn new(fields: Map<String, Json>) -> Self {
        Self(Arc::new(RecordInner {
            fields: RwLock::new(fields),
            observer: None,
        }))
    }

    /// Create a record that reacts to changes on linked nodes.
    pub fn with_observer<O>(fields: Map<String, Json>, observer: O) -> Self
    where
        O: Observer + 'static,
    {
        Self(Arc::new(RecordInner {
            fields: RwLock::new(fields),
            observer: Some(Arc::new(observer)),
        }))
    }

    /// Get a copy of a field.
    pub fn get(&self, key: &str) -> Option<Json> {
        self.0.fields.read().get(key).cloned()
    }

    /// Set a single field, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: Json) {
        self.0.fields.write().insert(key.into(), value);
    }

    /// Shallow merge: overlapping keys are overwritten, others preserved.
    pub fn merge(&self, patch: &Map<String, Json>) {
        let mut fields = self.0.fields.write();
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
    }

    /// Snapshot of all fields.
    pub fn fields(&self) -> Map<String, Json> {
        self.0.fields.read().clone()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.fields.read().len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.fields.read().is_empty()
    }

    /// The observer, if the record has one.
    pub fn observer(&self) -> Option<&dyn Observer> {
        self.0.observer.as_deref()
    }

    /// Whether both handles point at the same record.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Snapshot as a JSON object.
    pub fn to_json(&self) -> Json {
        Json::Object(self.fields())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("fields", &*self.0.fields.read())
            .field("observed", &self.0.observer.is_some())
            .finish()
    }
}

/// A node's payload.
#[derive(Debug, Clone)]
pub enum Value {
    /// A string, number, boolean, null or array. Replaced wholesale on update.
    Scalar(Json),

    /// A shared object. Merged into on update.
    Record(Record),
}

impl Value {
    /// Wrap a JSON value as a scalar, whatever its shape.
    pub fn scalar(value: impl Into<Json>) -> Self {
        Self::Scalar(value.into())
    }

    /// Wrap a map as a record with no observer.
    pub fn record(fields: Map<String, Json>) -> Self {
        Self::Record(Record::new(fields))
    }

    /// Objects become records, everything else a scalar.
    pub fn from_json(value: Json) -> Self {
        match value {
            Json::Object(fields) => Self::record(fields),
            other => Self::Scalar(other),
        }
    }

    /// Whether the value is replaced wholesale on update.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Get the scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Json> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Record(_) => None,
        }
    }

    /// Get the record handle, if this is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Scalar(_) => None,
        }
    }

    /// Get a copy of a record field. Scalars have no fields.
    pub fn field(&self, key: &str) -> Option<Json> {
        self.as_record().and_then(|record| record.get(key))
    }

    /// Identity comparison.
    ///
    /// Records are the same only if they share a handle; scalars are the
    /// same when equal.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Record(a), Self::Record(b)) => a.ptr_eq(b),
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            _ => false,
        }
    }

    /// Snapshot as JSON.
    pub fn to_json(&self) -> Json {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::Record(record) => record.to_json(),
        }
    }
}

/// Content equality. Use [`Value::same`] for identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(value) => value.serialize(serializer),
            Self::Record(record) => record.0.fields.read().serialize(serializer),
        }
    }
}

impl From<Json> for Value {
    fn from(value: Json) -> Self {
        Self::from_json(value)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

/// Null, false, zero and the empty string are falsy; everything else is truthy.
pub(crate) fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(flag) => *flag,
        Json::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Json::String(text) => !text.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}

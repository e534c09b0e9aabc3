//! Live store abstraction for geostream
//!
//! The engine never reads a store directly. It only needs a way to open a
//! live subscription over a half-open range of one indexed string field;
//! each subscription re-delivers the complete matching snapshot whenever it
//! changes. Dropping the returned stream is the unsubscribe.

pub mod memory;

use crate::compute::codec::RANGE_SENTINEL;
use crate::error::{GeoError, Result};
use crate::point::GeoPoint;
use futures::stream::BoxStream;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use memory::{MemoryStore, StoreStats};

/// Error type reported by store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Full snapshots of the documents matching one range, until dropped.
pub type SnapshotStream = BoxStream<'static, std::result::Result<Vec<Document>, StoreError>>;

/// A store that can serve live range queries.
pub trait LiveStore: Send + Sync {
    /// Opens a live subscription. The first item is the current snapshot;
    /// later items are full replacements, never deltas.
    fn subscribe(&self, query: &RangeQuery) -> std::result::Result<SnapshotStream, StoreError>;
}

impl<T: LiveStore + ?Sized> LiveStore for Arc<T> {
    fn subscribe(&self, query: &RangeQuery) -> std::result::Result<SnapshotStream, StoreError> {
        (**self).subscribe(query)
    }
}

/// A range query over one indexed field: `start <= value < end`, ordered by
/// that field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeQuery {
    pub collection: String,
    /// Dotted path of the indexed field, e.g. `"point.geohash"`.
    pub field_path: String,
    pub start: String,
    pub end: String,
}

impl RangeQuery {
    /// The query selecting every point under `field` whose code starts with `cell`.
    pub fn for_cell(collection: &str, field: &str, cell: &str) -> Self {
        let mut end = String::with_capacity(cell.len() + 1);
        end.push_str(cell);
        end.push(RANGE_SENTINEL);

        Self {
            collection: collection.to_string(),
            field_path: format!("{}.geohash", field),
            start: cell.to_string(),
            end,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.start.as_str() <= value && value < self.end.as_str()
    }
}

/// A document: identity plus a JSON object body.
///
/// Serializes flat, with `id` first. A body key named `id` is not written, so
/// the document id is never duplicated or shadowed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Builds a document from any JSON value; fails unless it is an object.
    pub fn from_value(id: impl Into<String>, value: Value) -> Result<Self> {
        let data: Map<String, Value> = serde_json::from_value(value)?;
        Ok(Self::new(id, data))
    }

    /// Looks up a dotted path such as `"point.geohash"`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }

    /// Reads the point stored under `field`.
    pub fn point(&self, field: &str) -> Result<GeoPoint> {
        let missing = || GeoError::MissingPoint {
            id: self.id.clone(),
            field: field.to_string(),
        };
        let value = self.lookup(field).ok_or_else(missing)?;
        GeoPoint::deserialize(value).map_err(|_| missing())
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in self.data.iter().filter(|(key, _)| key.as_str() != "id") {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub(crate) fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = data.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

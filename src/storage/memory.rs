//! In-memory live store.
//!
//! Collections of JSON documents keyed by id. Every write recomputes the
//! snapshot of each live subscription on that collection and pushes it when
//! it changed.

use super::{Document, LiveStore, RangeQuery, SnapshotStream, StoreError, lookup};
use crate::error::Result;
use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

type SnapshotSender = mpsc::UnboundedSender<std::result::Result<Vec<Document>, StoreError>>;

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Documents across all collections
    pub document_count: usize,
    /// Number of set/delete operations performed
    pub writes: u64,
    pub subscriptions_opened: u64,
    pub subscriptions_released: u64,
    /// Snapshots pushed to subscribers, including initial ones
    pub snapshots_delivered: u64,
}

struct Subscriber {
    query: RangeQuery,
    sender: SnapshotSender,
    last: Vec<Document>,
}

#[derive(Default)]
struct StoreInner {
    collections: FxHashMap<String, BTreeMap<String, Map<String, Value>>>,
    subscribers: FxHashMap<u64, Subscriber>,
    next_subscriber: u64,
    stats: StoreStats,
}

/// Documents matching `query`, ordered by the indexed field then by id.
fn snapshot(
    collections: &FxHashMap<String, BTreeMap<String, Map<String, Value>>>,
    query: &RangeQuery,
) -> Vec<Document> {
    let Some(docs) = collections.get(&query.collection) else {
        return Vec::new();
    };

    let mut matched: Vec<(&str, &String, &Map<String, Value>)> = docs
        .iter()
        .filter_map(|(id, data)| {
            let code = lookup(data, &query.field_path)?.as_str()?;
            query.contains(code).then_some((code, id, data))
        })
        .collect();
    // Stable: equal codes keep the id order of the BTreeMap
    matched.sort_by(|a, b| a.0.cmp(b.0));

    matched
        .into_iter()
        .map(|(_, id, data)| Document::new(id.clone(), data.clone()))
        .collect()
}

impl StoreInner {
    fn publish(&mut self, collection: &str) {
        for subscriber in self.subscribers.values_mut() {
            if subscriber.query.collection != collection {
                continue;
            }
            let current = snapshot(&self.collections, &subscriber.query);
            if current == subscriber.last {
                continue;
            }
            // A closed receiver is already being released by its Drop
            if subscriber.sender.unbounded_send(Ok(current.clone())).is_ok() {
                self.stats.snapshots_delivered += 1;
            }
            subscriber.last = current;
        }
    }

    fn document_count(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }
}

/// In-memory [`LiveStore`].
///
/// # Examples
///
/// ```rust
/// use geostream::{GeoPoint, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// let point = GeoPoint::new(37.7749, -122.4194)?;
/// store.set("places", "sf", json!({ "name": "SF", "point": point.to_value() }))?;
/// assert_eq!(store.len("places"), 1);
/// # Ok::<(), geostream::GeoError>(())
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document. `data` must be a JSON object.
    pub fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let data: Map<String, Value> = serde_json::from_value(data)?;
        let mut inner = self.inner.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        inner.stats.writes += 1;
        inner.stats.document_count = inner.document_count();
        inner.publish(collection);
        Ok(())
    }

    /// Inserts a document under a fresh random id and returns the id.
    pub fn add(&self, collection: &str, data: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.set(collection, &id, data)?;
        Ok(id)
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let inner = self.inner.lock();
        inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone()))
    }

    /// Removes a document and returns it if it existed.
    pub fn delete(&self, collection: &str, id: &str) -> Option<Document> {
        let mut inner = self.inner.lock();
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))?;
        inner.stats.writes += 1;
        inner.stats.document_count = inner.document_count();
        inner.publish(collection);
        Some(Document::new(id, removed))
    }

    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Number of subscriptions currently open.
    pub fn active_subscriptions(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.lock().stats.clone()
    }

    /// Ends every open subscription stream. Subscribers see end-of-stream.
    pub fn close_subscriptions(&self) {
        let inner = self.inner.lock();
        for subscriber in inner.subscribers.values() {
            subscriber.sender.close_channel();
        }
    }
}

impl LiveStore for MemoryStore {
    fn subscribe(&self, query: &RangeQuery) -> std::result::Result<SnapshotStream, StoreError> {
        let (sender, receiver) = mpsc::unbounded();

        let mut inner = self.inner.lock();
        let initial = snapshot(&inner.collections, query);
        sender.unbounded_send(Ok(initial.clone()))?;

        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        inner.subscribers.insert(
            id,
            Subscriber {
                query: query.clone(),
                sender,
                last: initial,
            },
        );
        inner.stats.subscriptions_opened += 1;
        inner.stats.snapshots_delivered += 1;
        log::trace!("opened subscription {} on {:?}", id, query);

        Ok(MemorySubscription {
            id,
            receiver,
            store: Arc::downgrade(&self.inner),
        }
        .boxed())
    }
}

struct MemorySubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<std::result::Result<Vec<Document>, StoreError>>,
    store: Weak<Mutex<StoreInner>>,
}

impl Stream for MemorySubscription {
    type Item = std::result::Result<Vec<Document>, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            let mut inner = inner.lock();
            if inner.subscribers.remove(&self.id).is_some() {
                inner.stats.subscriptions_released += 1;
                log::trace!("released subscription {}", self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::GeoPoint;
    use futures::FutureExt;
    use serde_json::json;

    fn place(lat: f64, lng: f64) -> Value {
        json!({ "point": GeoPoint::new(lat, lng).unwrap().to_value() })
    }

    #[test]
    fn test_basic_ops() {
        let store = MemoryStore::new();
        store.set("places", "a", place(1.0, 1.0)).unwrap();
        let id = store.add("places", place(2.0, 2.0)).unwrap();

        assert_eq!(store.len("places"), 2);
        assert!(store.get("places", &id).is_some());
        assert!(store.get("places", "missing").is_none());
        assert!(store.delete("places", "a").is_some());
        assert!(store.delete("places", "a").is_none());
        assert_eq!(store.len("places"), 1);
        assert!(store.is_empty("other"));

        let stats = store.stats();
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.document_count, 1);
    }

    #[test]
    fn test_rejects_non_object() {
        let store = MemoryStore::new();
        assert!(store.set("places", "a", json!("nope")).is_err());
    }

    #[test]
    fn test_subscription_receives_initial_and_updates() {
        let store = MemoryStore::new();
        let sf = GeoPoint::new(37.7749, -122.4194).unwrap();
        store.set("places", "sf", place(37.7749, -122.4194)).unwrap();
        store.set("places", "nyc", place(40.7128, -74.0060)).unwrap();

        let query = RangeQuery::for_cell("places", "point", sf.cell(4));
        let mut stream = store.subscribe(&query).unwrap();

        let initial = stream.next().now_or_never().unwrap().unwrap().unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].id, "sf");

        // Writes outside the range do not produce a snapshot
        store.set("places", "nyc", place(40.7, -74.0)).unwrap();
        assert!(stream.next().now_or_never().is_none());

        store.set("places", "sf2", place(37.7750, -122.4195)).unwrap();
        let update = stream.next().now_or_never().unwrap().unwrap().unwrap();
        assert_eq!(update.len(), 2);

        store.delete("places", "sf");
        let update = stream.next().now_or_never().unwrap().unwrap().unwrap();
        assert_eq!(update.len(), 1);
        assert_eq!(update[0].id, "sf2");
    }

    #[test]
    fn test_snapshot_ordered_by_field_then_id() {
        let store = MemoryStore::new();
        store.set("places", "b", place(10.0, 10.0)).unwrap();
        store.set("places", "a", place(10.0, 10.0)).unwrap();
        store.set("places", "c", place(10.0001, 10.0)).unwrap();

        let cell = GeoPoint::new(10.0, 10.0).unwrap().cell(3).to_string();
        let query = RangeQuery::for_cell("places", "point", &cell);
        let mut stream = store.subscribe(&query).unwrap();
        let docs = stream.next().now_or_never().unwrap().unwrap().unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();

        let code_c = GeoPoint::new(10.0001, 10.0).unwrap().geohash().to_string();
        let code_a = GeoPoint::new(10.0, 10.0).unwrap().geohash().to_string();
        if code_a <= code_c {
            assert_eq!(ids, vec!["a", "b", "c"]);
        } else {
            assert_eq!(ids, vec!["c", "a", "b"]);
        }
    }

    #[test]
    fn test_drop_releases_subscription() {
        let store = MemoryStore::new();
        let query = RangeQuery::for_cell("places", "point", "9q");
        let a = store.subscribe(&query).unwrap();
        let b = store.subscribe(&query).unwrap();
        assert_eq!(store.active_subscriptions(), 2);

        drop(a);
        assert_eq!(store.active_subscriptions(), 1);
        drop(b);
        assert_eq!(store.active_subscriptions(), 0);

        let stats = store.stats();
        assert_eq!(stats.subscriptions_opened, 2);
        assert_eq!(stats.subscriptions_released, 2);
    }

    #[test]
    fn test_close_subscriptions_ends_streams() {
        let store = MemoryStore::new();
        let query = RangeQuery::for_cell("places", "point", "9q");
        let mut stream = store.subscribe(&query).unwrap();
        assert!(stream.next().now_or_never().unwrap().is_some());

        store.close_subscriptions();
        assert!(matches!(stream.next().now_or_never(), Some(None)));
    }
}

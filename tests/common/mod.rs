#![allow(dead_code)]

use futures::StreamExt;
use futures::channel::mpsc;
use geostream::{Document, GeoPoint, LiveStore, RangeQuery, SnapshotStream, StoreError};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// The point `distance_km` away from `from` along the initial `bearing_deg`.
pub fn offset(from: &GeoPoint, bearing_deg: f64, distance_km: f64) -> GeoPoint {
    let lat1 = from.latitude().to_radians();
    let lng1 = from.longitude().to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
    let lng2 = (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;

    GeoPoint::new(lat2.to_degrees(), lng2).unwrap()
}

/// A document body storing `point` under `"point"`.
pub fn place(name: &str, point: &GeoPoint) -> Value {
    json!({ "name": name, "point": point.to_value() })
}

pub fn sf() -> GeoPoint {
    GeoPoint::new(37.7749, -122.4194).unwrap()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

type Sender = mpsc::UnboundedSender<Result<Vec<Document>, StoreError>>;

/// A store whose subscriptions are driven by hand.
#[derive(Default)]
pub struct ChannelStore {
    subscriptions: Mutex<Vec<(RangeQuery, Sender)>>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribed(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn queries(&self) -> Vec<RangeQuery> {
        self.subscriptions
            .lock()
            .iter()
            .map(|(query, _)| query.clone())
            .collect()
    }

    pub fn send(&self, cell: usize, docs: Vec<Document>) {
        self.subscriptions.lock()[cell]
            .1
            .unbounded_send(Ok(docs))
            .unwrap();
    }

    pub fn send_all_empty(&self) {
        for cell in 0..self.subscribed() {
            self.send(cell, Vec::new());
        }
    }

    pub fn fail(&self, cell: usize, message: &str) {
        let _ = self.subscriptions.lock()[cell]
            .1
            .unbounded_send(Err(message.to_string().into()));
    }

    pub fn end(&self, cell: usize) {
        self.subscriptions.lock()[cell].1.close_channel();
    }

    /// Subscriptions whose receiving side is still alive.
    pub fn open_count(&self) -> usize {
        self.subscriptions
            .lock()
            .iter()
            .filter(|(_, sender)| !sender.is_closed())
            .count()
    }
}

impl LiveStore for ChannelStore {
    fn subscribe(&self, query: &RangeQuery) -> Result<SnapshotStream, StoreError> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscriptions.lock().push((query.clone(), sender));
        Ok(receiver.boxed())
    }
}

pub fn doc(id: &str, point: &GeoPoint) -> Document {
    Document::from_value(id, place(id, point)).unwrap()
}

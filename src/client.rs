//! Client facade: binds a live store and hands out collection references.

use crate::compute::geodesy;
use crate::config::GeoQueryOptions;
use crate::error::Result;
use crate::point::GeoPoint;
use crate::query::GeoQuery;
use crate::storage::LiveStore;
use std::sync::Arc;

/// Entry point bound to a live store.
///
/// ```ignore
/// use geostream::{GeoQueryOptions, MemoryStore};
///
/// let geo = geostream::init(std::sync::Arc::new(MemoryStore::new()));
/// let center = geo.point(37.7749, -122.4194)?;
/// let nearby = geo.query("places").within(&center, 5.0, "position", GeoQueryOptions::default())?;
/// ```
pub struct GeoClient<S: LiveStore + ?Sized> {
    store: Arc<S>,
}

/// Binds a client to `store`.
pub fn init<S: LiveStore + ?Sized>(store: Arc<S>) -> GeoClient<S> {
    GeoClient::new(store)
}

impl<S: LiveStore + ?Sized> GeoClient<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// A reference to a named collection. Nothing is read until a query runs.
    pub fn query(&self, collection: &str) -> GeoCollection<S> {
        GeoCollection {
            store: Arc::clone(&self.store),
            name: collection.to_string(),
        }
    }

    /// Builds a validated point with its 9-character code.
    pub fn point(&self, latitude: f64, longitude: f64) -> Result<GeoPoint> {
        GeoPoint::new(latitude, longitude)
    }

    /// Great-circle distance in kilometers.
    pub fn distance(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        geodesy::distance(from.to_point(), to.to_point())
    }

    /// Initial bearing in degrees, [0, 360).
    pub fn bearing(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        geodesy::bearing(from.to_point(), to.to_point())
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: LiveStore + ?Sized> Clone for GeoClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// A named collection whose documents store points under some field.
pub struct GeoCollection<S: LiveStore + ?Sized> {
    store: Arc<S>,
    name: String,
}

impl<S: LiveStore + ?Sized> GeoCollection<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts a live search for documents whose `field` point lies within
    /// `radius_km` of `center`.
    pub fn within(
        &self,
        center: &GeoPoint,
        radius_km: f64,
        field: &str,
        options: GeoQueryOptions,
    ) -> Result<GeoQuery> {
        GeoQuery::open(self.store.as_ref(), &self.name, center, radius_km, field, options)
    }
}

impl<S: LiveStore + ?Sized> Clone for GeoCollection<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
        }
    }
}

impl<S: LiveStore + ?Sized> std::fmt::Debug for GeoCollection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoCollection")
            .field("name", &self.name)
            .finish()
    }
}

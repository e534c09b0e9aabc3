//! Live geographic radius queries over a document store that only supports
//! ordered range queries on a string field.
//!
//! Points are stored with a base-32 geohash. A radius search covers the
//! center cell and its neighbors with prefix range queries, merges their live
//! snapshots, and emits the hits within the radius ordered by distance.
//!
//! ```rust
//! use futures::FutureExt;
//! use geostream::{GeoQueryOptions, MemoryStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! let geo = geostream::init(Arc::new(store.clone()));
//!
//! let ferry = geo.point(37.7955, -122.3937)?;
//! store.set("places", "ferry", json!({ "name": "Ferry Building", "position": ferry.to_value() }))?;
//!
//! let center = geo.point(37.7749, -122.4194)?;
//! let query = geo
//!     .query("places")
//!     .within(&center, 5.0, "position", GeoQueryOptions::default())?;
//!
//! let hits = geostream::get(query).now_or_never().unwrap()?;
//! assert_eq!(hits[0].id(), "ferry");
//! # Ok::<(), geostream::GeoError>(())
//! ```

pub mod client;
pub mod compute;
pub mod config;
pub mod error;
pub mod point;
pub mod query;
pub mod storage;

pub use client::{GeoClient, GeoCollection, init};
pub use config::{DEFAULT_BUFFER_FACTOR, GeoQueryOptions, Units};
pub use error::{GeoError, Result};
pub use point::{GeoPoint, LatLng};
pub use query::{CancelHandle, GeoQuery, Hit, HitMetadata, get};
pub use storage::{Document, LiveStore, MemoryStore, RangeQuery, SnapshotStream, StoreError};

pub use compute::codec::{decode, encode, neighbors};
pub use compute::geodesy::{bearing, distance};
pub use compute::geojson::to_geojson;
pub use compute::precision::{precision_for_circle, precision_for_radius};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{GeoClient, GeoCollection, GeoError, GeoPoint, GeoQuery, Result, init};

    pub use crate::{GeoQueryOptions, Units};

    pub use crate::{Document, Hit, HitMetadata, LiveStore, MemoryStore};

    pub use crate::query::get;

    pub use futures::StreamExt;
}

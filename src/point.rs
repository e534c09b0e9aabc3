//! Points as stored on documents.

use crate::compute::codec::{self, POINT_PRECISION};
use crate::compute::validation::validate_lat_lng;
use crate::error::{GeoError, Result};
use serde::{Deserialize, Serialize};

/// Raw latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// A point plus its location code at [`POINT_PRECISION`].
///
/// Serializes as `{"geopoint": {"latitude": .., "longitude": ..}, "geohash": ".."}`,
/// the shape the range queries expect under a document field.
///
/// # Examples
///
/// ```
/// use geostream::GeoPoint;
///
/// let sf = GeoPoint::new(37.7749, -122.4194)?;
/// assert_eq!(sf.geohash().len(), 9);
/// assert_eq!(sf.cell(4), &sf.geohash()[..4]);
/// # Ok::<(), geostream::GeoError>(())
/// ```
///
/// Deserializing checks the coordinates and that the stored code is the one
/// they encode to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredPoint")]
pub struct GeoPoint {
    geopoint: LatLng,
    geohash: String,
}

/// Unchecked wire form of a [`GeoPoint`].
#[derive(Deserialize)]
struct StoredPoint {
    geopoint: LatLng,
    geohash: String,
}

impl TryFrom<StoredPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(stored: StoredPoint) -> Result<Self> {
        let point = GeoPoint::new(stored.geopoint.latitude, stored.geopoint.longitude)?;
        if point.geohash != stored.geohash {
            return Err(GeoError::invalid_code(
                &stored.geohash,
                format!("does not match coordinates, expected {}", point.geohash),
            ));
        }
        Ok(point)
    }
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        validate_lat_lng(latitude, longitude)?;
        let geohash = codec::encode(latitude, longitude, POINT_PRECISION)?;
        Ok(Self {
            geopoint: LatLng {
                latitude,
                longitude,
            },
            geohash,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.geopoint.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.geopoint.longitude
    }

    pub fn lat_lng(&self) -> LatLng {
        self.geopoint
    }

    pub fn geohash(&self) -> &str {
        &self.geohash
    }

    /// The code truncated to `precision` characters (clamped to the stored length).
    pub fn cell(&self, precision: usize) -> &str {
        &self.geohash[..precision.min(self.geohash.len())]
    }

    /// As a `geo::Point` (x = longitude, y = latitude).
    pub fn to_point(&self) -> geo::Point {
        geo::Point::new(self.geopoint.longitude, self.geopoint.latitude)
    }

    /// JSON form for storing on a document field.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "geopoint": {
                "latitude": self.geopoint.latitude,
                "longitude": self.geopoint.longitude,
            },
            "geohash": self.geohash,
        })
    }
}

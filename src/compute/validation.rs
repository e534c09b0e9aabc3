//! Validation for geographic coordinates and search radii.

use crate::error::{GeoError, Result};

/// Validates a latitude/longitude pair.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use geostream::compute::validation::validate_lat_lng;
///
/// assert!(validate_lat_lng(40.7128, -74.0060).is_ok());
/// assert!(validate_lat_lng(95.0, -74.0).is_err());
/// assert!(validate_lat_lng(40.0, 200.0).is_err());
/// ```
pub fn validate_lat_lng(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() {
        return Err(GeoError::InvalidCoordinate(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lng.is_finite() {
        return Err(GeoError::InvalidCoordinate(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::InvalidCoordinate(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(GeoError::InvalidCoordinate(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    Ok(())
}

/// Validates a search radius in kilometers. Zero is allowed and matches only
/// points at the center (plus the buffer slack).
pub fn validate_radius(radius_km: f64) -> Result<()> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(GeoError::InvalidRadius(radius_km));
    }
    Ok(())
}

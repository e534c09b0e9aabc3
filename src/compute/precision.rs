//! Radius to code-length selection.
//!
//! A search covers the center cell plus its ring of neighbors, so the circle
//! is contained as long as the radius does not exceed the smaller side of one
//! cell. The table below lists that smaller side, at the equator, for each
//! code length a stored point can be truncated to. Away from the equator
//! cells narrow east-west, so [`precision_for_circle`] refines the table
//! choice against the actual cell at the search latitude.

use crate::compute::codec::{self, POINT_PRECISION};
use crate::error::Result;

/// Mean Earth radius used by the haversine model, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Length of one degree of latitude (or of longitude at the equator).
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// (code length, smaller cell side in km), finest first. Values are rounded
/// down from [`cell_dimensions_km`].
pub const CELL_SIZE_TABLE: [(usize, f64); 9] = [
    (9, 0.00477),
    (8, 0.019),
    (7, 0.152),
    (6, 0.61),
    (5, 4.88),
    (4, 19.5),
    (3, 156.0),
    (2, 625.0),
    (1, 5003.0),
];

/// Width and height of a cell at the equator, in kilometers.
pub fn cell_dimensions_km(precision: usize) -> (f64, f64) {
    let bits = 5 * precision as i32;
    let lng_bits = (bits + 1) / 2;
    let lat_bits = bits / 2;

    let width = 360.0 / 2f64.powi(lng_bits) * KM_PER_DEGREE;
    let height = 180.0 / 2f64.powi(lat_bits) * KM_PER_DEGREE;
    (width, height)
}

/// Picks the longest code length whose cells are strictly larger than
/// `radius_km`.
///
/// Larger radii give shorter codes. A radius exactly on a table edge takes the
/// shorter code. Radii past the coarsest entry return 1.
///
/// # Examples
///
/// ```
/// use geostream::compute::precision::precision_for_radius;
///
/// assert_eq!(precision_for_radius(0.001), 9);
/// assert_eq!(precision_for_radius(5.0), 4);
/// assert_eq!(precision_for_radius(50.0), 3);
/// assert_eq!(precision_for_radius(10_000.0), 1);
/// ```
pub fn precision_for_radius(radius_km: f64) -> usize {
    CELL_SIZE_TABLE
        .iter()
        .find(|(_, size)| radius_km < *size)
        .map(|(precision, _)| (*precision).min(POINT_PRECISION))
        .unwrap_or(1)
}

/// Picks the code length for a circle of `radius_km` around (`lat`, `lng`).
///
/// Starts from [`precision_for_radius`] and shortens the code while the cell
/// containing the center is not strictly larger than the radius, measuring
/// its width at the most poleward latitude the circle reaches. Stops at 1.
///
/// # Examples
///
/// ```
/// use geostream::compute::precision::{precision_for_circle, precision_for_radius};
///
/// assert_eq!(precision_for_circle(0.0, 0.0, 4.5)?, precision_for_radius(4.5));
/// assert_eq!(precision_for_circle(37.7749, -122.4194, 4.5)?, 4);
/// # Ok::<(), geostream::GeoError>(())
/// ```
pub fn precision_for_circle(lat: f64, lng: f64, radius_km: f64) -> Result<usize> {
    let poleward = (lat.abs() + radius_km / KM_PER_DEGREE).min(90.0);
    let shrink = poleward.to_radians().cos();

    let mut precision = precision_for_radius(radius_km);
    while precision > 1 {
        let cell = codec::decode_bbox(&codec::encode(lat, lng, precision)?)?;
        let width = cell.width() * KM_PER_DEGREE * shrink;
        let height = cell.height() * KM_PER_DEGREE;
        if width > radius_km && height > radius_km {
            break;
        }
        precision -= 1;
    }
    Ok(precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_never_exceeds_real_cell_size() {
        for (precision, size) in CELL_SIZE_TABLE {
            let (w, h) = cell_dimensions_km(precision);
            assert!(size <= w.min(h), "precision {}: {} > {}", precision, size, w.min(h));
            // And not needlessly small
            assert!(size > w.min(h) * 0.98, "precision {}", precision);
        }
    }

    #[test]
    fn test_known_cell_dimensions() {
        let (w, h) = cell_dimensions_km(5);
        assert!((w - 4.89).abs() < 0.01);
        assert!((h - 4.89).abs() < 0.01);

        let (w, h) = cell_dimensions_km(4);
        assert!((w - 39.1).abs() < 0.1);
        assert!((h - 19.5).abs() < 0.1);
    }

    #[test]
    fn test_monotone_in_radius() {
        let mut previous = usize::MAX;
        let mut radius = 0.0;
        while radius < 20_000.0 {
            let precision = precision_for_radius(radius);
            assert!(precision <= previous, "radius {} gave {}", radius, precision);
            assert!((1..=POINT_PRECISION).contains(&precision));
            previous = precision;
            radius = radius * 1.1 + 0.0005;
        }
    }

    #[test]
    fn test_edges_round_to_shorter_code() {
        assert_eq!(precision_for_radius(4.87), 5);
        assert_eq!(precision_for_radius(4.88), 4);
        assert_eq!(precision_for_radius(19.5), 3);
        assert_eq!(precision_for_radius(5003.0), 1);
    }

    #[test]
    fn test_cell_covers_radius() {
        for radius in [0.0, 0.003, 0.1, 1.0, 5.0, 42.0, 300.0, 2_000.0] {
            let precision = precision_for_radius(radius);
            let (w, h) = cell_dimensions_km(precision);
            assert!(w.min(h) > radius || precision == 1);
        }
    }

    #[test]
    fn test_circle_matches_table_at_equator() {
        for radius in [0.0, 0.1, 1.0, 4.5, 100.0] {
            assert_eq!(
                precision_for_circle(0.0, 0.0, radius).unwrap(),
                precision_for_radius(radius)
            );
        }
    }

    #[test]
    fn test_circle_shortens_code_at_mid_latitude() {
        // At ~38 degrees a length-5 cell is only ~3.9 km wide
        assert_eq!(precision_for_radius(4.5), 5);
        assert_eq!(precision_for_circle(37.7749, -122.4194, 4.5).unwrap(), 4);
        assert_eq!(precision_for_circle(-37.7749, 145.0, 4.5).unwrap(), 4);
        // Small radii keep the table choice
        assert_eq!(precision_for_circle(37.7749, -122.4194, 1.0).unwrap(), 5);
    }

    #[test]
    fn test_circle_cell_is_wide_enough() {
        for lat in [0.0, 23.5, 45.0, 60.0, 75.0] {
            for radius in [0.002, 0.5, 3.0, 4.5, 18.0, 150.0] {
                let precision = precision_for_circle(lat, 10.0, radius).unwrap();
                if precision == 1 {
                    continue;
                }
                let cell = codec::decode_bbox(&codec::encode(lat, 10.0, precision).unwrap()).unwrap();
                let poleward = (lat + radius / KM_PER_DEGREE).to_radians();
                assert!(cell.width() * KM_PER_DEGREE * poleward.cos() > radius);
                assert!(cell.height() * KM_PER_DEGREE > radius);
            }
        }
    }

    #[test]
    fn test_circle_reaching_pole_falls_back_to_shortest() {
        assert_eq!(precision_for_circle(89.9, 45.0, 50.0).unwrap(), 1);
        assert!(precision_for_circle(95.0, 0.0, 1.0).is_err());
    }
}

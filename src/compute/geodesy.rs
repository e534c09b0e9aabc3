//! Great-circle distance and bearing, using the geo crate's haversine model.

use geo::{Bearing, Distance, Haversine, Point};

/// Haversine distance between two points in kilometers.
///
/// Points are `geo::Point`s with x = longitude and y = latitude.
///
/// # Examples
///
/// ```rust
/// use geostream::compute::geodesy::distance;
/// use geo::Point;
///
/// let nyc = Point::new(-74.0060, 40.7128);
/// let la = Point::new(-118.2437, 34.0522);
/// let km = distance(nyc, la);
/// assert!(km > 3_900.0 && km < 4_000.0);
/// ```
pub fn distance(from: Point, to: Point) -> f64 {
    Haversine.distance(from, to) / 1000.0
}

/// Initial great-circle bearing from `from` to `to`, in degrees within [0, 360).
/// 0 is north, 90 is east.
pub fn bearing(from: Point, to: Point) -> f64 {
    let degrees = Haversine.bearing(from, to).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if degrees >= 360.0 { 0.0 } else { degrees }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Point::new(-122.4194, 37.7749);
        assert!(distance(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!((distance(a, b) - 111.195).abs() < 0.01);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let sf = Point::new(-122.4194, 37.7749);
        let tokyo = Point::new(139.6917, 35.6895);
        assert!((distance(sf, tokyo) - distance(tokyo, sf)).abs() < 1e-6);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = Point::new(0.0, 0.0);
        assert!(bearing(origin, Point::new(0.0, 1.0)).abs() < 1e-6);
        assert!((bearing(origin, Point::new(1.0, 0.0)) - 90.0).abs() < 1e-6);
        assert!((bearing(origin, Point::new(0.0, -1.0)) - 180.0).abs() < 1e-6);
        assert!((bearing(origin, Point::new(-1.0, 0.0)) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_range() {
        let sf = Point::new(-122.4194, 37.7749);
        for target in [
            Point::new(-122.5, 37.7),
            Point::new(-122.3, 37.9),
            Point::new(179.0, -40.0),
        ] {
            let b = bearing(sf, target);
            assert!((0.0..360.0).contains(&b));
        }
    }
}

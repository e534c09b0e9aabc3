//! Location codec: prefix-comparable base-32 geohash strings.
//!
//! A code interleaves longitude and latitude bisections (longitude first),
//! five bits per character. Codes sharing a prefix share a cell, so a cell's
//! contents form one contiguous range in any index ordered by the code.
//!
//! ```text
//!   precision 1  "9"          45.0°  x 45.0°
//!   precision 5  "9q8yy"      0.044° x 0.044°
//!   precision 9  "9q8yyk8yt"  ~4.8 m x 4.8 m
//! ```

use crate::compute::validation::validate_lat_lng;
use crate::error::{GeoError, Result};
use smallvec::SmallVec;

/// The geohash alphabet, in sort order.
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest code the codec accepts.
pub const MAX_PRECISION: usize = 12;

/// Code length stored on every point.
pub const POINT_PRECISION: usize = 9;

/// Sorts after every character of [`BASE32`], so `prefix + '~'` bounds a prefix range.
pub const RANGE_SENTINEL: char = '~';

/// One of the eight compass directions around a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// (latitude, longitude) step in cell units.
    fn offsets(self) -> (f64, f64) {
        match self {
            Direction::N => (1.0, 0.0),
            Direction::NE => (1.0, 1.0),
            Direction::E => (0.0, 1.0),
            Direction::SE => (-1.0, 1.0),
            Direction::S => (-1.0, 0.0),
            Direction::SW => (-1.0, -1.0),
            Direction::W => (0.0, -1.0),
            Direction::NW => (1.0, -1.0),
        }
    }
}

fn check_precision(precision: usize) -> Result<()> {
    if !(1..=MAX_PRECISION).contains(&precision) {
        return Err(GeoError::InvalidPrecision(precision));
    }
    Ok(())
}

fn check_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(GeoError::invalid_code(code, "code is empty"));
    }
    if code.len() > MAX_PRECISION {
        return Err(GeoError::invalid_code(
            code,
            format!("code is longer than {} characters", MAX_PRECISION),
        ));
    }
    if let Some(c) = code
        .chars()
        .find(|c| !c.is_ascii() || !BASE32.contains(&(*c as u8)))
    {
        return Err(GeoError::invalid_code(
            code,
            format!("character {:?} is not in the base-32 alphabet", c),
        ));
    }
    Ok(())
}

/// Returns true if `code` is a well-formed location code.
pub fn is_valid(code: &str) -> bool {
    check_code(code).is_ok()
}

/// Encodes a latitude/longitude pair into a code of `precision` characters.
///
/// # Examples
///
/// ```
/// use geostream::compute::codec::encode;
///
/// let sf = encode(37.7749, -122.4194, 9)?;
/// assert_eq!(sf.len(), 9);
/// assert!(sf.starts_with(&encode(37.7749, -122.4194, 4)?));
/// # Ok::<(), geostream::GeoError>(())
/// ```
pub fn encode(lat: f64, lng: f64, precision: usize) -> Result<String> {
    validate_lat_lng(lat, lng)?;
    check_precision(precision)?;

    geohash::encode(geohash::Coord { x: lng, y: lat }, precision)
        .map_err(|e| GeoError::InvalidCoordinate(e.to_string()))
}

/// Returns the extent of the cell a code identifies (x = longitude, y = latitude).
pub fn decode_bbox(code: &str) -> Result<geohash::Rect<f64>> {
    check_code(code)?;
    geohash::decode_bbox(code).map_err(|e| GeoError::invalid_code(code, e.to_string()))
}

/// Decodes a code to the (latitude, longitude) center of its cell.
pub fn decode(code: &str) -> Result<(f64, f64)> {
    let center = decode_bbox(code)?.center();
    Ok((center.y, center.x))
}

/// Returns the adjacent cell in `direction`, at the same precision.
///
/// Longitude wraps across the anti-meridian. Latitude does not wrap: stepping
/// north from the top row (or south from the bottom row) yields `None`.
pub fn neighbor(code: &str, direction: Direction) -> Result<Option<String>> {
    let bbox = decode_bbox(code)?;
    let center = bbox.center();
    let (dlat, dlng) = direction.offsets();

    let lat = center.y + dlat * bbox.height();
    if !(-90.0..=90.0).contains(&lat) {
        return Ok(None);
    }

    let mut lng = center.x + dlng * bbox.width();
    if lng > 180.0 {
        lng -= 360.0;
    } else if lng < -180.0 {
        lng += 360.0;
    }

    encode(lat, lng, code.len()).map(Some)
}

/// Returns the distinct cells surrounding `code` at the same precision.
///
/// Away from the poles this is exactly eight cells. In the top or bottom row
/// the three cells past the pole do not exist and are omitted. The result never
/// contains `code` itself or duplicates.
pub fn neighbors(code: &str) -> Result<SmallVec<[String; 8]>> {
    let mut cells: SmallVec<[String; 8]> = SmallVec::new();
    for direction in Direction::ALL {
        if let Some(cell) = neighbor(code, direction)?
            && cell != code
            && !cells.contains(&cell)
        {
            cells.push(cell);
        }
    }
    Ok(cells)
}

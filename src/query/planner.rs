//! Covering-set planning.
//!
//! A circular search becomes the center cell plus its distinct neighbors at
//! the precision chosen for the radius and latitude, each of which maps to
//! one range query.

use crate::compute::codec;
use crate::compute::precision::precision_for_circle;
use crate::compute::validation::validate_radius;
use crate::error::Result;
use crate::point::GeoPoint;
use crate::storage::RangeQuery;

/// The cells covering one search circle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoveringPlan {
    pub precision: usize,
    pub center_cell: String,
    /// Distinct cells, center first.
    pub cells: Vec<String>,
}

impl CoveringPlan {
    /// One range query per cell over `<field>.geohash` in `collection`.
    pub fn range_queries(&self, collection: &str, field: &str) -> Vec<RangeQuery> {
        self.cells
            .iter()
            .map(|cell| RangeQuery::for_cell(collection, field, cell))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Plans the covering set for a circle of `radius_km` around `center`.
///
/// Fails before anything is subscribed if the radius or the center
/// coordinates are invalid.
///
/// # Examples
///
/// ```
/// use geostream::GeoPoint;
/// use geostream::query::planner::plan;
///
/// let center = GeoPoint::new(37.7749, -122.4194)?;
/// let covering = plan(&center, 5.0)?;
/// assert_eq!(covering.precision, 4);
/// assert_eq!(covering.cells.len(), 9);
/// assert_eq!(covering.cells[0], &center.geohash()[..4]);
/// # Ok::<(), geostream::GeoError>(())
/// ```
pub fn plan(center: &GeoPoint, radius_km: f64) -> Result<CoveringPlan> {
    validate_radius(radius_km)?;
    let precision = precision_for_circle(center.latitude(), center.longitude(), radius_km)?;
    let center_cell = codec::encode(center.latitude(), center.longitude(), precision)?;

    let mut cells = Vec::with_capacity(9);
    cells.push(center_cell.clone());
    for cell in codec::neighbors(&center_cell)? {
        if !cells.contains(&cell) {
            cells.push(cell);
        }
    }

    log::debug!(
        "planned {} cells at precision {} for radius {} km around {}",
        cells.len(),
        precision,
        radius_km,
        center_cell
    );

    Ok(CoveringPlan {
        precision,
        center_cell,
        cells,
    })
}

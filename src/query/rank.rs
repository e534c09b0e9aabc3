//! Exact-distance filtering and ranking of merged hits.

use crate::compute::geodesy;
use crate::point::GeoPoint;
use crate::storage::Document;
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;

/// Distance and bearing from the query center, recomputed on every emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitMetadata {
    /// Kilometers
    pub distance: f64,
    /// Degrees clockwise from north, [0, 360)
    pub bearing: f64,
}

/// A document that matched a radius search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    #[serde(flatten)]
    pub document: Document,
    #[serde(rename = "hitMetadata")]
    pub hit_metadata: HitMetadata,
}

impl Hit {
    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn distance(&self) -> f64 {
        self.hit_metadata.distance
    }

    pub fn bearing(&self) -> f64 {
        self.hit_metadata.bearing
    }
}

/// Keeps the documents within the buffered radius and orders them by distance.
#[derive(Debug, Clone)]
pub struct RadiusFilter {
    center: geo::Point,
    radius_km: f64,
    buffer_factor: f64,
}

impl RadiusFilter {
    pub fn new(center: &GeoPoint, radius_km: f64, buffer_factor: f64) -> Self {
        Self {
            center: center.to_point(),
            radius_km,
            buffer_factor,
        }
    }

    /// The cutoff distance actually applied.
    pub fn buffered_radius(&self) -> f64 {
        self.radius_km * self.buffer_factor
    }

    /// Deduplicates `docs` by id, computes distance and bearing from the
    /// center, drops hits past the buffered radius and sorts ascending by
    /// distance.
    ///
    /// A document seen more than once (overlapping cells) keeps the position
    /// of its first occurrence and the contents of its last; the merge lists
    /// the most recently reported snapshot last. Equal distances keep that
    /// order. Documents without a readable point under `field` are
    /// skipped.
    pub fn rank(&self, field: &str, docs: Vec<Document>) -> Vec<Hit> {
        let mut unique: IndexMap<String, Document> = IndexMap::with_capacity(docs.len());
        for doc in docs {
            unique.insert(doc.id.clone(), doc);
        }

        let cutoff = self.buffered_radius();
        let mut hits: Vec<Hit> = unique
            .into_values()
            .filter_map(|document| {
                let point = match document.point(field) {
                    Ok(point) => point.to_point(),
                    Err(e) => {
                        log::warn!("Skipping document in radius search: {}", e);
                        return None;
                    }
                };

                let distance = geodesy::distance(self.center, point);
                (distance <= cutoff).then(|| Hit {
                    hit_metadata: HitMetadata {
                        distance,
                        bearing: geodesy::bearing(self.center, point),
                    },
                    document,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.hit_metadata
                .distance
                .partial_cmp(&b.hit_metadata.distance)
                .unwrap_or(Ordering::Equal)
        });
        hits
    }
}

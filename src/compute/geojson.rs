//! GeoJSON projection of ranked hits.

use crate::point::GeoPoint;
use crate::query::rank::Hit;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

fn point_geometry(point: &GeoPoint) -> Geometry {
    Geometry::new(Value::Point(vec![point.longitude(), point.latitude()]))
}

/// A Point feature carrying `properties`.
pub fn to_feature(point: &GeoPoint, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(point_geometry(point)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Projects ranked hits into a FeatureCollection of Point features, in hit
/// order. The point is read from `field` of each hit's document.
///
/// With `include_props`, each feature's properties are the hit's document
/// fields plus its id and `hitMetadata`; otherwise they are empty.
pub fn to_geojson(hits: &[Hit], field: &str, include_props: bool) -> FeatureCollection {
    let features = hits
        .iter()
        .filter_map(|hit| {
            let point = match hit.document.point(field) {
                Ok(point) => point,
                Err(e) => {
                    log::warn!("Skipping hit in GeoJSON projection: {}", e);
                    return None;
                }
            };
            let properties = if include_props {
                match serde_json::to_value(hit) {
                    Ok(serde_json::Value::Object(map)) => map,
                    _ => JsonObject::new(),
                }
            } else {
                JsonObject::new()
            };
            Some(to_feature(&point, properties))
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

//! Pure computation: location codes, geodesy, precision selection and
//! GeoJSON projection.
//!
//! Nothing here touches a store; the query layer composes these pieces.

pub mod codec;
pub mod geodesy;
pub mod geojson;
pub mod precision;
pub mod validation;

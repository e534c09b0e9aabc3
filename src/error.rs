//! Error types for geostream.

use crate::storage::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    /// A location code was empty, too long, or contained a character outside
    /// the base-32 alphabet.
    #[error("Invalid location code {code:?}: {reason}")]
    InvalidCode { code: String, reason: String },

    /// Latitude or longitude outside the valid range, or not finite.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid precision {0}: must be between 1 and 12")]
    InvalidPrecision(usize),

    #[error("Invalid radius {0}: must be a finite, non-negative distance in kilometers")]
    InvalidRadius(f64),

    #[error("Invalid query options: {0}")]
    InvalidOptions(String),

    /// The document does not carry a readable point under the queried field.
    #[error("Document {id:?} has no readable point in field {field:?}")]
    MissingPoint { id: String, field: String },

    /// One of the covering-cell live queries failed. Fatal to the whole search.
    #[error("Live query for cell {cell:?} failed: {source}")]
    UpstreamQuery {
        cell: String,
        #[source]
        source: StoreError,
    },

    /// The live sequence ended before producing a value.
    #[error("Search session closed before producing a value")]
    SessionClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;

impl GeoError {
    pub(crate) fn invalid_code(code: &str, reason: impl Into<String>) -> Self {
        GeoError::InvalidCode {
            code: code.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by a store subscription rather than by planning.
    pub fn is_upstream(&self) -> bool {
        matches!(self, GeoError::UpstreamQuery { .. })
    }
}

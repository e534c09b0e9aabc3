//! Query options for geostream
//!
//! Options are plain serializable values so they can be loaded from JSON, or
//! TOML with the `toml` feature, as well as built in code.
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Slack applied to the radius by default, to keep points that sit just past
/// a covering-cell boundary.
pub const DEFAULT_BUFFER_FACTOR: f64 = 1.02;

/// Distance units. Kilometers are the only supported unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Units {
    #[default]
    #[serde(rename = "km")]
    Kilometers,
}

/// Options for a single `within` search.
///
/// # Example
///
/// ```rust
/// use geostream::GeoQueryOptions;
///
/// let opts = GeoQueryOptions::default();
/// assert!(!opts.log);
///
/// let opts = GeoQueryOptions::from_json(r#"{ "units": "km", "log": true }"#).unwrap();
/// assert!(opts.log);
/// assert_eq!(opts.buffer_factor, 1.02);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoQueryOptions {
    #[serde(default)]
    pub units: Units,

    /// Log hit counts and elapsed time for every emission at info level
    #[serde(default)]
    pub log: bool,

    /// Multiplier applied to the radius before the exact-distance filter
    #[serde(default = "GeoQueryOptions::default_buffer_factor")]
    pub buffer_factor: f64,
}

impl GeoQueryOptions {
    const fn default_buffer_factor() -> f64 {
        DEFAULT_BUFFER_FACTOR
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn with_buffer_factor(mut self, buffer_factor: f64) -> Self {
        self.buffer_factor = buffer_factor;
        self
    }

    /// Validate option values
    pub fn validate(&self) -> Result<(), String> {
        if !self.buffer_factor.is_finite() {
            return Err("Buffer factor must be finite (not NaN or infinity)".to_string());
        }
        if self.buffer_factor < 1.0 {
            return Err("Buffer factor must be at least 1.0".to_string());
        }
        Ok(())
    }

    /// Load options from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let options: GeoQueryOptions = serde_json::from_str(json)?;
        if let Err(e) = options.validate() {
            return Err(Error::custom(e));
        }
        Ok(options)
    }

    /// Save options as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load options from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let options: GeoQueryOptions = toml::from_str(toml_str)?;
        if let Err(e) = options.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(options)
    }

    /// Save options as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for GeoQueryOptions {
    fn default() -> Self {
        Self {
            units: Units::default(),
            log: false,
            buffer_factor: DEFAULT_BUFFER_FACTOR,
        }
    }
}

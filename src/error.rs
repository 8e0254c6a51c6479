//! Error types for the session map library.

use thiserror::Error;

/// Errors produced by the fallible surfaces of the library.
///
/// Clustering and ranking themselves never fail; these cover payload
/// parsing, collation setup and the engine's request builders.
#[derive(Debug, Error)]
pub enum SessionMapError {
    #[error("invalid GeoJSON payload: {0}")]
    InvalidGeoJson(String),

    #[error("failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("collation data unavailable: {0}")]
    Collator(String),

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("no viewport has been set; call set_view before requesting an area search")]
    MissingViewport,

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionMapError>;

/// Convert `Option`s into library errors.
pub trait OptionExt<T> {
    fn ok_or_missing_viewport(self) -> Result<T>;
    fn ok_or_invalid_geojson(self, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing_viewport(self) -> Result<T> {
        self.ok_or(SessionMapError::MissingViewport)
    }

    fn ok_or_invalid_geojson(self, reason: &str) -> Result<T> {
        self.ok_or_else(|| SessionMapError::InvalidGeoJson(reason.to_string()))
    }
}

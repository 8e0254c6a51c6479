//! # Session Map
//!
//! Clustering and distance ranking for game-session map widgets.
//!
//! This library provides:
//! - Venue-keyed and proximity clustering of point features per zoom level
//! - Distance ranking of a results list from the user's location
//! - A single haversine distance shared by both
//! - GeoJSON `FeatureCollection` reading and JSON output
//! - A map engine that owns the widget state and sequences backend requests
//!
//! ## Features
//!
//! - **`synthetic`** - Enable the seeded session generator used by benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use sessionmap::{GeoPoint, PointFeature, Ranker, cluster_features};
//!
//! let features = vec![
//!     PointFeature::point(53.3498, -6.2603).with_property("venue_name", "The Hub"),
//!     PointFeature::point(53.3499, -6.2604).with_property("venue_name", "the hub "),
//!     PointFeature::point(53.2707, -9.0568).with_property("title", "Kill Team night"),
//! ];
//!
//! let clusters = cluster_features(&features, 16.0);
//! assert_eq!(clusters.len(), 2);
//!
//! let ranker = Ranker::new().unwrap();
//! let ranked = ranker.rank(&features, Some(GeoPoint::new(53.27, -9.05)));
//! assert_eq!(ranked[0].feature.title(), "Kill Team night");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SessionMapError};

// Geographic utilities (distance, bounds, labels)
pub mod geo_utils;

// Zoom-dependent clustering
pub mod clustering;
pub use clustering::{
    ClusterConfig, cluster_features, cluster_features_with_config, cluster_radius_for_zoom,
};

// Distance ranking of the results list
pub mod ranking;
pub use ranking::{RankedFeature, Ranker};

// GeoJSON reading and JSON output
pub mod geojson;
pub use geojson::{parse_feature_collection, read_feature_collection};

// Widget state, request sequencing and render passes
pub mod engine;
pub use engine::{
    EngineConfig, MapEngine, RenderPass, ResponseOrdering, SessionFilters, SessionRequest,
};

// Seeded session generator for benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate in degrees.
///
/// # Example
/// ```
/// use sessionmap::GeoPoint;
/// let point = GeoPoint::new(53.3498, -6.2603); // Dublin
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Viewport bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from the four viewport edges.
    pub fn from_edges(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            min_lat: south,
            max_lat: north,
            min_lng: west,
            max_lng: east,
        }
    }
}

/// Geometry of a feature as delivered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// A point geometry.
    Point(GeoPoint),
    /// Any other geometry type (kept, never clustered).
    Other(String),
    /// No geometry, or a point without usable coordinates.
    Missing,
}

/// One game session or venue.
///
/// Properties are an open mapping; typed accessors read the keys the
/// map cares about and fall back to an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub geometry: FeatureGeometry,
    pub properties: Map<String, Value>,
}

impl PointFeature {
    /// Create a feature with a point geometry and no properties.
    pub fn point(latitude: f64, longitude: f64) -> Self {
        Self {
            geometry: FeatureGeometry::Point(GeoPoint::new(latitude, longitude)),
            properties: Map::new(),
        }
    }

    /// Create a feature with the given geometry and properties.
    pub fn new(geometry: FeatureGeometry, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// The feature position, if it has a valid point geometry.
    pub fn position(&self) -> Option<GeoPoint> {
        match self.geometry {
            FeatureGeometry::Point(p) if p.is_valid() => Some(p),
            _ => None,
        }
    }

    /// Read a string property, treating missing and non-string values as empty.
    pub fn text(&self, key: &str) -> &str {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.text("title")
    }

    pub fn game_system(&self) -> &str {
        self.text("game_system")
    }

    pub fn venue_name(&self) -> &str {
        self.text("venue_name")
    }

    /// Venue display name (venue features carry `name` rather than `venue_name`).
    pub fn name(&self) -> &str {
        self.text("name")
    }

    /// Whether the session is accepting players. Missing reads as closed.
    pub fn is_open(&self) -> bool {
        self.properties
            .get("is_open")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Normalised venue key: trimmed and lowercased, `None` when blank.
    pub fn venue_key(&self) -> Option<String> {
        let key = normalize_key(self.venue_name().trim());
        if key.is_empty() { None } else { Some(key) }
    }
}

/// Lowercase normalisation shared by venue keying and ranking keys.
pub fn normalize_key(s: &str) -> String {
    s.to_lowercase()
}

/// A transient group of features rendered as one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<'a> {
    /// Position of the first feature placed into the cluster
    pub anchor: GeoPoint,
    /// Members in discovery order
    pub members: Vec<&'a PointFeature>,
    /// Set for venue-keyed clusters
    pub venue_key: Option<String>,
}

impl<'a> Cluster<'a> {
    pub(crate) fn start(
        anchor: GeoPoint,
        first: &'a PointFeature,
        venue_key: Option<String>,
    ) -> Self {
        Self {
            anchor,
            members: vec![first],
            venue_key,
        }
    }

    /// Number of features in the cluster.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Clusters always hold at least one member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A single-member cluster renders as a plain marker rather than a count bubble.
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    pub fn is_venue_keyed(&self) -> bool {
        self.venue_key.is_some()
    }
}

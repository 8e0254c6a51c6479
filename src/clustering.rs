//! Zoom-dependent clustering of point features.
//!
//! Two grouping rules apply in one greedy pass over the input:
//! - at fine zoom, features with a venue name group by exact venue key,
//!   regardless of distance;
//! - everything else joins the first proximity cluster whose anchor lies
//!   within the zoom's radius, or starts a new one.
//!
//! Anchors are the first member's position and never move as members are
//! added, so a cluster's marker position is stable for a given input order.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::{Cluster, PointFeature};

/// Zoom at which venue-name clustering takes over from proximity.
pub const VENUE_CLUSTER_MIN_ZOOM: f64 = 15.0;

/// Upper zoom bound (inclusive) and radius in meters for each step.
const DEFAULT_RADIUS_STEPS: [(f64, f64); 5] = [
    (4.0, 20_000.0),
    (7.0, 5_000.0),
    (10.0, 2_000.0),
    (12.0, 800.0),
    (14.0, 200.0),
];

/// Radius used above the last step.
const DEFAULT_FALLBACK_RADIUS: f64 = 50.0;

/// Configuration for clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// `(max_zoom, radius_meters)` pairs, in any order.
    /// The step with the smallest `max_zoom >= zoom` wins.
    pub radius_steps: Vec<(f64, f64)>,

    /// Radius for zoom levels beyond the last step.
    /// Default: 50.0 meters
    pub fallback_radius: f64,

    /// Zoom at and above which features group by venue name.
    /// Default: 15.0
    pub venue_min_zoom: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_steps: DEFAULT_RADIUS_STEPS.to_vec(),
            fallback_radius: DEFAULT_FALLBACK_RADIUS,
            venue_min_zoom: VENUE_CLUSTER_MIN_ZOOM,
        }
    }
}

impl ClusterConfig {
    /// Proximity radius in meters for a zoom level.
    pub fn radius_for_zoom(&self, zoom: f64) -> f64 {
        self.radius_steps
            .iter()
            .filter(|(max_zoom, _)| zoom <= *max_zoom)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, radius)| *radius)
            .unwrap_or(self.fallback_radius)
    }

    /// Whether venue-keyed clustering applies at this zoom.
    pub fn uses_venue_keys(&self, zoom: f64) -> bool {
        zoom >= self.venue_min_zoom
    }
}

/// Proximity radius in meters for a zoom level, using the default steps.
///
/// zoom ≤ 4 → 20 km, ≤ 7 → 5 km, ≤ 10 → 2 km, ≤ 12 → 800 m, ≤ 14 → 200 m, else 50 m.
pub fn cluster_radius_for_zoom(zoom: f64) -> f64 {
    ClusterConfig::default().radius_for_zoom(zoom)
}

/// Cluster features at a zoom level with the default configuration.
pub fn cluster_features(features: &[PointFeature], zoom: f64) -> Vec<Cluster<'_>> {
    cluster_features_with_config(features, zoom, &ClusterConfig::default())
}

/// Cluster features at a zoom level.
///
/// Features without a valid point geometry are skipped. Clusters come
/// back in creation order; members keep input order.
pub fn cluster_features_with_config<'a>(
    features: &'a [PointFeature],
    zoom: f64,
    config: &ClusterConfig,
) -> Vec<Cluster<'a>> {
    let radius = config.radius_for_zoom(zoom);
    let by_venue = config.uses_venue_keys(zoom);
    let mut clusters: Vec<Cluster<'a>> = Vec::new();
    let mut skipped = 0usize;

    for feature in features {
        let Some(position) = feature.position() else {
            skipped += 1;
            continue;
        };

        if by_venue {
            if let Some(key) = feature.venue_key() {
                match clusters
                    .iter()
                    .position(|c| c.venue_key.as_deref() == Some(key.as_str()))
                {
                    Some(idx) => clusters[idx].members.push(feature),
                    None => clusters.push(Cluster::start(position, feature, Some(key))),
                }
                continue;
            }
        }

        match clusters.iter().position(|c| {
            c.venue_key.is_none() && haversine_distance(&position, &c.anchor) <= radius
        }) {
            Some(idx) => clusters[idx].members.push(feature),
            None => clusters.push(Cluster::start(position, feature, None)),
        }
    }

    debug!(
        "[Clustering] zoom={} radius={}m: {} features -> {} clusters ({} skipped)",
        zoom,
        radius,
        features.len(),
        clusters.len(),
        skipped
    );

    clusters
}

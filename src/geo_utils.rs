//! Geographic utilities.
//!
//! The haversine distance here is the only distance used by the crate:
//! clustering and ranking both call it so they agree on what "close" means.

use crate::{Bounds, GeoPoint};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Minimum edge movement (degrees) before a viewport counts as moved.
pub const BOUNDS_MOVE_THRESHOLD: f64 = 0.0005;

/// Calculates great-circle distance between two points using the haversine formula.
///
/// Inputs are degrees, output is meters.
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    haversine_meters(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Raw-coordinate form of [`haversine_distance`].
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let to_rad = std::f64::consts::PI / 180.0;
    let d_lat = (lat2 - lat1) * to_rad;
    let d_lng = (lng2 - lng1) * to_rad;

    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + (lat1 * to_rad).cos() * (lat2 * to_rad).cos() * (d_lng / 2.0).sin() * (d_lng / 2.0).sin();
    // Rounding can push `a` just past 1 for near-antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Check whether a viewport moved far enough from the last fetched one
/// to offer a new area search.
pub fn bounds_moved(current: &Bounds, previous: &Bounds, threshold: f64) -> bool {
    (current.min_lng - previous.min_lng).abs() > threshold
        || (current.min_lat - previous.min_lat).abs() > threshold
        || (current.max_lng - previous.max_lng).abs() > threshold
        || (current.max_lat - previous.max_lat).abs() > threshold
}

/// Human-readable distance for the results list ("1.2 km away", "850 m away").
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km away", meters / 1000.0)
    } else {
        format!("{:.0} m away", meters)
    }
}

/// Offset a point north by the given distance in meters.
///
/// Uses the spherical relation `dlat = d / R`, which is exact for a
/// pure meridian move under the haversine model.
pub fn offset_north(point: &GeoPoint, meters: f64) -> GeoPoint {
    let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
    GeoPoint::new(point.latitude + d_lat, point.longitude)
}

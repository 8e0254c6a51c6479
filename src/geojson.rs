//! GeoJSON reading and JSON output.
//!
//! The backend delivers sessions and venues as a `FeatureCollection`.
//! Entries are decoded one at a time so a malformed feature never fails
//! the whole payload: non-object entries are dropped, and geometries
//! that are not usable points are kept as [`FeatureGeometry::Other`] or
//! [`FeatureGeometry::Missing`] for the clusterer to skip.

use std::io::Read;

use log::debug;
use serde_json::{Map, Value, json};

use crate::error::{OptionExt, Result};
use crate::ranking::RankedFeature;
use crate::{Cluster, FeatureGeometry, GeoPoint, PointFeature};

/// Parse a `FeatureCollection` payload.
///
/// A missing or null `features` member reads as an empty collection.
/// The payload itself must be a JSON object.
pub fn parse_feature_collection(payload: &str) -> Result<Vec<PointFeature>> {
    let value: Value = serde_json::from_str(payload)?;
    features_from_value(&value)
}

/// Read a `FeatureCollection` from any reader.
pub fn read_feature_collection<R: Read>(reader: R) -> Result<Vec<PointFeature>> {
    let value: Value = serde_json::from_reader(reader)?;
    features_from_value(&value)
}

/// Decode features from an already-parsed collection.
pub fn features_from_value(value: &Value) -> Result<Vec<PointFeature>> {
    let object = value
        .as_object()
        .ok_or_invalid_geojson("expected a FeatureCollection object")?;

    let entries: &[Value] = match object.get("features") {
        Some(Value::Array(entries)) => entries,
        _ => &[],
    };

    let features: Vec<PointFeature> = entries.iter().filter_map(feature_from_value).collect();

    if features.len() != entries.len() {
        debug!(
            "[GeoJSON] dropped {} of {} feature entries",
            entries.len() - features.len(),
            entries.len()
        );
    }

    Ok(features)
}

/// Decode one feature entry; `None` for entries that are not objects.
pub fn feature_from_value(value: &Value) -> Option<PointFeature> {
    let object = value.as_object()?;

    let geometry = object
        .get("geometry")
        .map(geometry_from_value)
        .unwrap_or(FeatureGeometry::Missing);

    let properties = match object.get("properties") {
        Some(Value::Object(props)) => props.clone(),
        _ => Map::new(),
    };

    Some(PointFeature::new(geometry, properties))
}

fn geometry_from_value(value: &Value) -> FeatureGeometry {
    let Some(object) = value.as_object() else {
        return FeatureGeometry::Missing;
    };

    match object.get("type").and_then(Value::as_str) {
        Some("Point") => {
            let coords = object
                .get("coordinates")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            // GeoJSON order is [longitude, latitude]
            match (
                coords.first().and_then(Value::as_f64),
                coords.get(1).and_then(Value::as_f64),
            ) {
                (Some(lng), Some(lat)) => FeatureGeometry::Point(GeoPoint::new(lat, lng)),
                _ => FeatureGeometry::Missing,
            }
        }
        Some(other) => FeatureGeometry::Other(other.to_string()),
        None => FeatureGeometry::Missing,
    }
}

/// Encode a feature as a GeoJSON `Feature`.
pub fn feature_to_value(feature: &PointFeature) -> Value {
    let geometry = match &feature.geometry {
        FeatureGeometry::Point(p) => json!({
            "type": "Point",
            "coordinates": [p.longitude, p.latitude],
        }),
        FeatureGeometry::Other(kind) => json!({ "type": kind }),
        FeatureGeometry::Missing => Value::Null,
    };

    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": feature.properties,
    })
}

/// Encode clusters for a rendering layer.
pub fn clusters_to_value(clusters: &[Cluster<'_>]) -> Value {
    Value::Array(
        clusters
            .iter()
            .map(|c| {
                json!({
                    "anchor": { "lat": c.anchor.latitude, "lng": c.anchor.longitude },
                    "count": c.len(),
                    "venue_key": c.venue_key,
                    "members": c.members.iter().map(|f| feature_to_value(f)).collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}

/// Encode a ranked results list.
pub fn ranking_to_value(ranked: &[RankedFeature<'_>]) -> Value {
    Value::Array(
        ranked
            .iter()
            .map(|r| {
                json!({
                    "feature": feature_to_value(r.feature),
                    "distance_m": r.distance_meters,
                    "distance_label": r.distance_label(),
                })
            })
            .collect(),
    )
}

//! Distance ranking for the results list.
//!
//! Sort order:
//! 1. Haversine distance from the reference point (features without a
//!    distance go after all features with one)
//! 2. Venue name, then game system, then title, compared case-insensitively
//!    with locale-aware collation; empty values sort last
//!
//! Ranking borrows its input and returns a new ordering. The sort is
//! stable, so ranking an already-ranked list leaves it unchanged.

use std::cmp::Ordering;
use std::fmt;

use icu_collator::{Collator, CollatorOptions};
use log::debug;

use crate::error::{Result, SessionMapError};
use crate::geo_utils::{format_distance, haversine_distance};
use crate::{GeoPoint, PointFeature, normalize_key};

/// One entry of a ranked results list.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature<'a> {
    pub feature: &'a PointFeature,
    /// Distance from the reference point in meters, when one could be computed
    pub distance_meters: Option<f64>,
}

impl RankedFeature<'_> {
    /// "1.2 km away" / "850 m away", or `None` without a distance.
    pub fn distance_label(&self) -> Option<String> {
        self.distance_meters.map(format_distance)
    }
}

/// Derived keys for one feature. Recomputed on every call.
struct SortKeys {
    distance: Option<f64>,
    venue: String,
    system: String,
    title: String,
}

impl SortKeys {
    fn for_feature(feature: &PointFeature, reference: Option<&GeoPoint>) -> Self {
        let distance = match (reference, feature.position()) {
            (Some(r), Some(p)) => Some(haversine_distance(r, &p)),
            _ => None,
        };
        Self {
            distance,
            venue: normalize_key(feature.venue_name()),
            system: normalize_key(feature.game_system()),
            title: normalize_key(feature.title()),
        }
    }
}

/// Orders features by distance and display keys.
///
/// Holds the collator so repeated ranking passes reuse its data.
pub struct Ranker {
    collator: Collator,
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker").finish_non_exhaustive()
    }
}

impl Ranker {
    /// Create a ranker using root-locale collation.
    pub fn new() -> Result<Self> {
        let collator = Collator::try_new(&Default::default(), CollatorOptions::new())
            .map_err(|e| SessionMapError::Collator(format!("{:?}", e)))?;
        Ok(Self { collator })
    }

    /// Compare two display strings; empty strings sort after non-empty ones.
    pub fn compare_text(&self, a: &str, b: &str) -> Ordering {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.collator.compare(a, b),
        }
    }

    fn compare_keys(&self, a: &SortKeys, b: &SortKeys) -> Ordering {
        match (a.distance, b.distance) {
            (Some(da), Some(db)) => {
                let by_distance = da.total_cmp(&db);
                if by_distance != Ordering::Equal {
                    return by_distance;
                }
            }
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }

        self.compare_text(&a.venue, &b.venue)
            .then_with(|| self.compare_text(&a.system, &b.system))
            .then_with(|| self.compare_text(&a.title, &b.title))
    }

    /// Rank features, optionally by distance from `reference`.
    ///
    /// An invalid reference point is ignored.
    pub fn rank<'a>(
        &self,
        features: &'a [PointFeature],
        reference: Option<GeoPoint>,
    ) -> Vec<RankedFeature<'a>> {
        let reference = reference.filter(GeoPoint::is_valid);

        let mut keyed: Vec<(SortKeys, &'a PointFeature)> = features
            .iter()
            .map(|f| (SortKeys::for_feature(f, reference.as_ref()), f))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| self.compare_keys(a, b));

        let ranked: Vec<RankedFeature<'a>> = keyed
            .into_iter()
            .map(|(keys, feature)| RankedFeature {
                feature,
                distance_meters: keys.distance,
            })
            .collect();

        debug!(
            "[Ranking] {} features ranked ({} with distance)",
            ranked.len(),
            ranked.iter().filter(|r| r.distance_meters.is_some()).count()
        );

        ranked
    }

    /// The `limit` nearest features to `reference`.
    pub fn nearest<'a>(
        &self,
        features: &'a [PointFeature],
        reference: GeoPoint,
        limit: usize,
    ) -> Vec<RankedFeature<'a>> {
        let mut ranked = self.rank(features, Some(reference));
        ranked.retain(|r| r.distance_meters.is_some());
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_sorts_last() {
        let ranker = Ranker::new().unwrap();
        assert_eq!(ranker.compare_text("", "zulu"), Ordering::Greater);
        assert_eq!(ranker.compare_text("alpha", ""), Ordering::Less);
        assert_eq!(ranker.compare_text("", ""), Ordering::Equal);
    }

    #[test]
    fn test_collation_is_not_byte_order() {
        let ranker = Ranker::new().unwrap();
        // Byte order puts 'é' (0xC3) after 'z'
        assert_eq!(ranker.compare_text("éire games", "zulu"), Ordering::Less);
    }
}

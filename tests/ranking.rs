//! Tests for ranking module

use sessionmap::geo_utils::{haversine_distance, offset_north};
use sessionmap::{FeatureGeometry, GeoPoint, PointFeature, RankedFeature, Ranker};
use serde_json::Map;

fn reference() -> GeoPoint {
    GeoPoint::new(53.0, -7.0)
}

fn session(title: &str, venue: &str, system: &str, meters_north: f64) -> PointFeature {
    let p = offset_north(&reference(), meters_north);
    let mut f = PointFeature::point(p.latitude, p.longitude)
        .with_property("title", title)
        .with_property("game_system", system);
    if !venue.is_empty() {
        f = f.with_property("venue_name", venue);
    }
    f
}

fn titles(ranked: &[RankedFeature<'_>]) -> Vec<String> {
    ranked.iter().map(|r| r.feature.title().to_string()).collect()
}

#[test]
fn test_closer_sessions_first() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("far", "Alpha", "40k", 9000.0),
        session("near", "Zulu", "40k", 100.0),
        session("middle", "", "40k", 2500.0),
    ];

    let ranked = ranker.rank(&features, Some(reference()));
    assert_eq!(titles(&ranked), vec!["near", "middle", "far"]);
    assert!(ranked.windows(2).all(|w| w[0].distance_meters <= w[1].distance_meters));
}

#[test]
fn test_equal_distance_broken_by_venue() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("b", "beta Club", "40k", 0.0),
        session("a", "Alpha Games", "40k", 0.0),
    ];

    let ranked = ranker.rank(&features, Some(reference()));
    assert_eq!(ranked[0].distance_meters, Some(0.0));
    assert_eq!(titles(&ranked), vec!["a", "b"]);
}

#[test]
fn test_without_reference_sorts_by_venue_system_title() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("no venue", "", "Age of Sigmar", 0.0),
        session("zeta", "Beta Club", "kill team", 0.0),
        session("alpha", "Beta Club", "Kill Team", 0.0),
        session("sigmar", "beta club", "Age of Sigmar", 0.0),
        session("first", "alpha games", "Necromunda", 0.0),
    ];

    let ranked = ranker.rank(&features, None);
    assert!(ranked.iter().all(|r| r.distance_meters.is_none()));
    assert_eq!(
        titles(&ranked),
        vec!["first", "sigmar", "alpha", "zeta", "no venue"]
    );
}

#[test]
fn test_empty_venue_sorts_after_named() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("home", "", "40k", 0.0),
        session("store", "Zzz Last Alphabetically", "40k", 0.0),
    ];

    let ranked = ranker.rank(&features, None);
    assert_eq!(titles(&ranked), vec!["store", "home"]);
}

#[test]
fn test_missing_position_sorts_after_distances() {
    let ranker = Ranker::new().unwrap();
    let mut props = Map::new();
    props.insert("title".to_string(), "nowhere".into());
    props.insert("venue_name".to_string(), "Aardvark".into());
    let features = vec![
        PointFeature::new(FeatureGeometry::Missing, props),
        session("far", "Zulu", "40k", 50_000.0),
    ];

    let ranked = ranker.rank(&features, Some(reference()));
    assert_eq!(titles(&ranked), vec!["far", "nowhere"]);
    assert_eq!(ranked[1].distance_meters, None);
}

#[test]
fn test_distance_matches_shared_haversine() {
    let ranker = Ranker::new().unwrap();
    let features = vec![session("s", "Hub", "40k", 1234.0)];

    let ranked = ranker.rank(&features, Some(reference()));
    let expected = haversine_distance(&reference(), &features[0].position().unwrap());
    assert_eq!(ranked[0].distance_meters, Some(expected));
    assert_eq!(ranked[0].distance_label().as_deref(), Some("1.2 km away"));
}

#[test]
fn test_ranking_does_not_mutate_input() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("b", "Beta", "40k", 500.0),
        session("a", "Alpha", "40k", 100.0),
    ];
    let before = features.clone();

    let _ = ranker.rank(&features, Some(reference()));
    assert_eq!(features, before);
}

#[test]
fn test_reranking_is_idempotent() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("c", "Gamma", "40k", 300.0),
        session("a", "Alpha", "AoS", 300.0),
        session("b", "", "40k", 100.0),
        session("d", "Alpha", "40k", 300.0),
    ];

    for reference in [Some(reference()), None] {
        let once: Vec<PointFeature> = ranker
            .rank(&features, reference)
            .into_iter()
            .map(|r| r.feature.clone())
            .collect();
        let twice = ranker.rank(&once, reference);
        assert_eq!(titles(&twice), once.iter().map(|f| f.title().to_string()).collect::<Vec<_>>());
    }
}

#[test]
fn test_full_ties_keep_input_order() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        session("same", "Hub", "40k", 0.0).with_property("id", 1),
        session("same", "Hub", "40k", 0.0).with_property("id", 2),
    ];

    let ranked = ranker.rank(&features, None);
    assert_eq!(ranked[0].feature.properties["id"], 1);
    assert_eq!(ranked[1].feature.properties["id"], 2);
}

#[test]
fn test_invalid_reference_ignored() {
    let ranker = Ranker::new().unwrap();
    let features = vec![session("a", "Hub", "40k", 0.0)];

    let ranked = ranker.rank(&features, Some(GeoPoint::new(f64::NAN, 0.0)));
    assert_eq!(ranked[0].distance_meters, None);
}

#[test]
fn test_nearest_limits_and_drops_unpositioned() {
    let ranker = Ranker::new().unwrap();
    let mut features: Vec<PointFeature> = (0..15)
        .map(|i| session(&format!("s{}", i), "Hub", "40k", (15 - i) as f64 * 100.0))
        .collect();
    features.push(PointFeature::new(FeatureGeometry::Missing, Map::new()));

    let nearest = ranker.nearest(&features, reference(), 10);
    assert_eq!(nearest.len(), 10);
    assert_eq!(nearest[0].feature.title(), "s14");
    assert!(nearest.iter().all(|r| r.distance_meters.is_some()));
}

#[test]
fn test_empty_input() {
    let ranker = Ranker::new().unwrap();
    assert!(ranker.rank(&[], Some(reference())).is_empty());
}

#[test]
fn test_antipodal_session_gets_a_distance() {
    let ranker = Ranker::new().unwrap();
    let features = vec![
        PointFeature::point(-87.843, -3.327).with_property("title", "antipode"),
        PointFeature::point(87.9, 176.6).with_property("title", "next door"),
    ];

    let ranked = ranker.rank(&features, Some(GeoPoint::new(87.843, 176.673)));
    assert_eq!(titles(&ranked), vec!["next door", "antipode"]);

    let far = ranked[1].distance_meters.unwrap();
    assert!(far.is_finite());
    assert_eq!(ranked[1].distance_label().as_deref(), Some("20015.1 km away"));
}

//! Synthetic session generator for benchmarking.
//!
//! Scatters sessions around a set of venues with a seeded RNG, so
//! clustering and ranking can be measured on reproducible inputs.
//!
//! Feature-gated behind `synthetic`; not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use sessionmap::synthetic::SyntheticScenario;
//! use sessionmap::GeoPoint;
//!
//! let scenario = SyntheticScenario {
//!     origin: GeoPoint::new(53.35, -6.26),
//!     session_count: 200,
//!     venue_count: 12,
//!     spread_meters: 30_000.0,
//!     venue_share: 0.7,
//!     seed: 42,
//! };
//!
//! let features = scenario.generate();
//! assert_eq!(features.len(), 200);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::{GeoPoint, PointFeature};

const SYSTEMS: [&str; 5] = [
    "Warhammer 40,000",
    "Age of Sigmar",
    "Kill Team",
    "Horus Heresy",
    "Necromunda",
];

/// Meters per degree of latitude (approximately constant).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Scenario configuration for generating synthetic sessions.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Centre of the generated area.
    pub origin: GeoPoint,
    /// Number of sessions to generate.
    pub session_count: usize,
    /// Number of distinct venues.
    pub venue_count: usize,
    /// Maximum distance from the origin in meters.
    pub spread_meters: f64,
    /// Fraction of sessions hosted at a venue (0.0-1.0); the rest are
    /// home games with no venue name.
    pub venue_share: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

fn offset(origin: &GeoPoint, distance: f64, heading: f64) -> GeoPoint {
    let d_lat = distance * heading.sin() / METERS_PER_DEG_LAT;
    let d_lng =
        distance * heading.cos() / (METERS_PER_DEG_LAT * origin.latitude.to_radians().cos());
    GeoPoint::new(origin.latitude + d_lat, origin.longitude + d_lng)
}

impl SyntheticScenario {
    /// Generate the session features.
    pub fn generate(&self) -> Vec<PointFeature> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let venues: Vec<(String, GeoPoint)> = (0..self.venue_count)
            .map(|i| {
                let distance = rng.gen_range(0.0..self.spread_meters.max(1.0));
                let heading = rng.gen_range(0.0..2.0 * PI);
                (format!("Venue {}", i + 1), offset(&self.origin, distance, heading))
            })
            .collect();

        (0..self.session_count)
            .map(|i| {
                let system = SYSTEMS[rng.gen_range(0..SYSTEMS.len())];
                let at_venue = !venues.is_empty() && rng.gen_bool(self.venue_share.clamp(0.0, 1.0));

                let (position, venue_name) = if at_venue {
                    let (name, position) = &venues[rng.gen_range(0..venues.len())];
                    (*position, Some(name.clone()))
                } else {
                    let distance = rng.gen_range(0.0..self.spread_meters.max(1.0));
                    let heading = rng.gen_range(0.0..2.0 * PI);
                    (offset(&self.origin, distance, heading), None)
                };

                let feature = PointFeature::point(position.latitude, position.longitude)
                    .with_property("id", i as u64)
                    .with_property("title", format!("Game {}", i + 1))
                    .with_property("game_system", system)
                    .with_property("is_open", rng.gen_bool(0.5));

                match venue_name {
                    Some(name) => feature.with_property("venue_name", name),
                    None => feature,
                }
            })
            .collect()
    }
}

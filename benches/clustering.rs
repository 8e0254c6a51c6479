//! Benchmarks for clustering and ranking.
//!
//! Run with: `cargo bench --features synthetic`
//!
//! Inputs come from the seeded synthetic generator, sized around what a
//! single viewport response holds (tens to a few hundred sessions).

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sessionmap::synthetic::SyntheticScenario;
use sessionmap::{GeoPoint, PointFeature, Ranker, cluster_features};

fn scenario(session_count: usize) -> Vec<PointFeature> {
    SyntheticScenario {
        origin: GeoPoint::new(53.35, -6.26),
        session_count,
        venue_count: (session_count / 8).max(1),
        spread_meters: 40_000.0,
        venue_share: 0.7,
        seed: 42,
    }
    .generate()
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");

    for count in [50, 200, 500] {
        let features = scenario(count);
        for zoom in [6.0, 11.0, 16.0] {
            group.bench_with_input(
                BenchmarkId::new(format!("zoom_{}", zoom), count),
                &features,
                |b, features| b.iter(|| cluster_features(black_box(features), zoom)),
            );
        }
    }

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let ranker = Ranker::new().expect("collation data");
    let reference = GeoPoint::new(53.34, -6.27);
    let mut group = c.benchmark_group("ranking");

    for count in [50, 200, 500] {
        let features = scenario(count);
        group.bench_with_input(
            BenchmarkId::new("with_reference", count),
            &features,
            |b, features| b.iter(|| ranker.rank(black_box(features), Some(reference))),
        );
        group.bench_with_input(
            BenchmarkId::new("names_only", count),
            &features,
            |b, features| b.iter(|| ranker.rank(black_box(features), None)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_clustering, bench_ranking);
criterion_main!(benches);

//! Spatial index benchmarks.
//!
//! Measures:
//! - Build time (validation → embedding → R-tree bulk load)
//! - Radius query latency at several radii
//! - Nearest-neighbor latency
//! - Tree vs. linear scan on small inputs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stationcov_spatial::{IndexConfig, SpatialIndex};

// ============================================================================
// Test Data Generation
// ============================================================================

/// Generate points on a jittered grid around a center, `spread_deg` wide.
fn generate_points(count: usize, center_lat: f64, center_lng: f64, spread_deg: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(count);
    let sqrt_count = (count as f64).sqrt().ceil() as usize;
    let step = spread_deg / sqrt_count as f64;

    for i in 0..count {
        let row = i / sqrt_count;
        let col = i % sqrt_count;
        // Deterministic jitter so rows do not align perfectly
        let jitter = ((i * 7919) % 100) as f64 / 100.0 * step * 0.5;
        let lat = center_lat - spread_deg / 2.0 + row as f64 * step + jitter;
        let lng = center_lng - spread_deg / 2.0 + col as f64 * step;
        points.push((lat, lng));
    }

    points
}

// ============================================================================
// Build Benchmarks
// ============================================================================

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");

    for count in [1_000, 10_000, 100_000] {
        let points = generate_points(count, 7.8731, 80.7718, 2.0);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("bulk_load", count), &points, |b, pts| {
            b.iter(|| {
                let index = SpatialIndex::build(pts).unwrap();
                black_box(index.len())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Query Benchmarks
// ============================================================================

fn bench_radius_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("radius_query");

    let points = generate_points(100_000, 7.8731, 80.7718, 2.0);
    let index = SpatialIndex::build(&points).unwrap();

    // Print selectivity before timing
    println!("\n=== Radius Query Selectivity (100k points) ===\n");
    for radius_km in [1.0, 5.0, 20.0] {
        let hits = index.radius_query(7.8731, 80.7718, radius_km).unwrap();
        println!("radius {radius_km} km: {} hits", hits.len());
    }
    println!();

    for radius_km in [1.0, 5.0, 20.0] {
        group.bench_with_input(
            BenchmarkId::new("km", radius_km as u64),
            &radius_km,
            |b, &radius_km| {
                b.iter(|| {
                    let hits = index.radius_query(7.8731, 80.7718, radius_km).unwrap();
                    black_box(hits.len())
                });
            },
        );
    }

    // Thousands of queries against the full set, as coverage precomputation does
    group.bench_function("1000_queries_5km", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for &(lat, lng) in points.iter().step_by(100) {
                total += index.radius_query(lat, lng, 5.0).unwrap().len();
            }
            black_box(total)
        });
    });

    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let points = generate_points(100_000, 7.8731, 80.7718, 2.0);
    let index = SpatialIndex::build(&points).unwrap();

    c.bench_function("nearest_100k", |b| {
        b.iter(|| black_box(index.nearest(7.5, 80.5)));
    });
}

fn bench_small_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("small_backends");
    let points = generate_points(48, 7.8731, 80.7718, 0.1);

    let linear = SpatialIndex::build(&points).unwrap();
    let tree = SpatialIndex::build_with_config(&points, &IndexConfig::tree_only()).unwrap();

    group.bench_function("linear", |b| {
        b.iter(|| black_box(linear.radius_query(7.8731, 80.7718, 2.0).unwrap().len()))
    });
    group.bench_function("tree", |b| {
        b.iter(|| black_box(tree.radius_query(7.8731, 80.7718, 2.0).unwrap().len()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build_index,
    bench_radius_query,
    bench_nearest,
    bench_small_backends
);
criterion_main!(benches);

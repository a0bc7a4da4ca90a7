//! End-to-end tests for the optimization pipeline.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stationcov_core::{
    evaluate_coverage, persist_result, AggregationGrid, CandidateStrategy, CoverageError,
    CoverageOptimizer, DemandPoint, EmptyReason, GpsPing, MemorySink, OptimizerConfig, StopReason,
};
use stationcov_spatial::haversine_km;

fn scenario_points() -> Vec<DemandPoint> {
    vec![
        DemandPoint::new(0.0, 0.0, 10.0),
        DemandPoint::new(0.0, 0.001, 10.0),
        DemandPoint::new(10.0, 10.0, 5.0),
    ]
}

/// Random demand in a box around Kandy with uneven weights.
fn random_demand(n: usize, seed: u64) -> Vec<DemandPoint> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            DemandPoint::new(
                7.0 + rng.gen_range(0.0..0.5),
                80.4 + rng.gen_range(0.0..0.5),
                rng.gen_range(1.0..100.0),
            )
        })
        .collect()
}

fn optimizer(config: OptimizerConfig) -> CoverageOptimizer {
    CoverageOptimizer::new(config).unwrap()
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn two_stations_cover_both_clusters() {
    let result = optimizer(OptimizerConfig::new(1.0, 0.0, 1.0, 2))
        .optimize_demand(&scenario_points())
        .unwrap();

    assert_eq!(result.stations.len(), 2);
    assert!(haversine_km(result.stations[0].latitude, result.stations[0].longitude, 0.0, 0.0) < 1.0);
    assert_eq!((result.stations[1].latitude, result.stations[1].longitude), (10.0, 10.0));
    assert_eq!(result.coverage_percentage, 1.0);
    assert_eq!(result.stop_reason, Some(StopReason::CoverageTarget));
    assert_eq!(result.stations[0].id, 1);
    assert_eq!(result.stations[1].id, 2);
}

#[test]
fn one_station_goes_to_heavier_cluster() {
    let result = optimizer(OptimizerConfig::new(1.0, 0.0, 1.0, 1))
        .optimize_demand(&scenario_points())
        .unwrap();

    assert_eq!(result.stations.len(), 1);
    assert!(result.stations[0].latitude.abs() < 0.01);
    assert!((result.coverage_percentage - 0.8).abs() < 1e-12);
    assert_eq!(result.stop_reason, Some(StopReason::StationLimit));
}

// ============================================================================
// Boundary behavior
// ============================================================================

#[test]
fn zero_max_stations_returns_empty_selection() {
    let result = optimizer(OptimizerConfig::new(1.0, 0.0, 1.0, 0))
        .optimize_demand(&scenario_points())
        .unwrap();

    assert!(result.stations.is_empty());
    assert_eq!(result.coverage_percentage, 0.0);
    assert_eq!(result.stop_reason, Some(StopReason::StationLimit));
}

#[test]
fn single_cluster_needs_one_station() {
    let demand: Vec<DemandPoint> = (0..25)
        .map(|i| DemandPoint::new(7.0 + (i % 5) as f64 * 0.0005, 80.0 + (i / 5) as f64 * 0.0005, 1.0 + i as f64))
        .collect();
    let result = optimizer(OptimizerConfig::new(2.0, 0.0, 1.0, 10))
        .optimize_demand(&demand)
        .unwrap();

    assert_eq!(result.stations.len(), 1);
    assert_eq!(result.coverage_percentage, 1.0);
    assert_eq!(result.stop_reason, Some(StopReason::CoverageTarget));
}

#[test]
fn empty_input_is_not_an_error() {
    let opt = optimizer(OptimizerConfig::default());

    let result = opt.optimize_demand(&[]).unwrap();
    assert!(result.stations.is_empty());
    assert_eq!(result.empty_reason, Some(EmptyReason::NoDemand));
    assert_eq!(result.stop_reason, None);

    let result = opt.optimize_pings(&[]).unwrap();
    assert_eq!(result.empty_reason, Some(EmptyReason::NoDemand));
}

#[test]
fn zero_weight_demand_is_degenerate() {
    let demand = vec![DemandPoint::new(1.0, 1.0, 0.0), DemandPoint::new(2.0, 2.0, 0.0)];
    let result = optimizer(OptimizerConfig::default()).optimize_demand(&demand).unwrap();

    assert!(result.stations.is_empty());
    assert_eq!(result.coverage_percentage, 0.0);
    assert_eq!(result.empty_reason, Some(EmptyReason::DegenerateWeights));
    assert_eq!(result.map_center.latitude, 1.5);
}

#[test]
fn malformed_demand_reports_offending_count() {
    let demand = vec![
        DemandPoint::new(0.0, 0.0, 1.0),
        DemandPoint::new(0.0, 181.0, 1.0),
        DemandPoint::new(0.0, 0.0, -1.0),
        DemandPoint::new(0.0, 0.0, f64::NAN),
    ];
    let err = optimizer(OptimizerConfig::default()).optimize_demand(&demand).unwrap_err();
    assert!(matches!(err, CoverageError::InvalidInput { offending: 3, total: 4 }));
    assert_eq!(err.to_string(), "Invalid input: 3 of 4 records are malformed");
}

// ============================================================================
// Properties over generated demand
// ============================================================================

#[test]
fn stations_respect_min_separation() {
    let demand = random_demand(600, 11);
    for min_sep in [0.5, 3.0, 8.0] {
        let result = optimizer(OptimizerConfig::new(3.0, min_sep, 1.0, 40))
            .optimize_demand(&demand)
            .unwrap();
        assert!(!result.stations.is_empty());

        for (i, a) in result.stations.iter().enumerate() {
            for b in &result.stations[i + 1..] {
                let d = haversine_km(a.latitude, a.longitude, b.latitude, b.longitude);
                assert!(d >= min_sep, "stations {} and {} are {d:.3} km apart", a.id, b.id);
            }
        }
    }
}

#[test]
fn coverage_is_monotone_in_station_count() {
    let demand = random_demand(500, 23);
    let mut previous = 0.0;
    for max_stations in 1..=12 {
        let result = optimizer(OptimizerConfig::new(2.0, 1.0, 1.0, max_stations))
            .optimize_demand(&demand)
            .unwrap();
        assert!(
            result.coverage_percentage >= previous,
            "coverage dropped at {max_stations} stations"
        );
        previous = result.coverage_percentage;
    }
}

#[test]
fn reported_coverage_matches_independent_evaluation() {
    let demand = random_demand(400, 5);
    let result = optimizer(OptimizerConfig::new(2.5, 1.0, 0.95, 15))
        .optimize_demand(&demand)
        .unwrap();

    let evaluated = evaluate_coverage(&demand, &result.coordinates(), 2.5).unwrap();
    assert!((evaluated - result.coverage_percentage).abs() < 1e-9);
    assert!(
        (result.stats.covered_weight - result.coverage_percentage * result.stats.total_weight).abs() < 1e-6
    );
}

#[test]
fn sampled_runs_are_reproducible() {
    let demand = random_demand(4000, 99);
    let config = OptimizerConfig::new(2.0, 1.0, 0.9, 20).with_max_data_points(600);

    let a = optimizer(config.clone()).optimize_demand(&demand).unwrap();
    let b = optimizer(config).optimize_demand(&demand).unwrap();

    assert_eq!(a.stats.sampled_points, b.stats.sampled_points);
    assert!(a.stats.sampled_points <= 600);
    assert_eq!(a.stations, b.stations);
    assert_eq!(a.coverage_percentage, b.coverage_percentage);
}

#[test]
fn worker_count_does_not_change_result() {
    let demand = random_demand(800, 3);
    let base = OptimizerConfig::new(2.0, 1.0, 0.9, 20);

    let a = optimizer(base.clone()).optimize_demand(&demand).unwrap();
    let b = optimizer(base.with_coverage_parallelism(64, Some(2)))
        .optimize_demand(&demand)
        .unwrap();
    assert_eq!(a.stations, b.stations);
}

#[test]
fn index_backend_does_not_change_result() {
    let demand = random_demand(300, 21);
    let base = OptimizerConfig::new(2.0, 1.0, 0.9, 15);

    let tree = optimizer(base.clone().with_index_linear_scan_threshold(0))
        .optimize_demand(&demand)
        .unwrap();
    let linear = optimizer(base.with_index_linear_scan_threshold(usize::MAX))
        .optimize_demand(&demand)
        .unwrap();
    assert_eq!(tree.stations, linear.stations);
    assert_eq!(tree.coverage_percentage, linear.coverage_percentage);
    assert_eq!(tree.parameters.index_linear_scan_threshold, 0);
}

#[test]
fn unweighted_demand_counts_every_point_once() {
    let config = OptimizerConfig::new(1.0, 0.0, 1.0, 1).with_traffic_weighting(false);
    let result = optimizer(config).optimize_demand(&scenario_points()).unwrap();

    assert_eq!(result.stats.total_weight, 3.0);
    assert!((result.coverage_percentage - 2.0 / 3.0).abs() < 1e-12);
    assert!(!result.parameters.use_traffic_weighting);

    // Weighting on takes the given weights unchanged.
    let result = optimizer(OptimizerConfig::new(1.0, 0.0, 1.0, 1))
        .optimize_demand(&scenario_points())
        .unwrap();
    assert_eq!(result.stats.total_weight, 25.0);
    assert!((result.coverage_percentage - 0.8).abs() < 1e-12);
}

#[test]
fn grid_candidates_produce_valid_selection() {
    let demand = random_demand(500, 8);
    let result = optimizer(
        OptimizerConfig::new(3.0, 2.0, 0.9, 20).with_candidates(CandidateStrategy::Grid { step_deg: 0.02 }),
    )
    .optimize_demand(&demand)
    .unwrap();

    assert!(!result.stations.is_empty());
    assert!(result.coverage_percentage > 0.0);
    let evaluated = evaluate_coverage(&demand, &result.coordinates(), 3.0).unwrap();
    assert!((evaluated - result.coverage_percentage).abs() < 1e-9);
}

// ============================================================================
// Ping input and persistence
// ============================================================================

#[test]
fn hex_aggregated_pings_end_to_end() {
    let mut rng = SmallRng::seed_from_u64(17);
    let mut pings = Vec::new();
    // Heavy traffic near Colombo, light traffic near Galle.
    for _ in 0..2000 {
        pings.push(GpsPing::new(6.93 + rng.gen_range(-0.02..0.02), 79.85 + rng.gen_range(-0.02..0.02)));
    }
    for _ in 0..200 {
        pings.push(GpsPing::new(6.05 + rng.gen_range(-0.02..0.02), 80.22 + rng.gen_range(-0.02..0.02)));
    }

    let config = OptimizerConfig::new(5.0, 2.0, 0.99, 10).with_aggregation(AggregationGrid::Hex { resolution: 8 });
    let result = optimizer(config).optimize_pings(&pings).unwrap();

    assert_eq!(result.stats.raw_records, 2200);
    assert!(result.stats.demand_points < 2200);
    assert!(result.stations.len() >= 2);
    assert!(result.coverage_percentage >= 0.99);
    // Traffic weighting puts the first station at the busy end.
    assert!((result.stations[0].latitude - 6.93).abs() < 0.1);
}

#[test]
fn persisted_result_is_named_by_station_count() {
    let result = optimizer(OptimizerConfig::new(1.0, 0.0, 1.0, 2))
        .optimize_demand(&scenario_points())
        .unwrap();

    let sink = MemorySink::new();
    let name = persist_result(&sink, &result).unwrap();
    assert!(name.starts_with("stations_opt_2_"));
    assert!(name.ends_with(".json"));

    let payload: serde_json::Value = serde_json::from_slice(&sink.entries()[0].1).unwrap();
    assert_eq!(payload["stations"].as_array().unwrap().len(), 2);
    assert_eq!(payload["stop_reason"], "coverage_target");
}

//! End-to-end optimization pipeline.
//!
//! ```text
//! pings ─► aggregate ─► sample ─► weight ─► index ─► candidates ─► coverage ─► greedy ─► result
//! ```
//!
//! One call is one synchronous run. [`CoverageOptimizer`] holds only its
//! configuration, so a single instance can serve concurrent runs.

use crate::candidates::generate_candidates;
use crate::config::OptimizerConfig;
use crate::coverage::{precompute_coverage, CoverageParams};
use crate::demand::{
    apply_weighting, total_weight, validate_demand, DemandAggregator, DemandPoint, GpsPing,
    WeightedPing,
};
use crate::error::Result;
use crate::greedy::GreedySelector;
use crate::result::{assemble, assemble_empty, EmptyReason, OptimizationResult, OptimizationStats};
use crate::sampler::adaptive_sample;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use stationcov_spatial::SpatialIndex;
use std::time::Instant;

/// How demand weights are set before coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weighting {
    AsGiven,
    /// Rescale counts to `[1, 10]`.
    Traffic,
    /// Every point weighs 1.
    Uniform,
}

/// Places stations over weighted demand.
#[derive(Debug, Clone)]
pub struct CoverageOptimizer {
    config: OptimizerConfig,
}

impl CoverageOptimizer {
    /// Create an optimizer, rejecting invalid configuration up front.
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn ping_weighting(&self) -> Weighting {
        if self.config.use_traffic_weighting {
            Weighting::Traffic
        } else {
            Weighting::Uniform
        }
    }

    /// Optimize over raw pings: aggregate, then weight by traffic volume.
    pub fn optimize_pings(&self, pings: &[GpsPing]) -> Result<OptimizationResult> {
        let demand = DemandAggregator::new(self.config.aggregation)?.aggregate_pings(pings)?;
        self.run(demand, pings.len(), self.ping_weighting())
    }

    /// Optimize over pre-counted pings: aggregate, then weight by traffic
    /// volume.
    pub fn optimize_weighted(&self, pings: &[WeightedPing]) -> Result<OptimizationResult> {
        let demand = DemandAggregator::new(self.config.aggregation)?.aggregate_weighted(pings)?;
        self.run(demand, pings.len(), self.ping_weighting())
    }

    /// Optimize over demand points that are already aggregated.
    ///
    /// Weights are used as given when `use_traffic_weighting` is set; they
    /// are not rescaled to `[1, 10]`. With weighting off every point weighs 1.
    /// Sampling still caps the working set.
    pub fn optimize_demand(&self, points: &[DemandPoint]) -> Result<OptimizationResult> {
        validate_demand(points)?;
        let weighting = if self.config.use_traffic_weighting {
            Weighting::AsGiven
        } else {
            Weighting::Uniform
        };
        self.run(points.to_vec(), points.len(), weighting)
    }

    fn run(&self, demand: Vec<DemandPoint>, raw_records: usize, weighting: Weighting) -> Result<OptimizationResult> {
        let start = Instant::now();
        let config = &self.config;

        let span = tracing::debug_span!(
            "optimize",
            raw_records,
            demand_points = demand.len(),
            radius_km = config.service_radius_km,
            max_stations = config.max_stations
        );
        let _guard = span.enter();

        let mut stats = OptimizationStats {
            raw_records,
            demand_points: demand.len(),
            ..Default::default()
        };

        if demand.is_empty() {
            tracing::info!("No demand points after aggregation");
            stats.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(assemble_empty(EmptyReason::NoDemand, &[], config, stats));
        }
        if total_weight(&demand) <= 0.0 {
            tracing::info!(demand_points = demand.len(), "Demand has zero total weight");
            let coords: Vec<(f64, f64)> = demand.iter().map(DemandPoint::coordinate).collect();
            stats.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(assemble_empty(EmptyReason::DegenerateWeights, &coords, config, stats));
        }

        let mut rng = SmallRng::seed_from_u64(config.sampling_seed);
        let mut working = adaptive_sample(
            demand,
            config.max_data_points,
            config.density_aware_sampling,
            &mut rng,
        );
        stats.sampled_points = working.len();

        match weighting {
            Weighting::AsGiven => {}
            Weighting::Traffic => apply_weighting(&mut working, true),
            Weighting::Uniform => apply_weighting(&mut working, false),
        }

        let coords: Vec<(f64, f64)> = working.iter().map(DemandPoint::coordinate).collect();
        let weights: Vec<f64> = working.iter().map(|p| p.weight).collect();
        let index = SpatialIndex::build_with_config(&coords, &config.index_config())?;

        let candidates = generate_candidates(&working, &index, config.candidates);
        stats.candidates = candidates.len();

        let matrix = precompute_coverage(
            &candidates.coords,
            &index,
            &weights,
            CoverageParams {
                radius_km: config.service_radius_km,
                batch_size: config.coverage_batch_size,
                partitions: config.coverage_partitions,
            },
        )?;
        stats.coverage_ms = matrix.stats.elapsed_ms;

        tracing::info!(
            sampled_points = stats.sampled_points,
            candidates = stats.candidates,
            candidate_source = ?candidates.source,
            coverage_ms = stats.coverage_ms,
            "Coverage sets ready"
        );

        let selection = GreedySelector::new(&candidates.coords, &matrix.sets, &weights, config.into()).run();

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        let result = assemble(&candidates.coords, &selection, config, stats);

        tracing::info!(
            stations = result.stations.len(),
            coverage = result.coverage_percentage,
            elapsed_ms = result.stats.elapsed_ms,
            "Optimization complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregationGrid;
    use crate::error::CoverageError;

    #[test]
    fn test_invalid_config_rejected() {
        let err = CoverageOptimizer::new(OptimizerConfig::new(-1.0, 0.0, 0.5, 3)).unwrap_err();
        assert!(matches!(err, CoverageError::InvalidConfig(_)));
    }

    #[test]
    fn test_pings_aggregate_then_weight() {
        let config = OptimizerConfig::new(1.0, 0.0, 1.0, 5)
            .with_aggregation(AggregationGrid::Uniform { cell_deg: 0.01 });
        let mut pings = vec![GpsPing::new(6.9271, 79.8612); 30];
        pings.extend(vec![GpsPing::new(7.2906, 80.6337); 3]);

        let result = CoverageOptimizer::new(config).unwrap().optimize_pings(&pings).unwrap();
        assert_eq!(result.stats.raw_records, 33);
        assert_eq!(result.stats.demand_points, 2);
        assert_eq!(result.stations.len(), 2);
        // Denser cell first.
        assert!((result.stations[0].latitude - 6.9271).abs() < 1e-9);
        // 1 + 9 * 30/30 and 1 + 9 * 3/30.
        assert!((result.stats.total_weight - 11.9).abs() < 1e-9);
        assert_eq!(result.coverage_percentage, 1.0);
    }

    #[test]
    fn test_unweighted_pings() {
        let config = OptimizerConfig::new(1.0, 0.0, 1.0, 1)
            .with_aggregation(AggregationGrid::Uniform { cell_deg: 0.01 })
            .with_traffic_weighting(false);
        let mut pings = vec![GpsPing::new(6.9271, 79.8612); 30];
        pings.push(GpsPing::new(7.2906, 80.6337));

        let result = CoverageOptimizer::new(config).unwrap().optimize_pings(&pings).unwrap();
        assert_eq!(result.stats.total_weight, 2.0);
        assert_eq!(result.coverage_percentage, 0.5);
    }

    #[test]
    fn test_weighted_pings_skip_zero_counts() {
        let pings = [
            WeightedPing::new(0.0, 0.0, 0),
            WeightedPing::new(1.0, 1.0, 0),
        ];
        let result = CoverageOptimizer::new(OptimizerConfig::default())
            .unwrap()
            .optimize_weighted(&pings)
            .unwrap();
        assert_eq!(result.empty_reason, Some(EmptyReason::NoDemand));
    }

    #[test]
    fn test_malformed_pings_rejected() {
        let pings = [GpsPing::new(0.0, 0.0), GpsPing::new(f64::NAN, 0.0), GpsPing::new(91.0, 0.0)];
        let err = CoverageOptimizer::new(OptimizerConfig::default())
            .unwrap()
            .optimize_pings(&pings)
            .unwrap_err();
        assert!(matches!(err, CoverageError::InvalidInput { offending: 2, total: 3 }));
    }
}

//! Optimizer configuration types.
//!
//! Every field has a default, so a config file only needs the values a caller
//! wants to change. Serialized form (TOML):
//!
//! ```toml
//! service_radius_km = 5.0
//! min_separation_km = 2.0
//! coverage_target = 0.9
//! max_stations = 50
//!
//! [aggregation]
//! kind = "hex"
//! resolution = 7
//!
//! [candidates]
//! kind = "grid"
//! step_deg = 0.01
//! ```

use crate::error::{CoverageError, Result};
use serde::{Deserialize, Serialize};
use stationcov_spatial::IndexConfig;

/// Spatial binning used to reduce raw pings to demand points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationGrid {
    /// H3 hexagonal cells at the given resolution (0-15).
    Hex { resolution: u8 },

    /// Square lat/lng cells `cell_deg` degrees on a side.
    Uniform { cell_deg: f64 },
}

impl Default for AggregationGrid {
    fn default() -> Self {
        AggregationGrid::Hex { resolution: 7 }
    }
}

/// How station-placement candidates are produced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Every demand point is a candidate.
    #[default]
    DemandPoints,

    /// A regular lat/lng grid over the interquartile-expanded bounding box,
    /// keeping only grid points within `step_deg` (as km) of real demand.
    Grid { step_deg: f64 },
}

/// Configuration for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Service radius of a station in km. Must be > 0.
    /// Default: 5.0
    pub service_radius_km: f64,

    /// Minimum great-circle distance between two stations in km.
    /// Default: 2.0
    pub min_separation_km: f64,

    /// Stop once this fraction of weighted demand is covered (0.0-1.0).
    /// Default: 0.9
    pub coverage_target: f64,

    /// Maximum number of stations to place. 0 yields an empty selection.
    /// Default: 50
    pub max_stations: usize,

    /// Rescale demand weights to `[1, 10]` by traffic volume. When false,
    /// every demand point weighs 1.
    /// Default: true
    pub use_traffic_weighting: bool,

    /// Spatial binning for raw pings.
    /// Default: H3 resolution 7
    pub aggregation: AggregationGrid,

    /// Cap on the working set; larger aggregates are sampled down.
    /// Default: 50_000
    pub max_data_points: usize,

    /// Stop early once a station improves coverage by less than this
    /// fraction of total weight (see `early_termination_*`).
    /// Default: 0.001
    pub early_termination_threshold: f64,

    /// Stratify sampling over a coarse grid instead of sampling the whole
    /// set at once.
    /// Default: true
    pub density_aware_sampling: bool,

    /// Seed for the sampler's PRNG.
    /// Default: 42
    pub sampling_seed: u64,

    /// Candidate generation strategy.
    /// Default: demand points
    pub candidates: CandidateStrategy,

    /// Demand sets smaller than this are queried by linear scan instead of
    /// an R-tree.
    /// Default: 64
    pub index_linear_scan_threshold: usize,

    /// Candidates per coverage precomputation batch.
    /// Default: 1000
    pub coverage_batch_size: usize,

    /// Worker threads for coverage precomputation. `None` uses rayon's
    /// default thread count.
    /// Default: None
    pub coverage_partitions: Option<usize>,

    /// A popped heap entry whose recomputed gain falls below this fraction
    /// of its cached gain is re-queued instead of selected.
    /// Default: 0.9
    pub stale_tolerance: f64,

    /// Early termination is only considered past this many stations.
    /// Default: 10
    pub early_termination_min_stations: usize,

    /// Early termination also requires coverage above this fraction of
    /// `coverage_target`.
    /// Default: 0.9
    pub early_termination_target_fraction: f64,

    /// Wall-clock budget for the selection loop in milliseconds.
    /// Default: None (unbounded)
    pub time_budget_ms: Option<u64>,

    /// Zoom hint passed through to the map center.
    /// Default: 10
    pub zoom_level: u8,

    /// Map center `[lat, lng]` used when there is nothing to center on.
    /// Default: `[7.8731, 80.7718]`
    pub fallback_center: [f64; 2],
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            service_radius_km: 5.0,
            min_separation_km: 2.0,
            coverage_target: 0.9,
            max_stations: 50,
            use_traffic_weighting: true,
            aggregation: AggregationGrid::default(),
            max_data_points: 50_000,
            early_termination_threshold: 0.001,
            density_aware_sampling: true,
            sampling_seed: 42,
            candidates: CandidateStrategy::default(),
            index_linear_scan_threshold: IndexConfig::default().linear_scan_threshold,
            coverage_batch_size: 1000,
            coverage_partitions: None,
            stale_tolerance: 0.9,
            early_termination_min_stations: 10,
            early_termination_target_fraction: 0.9,
            time_budget_ms: None,
            zoom_level: 10,
            fallback_center: [7.8731, 80.7718],
        }
    }
}

impl OptimizerConfig {
    /// Create a config with the core placement parameters set.
    pub fn new(
        service_radius_km: f64,
        min_separation_km: f64,
        coverage_target: f64,
        max_stations: usize,
    ) -> Self {
        Self {
            service_radius_km,
            min_separation_km,
            coverage_target,
            max_stations,
            ..Self::default()
        }
    }

    /// Enable or disable traffic weighting.
    pub fn with_traffic_weighting(mut self, enabled: bool) -> Self {
        self.use_traffic_weighting = enabled;
        self
    }

    /// Set the aggregation grid.
    pub fn with_aggregation(mut self, grid: AggregationGrid) -> Self {
        self.aggregation = grid;
        self
    }

    /// Set the working-set cap.
    pub fn with_max_data_points(mut self, max: usize) -> Self {
        self.max_data_points = max;
        self
    }

    /// Set the early termination threshold.
    pub fn with_early_termination_threshold(mut self, threshold: f64) -> Self {
        self.early_termination_threshold = threshold;
        self
    }

    /// Set the candidate strategy.
    pub fn with_candidates(mut self, strategy: CandidateStrategy) -> Self {
        self.candidates = strategy;
        self
    }

    /// Set the sampler seed.
    pub fn with_sampling_seed(mut self, seed: u64) -> Self {
        self.sampling_seed = seed;
        self
    }

    /// Toggle density-aware sampling.
    pub fn with_density_aware_sampling(mut self, enabled: bool) -> Self {
        self.density_aware_sampling = enabled;
        self
    }

    /// Set the point count below which the demand index scans linearly.
    pub fn with_index_linear_scan_threshold(mut self, threshold: usize) -> Self {
        self.index_linear_scan_threshold = threshold;
        self
    }

    /// Demand index configuration derived from this config.
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::default().with_linear_scan_threshold(self.index_linear_scan_threshold)
    }

    /// Set coverage precomputation batch size and worker count.
    pub fn with_coverage_parallelism(mut self, batch_size: usize, partitions: Option<usize>) -> Self {
        self.coverage_batch_size = batch_size;
        self.coverage_partitions = partitions;
        self
    }

    /// Set the selection time budget.
    pub fn with_time_budget_ms(mut self, budget: Option<u64>) -> Self {
        self.time_budget_ms = budget;
        self
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(CoverageError::InvalidConfig(msg))
        }

        if !(self.service_radius_km.is_finite() && self.service_radius_km > 0.0) {
            return invalid(format!(
                "service_radius_km must be > 0, got {}",
                self.service_radius_km
            ));
        }
        if !(self.min_separation_km.is_finite() && self.min_separation_km >= 0.0) {
            return invalid(format!(
                "min_separation_km must be >= 0, got {}",
                self.min_separation_km
            ));
        }
        if !(0.0..=1.0).contains(&self.coverage_target) {
            return invalid(format!(
                "coverage_target must be in [0, 1], got {}",
                self.coverage_target
            ));
        }
        if self.max_data_points == 0 {
            return invalid("max_data_points must be >= 1".to_string());
        }
        if !(self.early_termination_threshold.is_finite() && self.early_termination_threshold >= 0.0) {
            return invalid(format!(
                "early_termination_threshold must be >= 0, got {}",
                self.early_termination_threshold
            ));
        }
        if self.coverage_batch_size == 0 {
            return invalid("coverage_batch_size must be >= 1".to_string());
        }
        if self.coverage_partitions == Some(0) {
            return invalid("coverage_partitions must be >= 1 when set".to_string());
        }
        if !(self.stale_tolerance > 0.0 && self.stale_tolerance <= 1.0) {
            return invalid(format!(
                "stale_tolerance must be in (0, 1], got {}",
                self.stale_tolerance
            ));
        }
        if !(self.early_termination_target_fraction.is_finite()
            && self.early_termination_target_fraction >= 0.0)
        {
            return invalid(format!(
                "early_termination_target_fraction must be >= 0, got {}",
                self.early_termination_target_fraction
            ));
        }
        match self.aggregation {
            AggregationGrid::Hex { resolution } if resolution > 15 => {
                return Err(CoverageError::InvalidResolution(resolution));
            }
            AggregationGrid::Uniform { cell_deg } if !(cell_deg.is_finite() && cell_deg > 0.0) => {
                return invalid(format!("aggregation cell_deg must be > 0, got {cell_deg}"));
            }
            _ => {}
        }
        if let CandidateStrategy::Grid { step_deg } = self.candidates {
            if !(step_deg.is_finite() && step_deg > 0.0) {
                return invalid(format!("candidate grid step_deg must be > 0, got {step_deg}"));
            }
        }
        let [lat, lng] = self.fallback_center;
        if !stationcov_spatial::geometry::is_valid_coordinate(lat, lng) {
            return invalid(format!("fallback_center [{lat}, {lng}] is not a valid coordinate"));
        }

        Ok(())
    }
}

//! Coverage optimization for service-station placement.
//!
//! Given weighted demand (vehicle telemetry pings, usually aggregated),
//! choose up to `max_stations` station sites that maximize the share of
//! weighted demand within `service_radius_km`, with no two stations closer
//! than `min_separation_km`. Exact placement is NP-hard; this crate uses lazy
//! greedy maximum coverage over spatially indexed demand.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐
//! │ GpsPing /    │──►│ Demand   │──►│ Adaptive │──►│ Weighting  │
//! │ WeightedPing │   │Aggregator│   │ Sampler  │   │ 1 + 9w/max │
//! └──────────────┘   └──────────┘   └──────────┘   └─────┬──────┘
//!                                                        │
//!        ┌───────────────────────────────────────────────┘
//!        ▼
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │ SpatialIndex │──►│ Candidates │──►│ Coverage     │──►│ Greedy   │──► OptimizationResult
//! │ (R*-tree)    │   │            │   │ (rayon)      │   │ Selector │
//! └──────────────┘   └────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use stationcov_core::{CoverageOptimizer, DemandPoint, OptimizerConfig};
//!
//! let demand = vec![
//!     DemandPoint::new(0.0, 0.0, 10.0),
//!     DemandPoint::new(0.0, 0.001, 10.0),
//!     DemandPoint::new(10.0, 10.0, 5.0),
//! ];
//! let optimizer = CoverageOptimizer::new(OptimizerConfig::new(1.0, 0.0, 1.0, 2)).unwrap();
//! let result = optimizer.optimize_demand(&demand).unwrap();
//!
//! assert_eq!(result.stations.len(), 2);
//! assert_eq!(result.coverage_percentage, 1.0);
//! ```
//!
//! # Modules
//!
//! - [`config`]: Optimizer configuration
//! - [`demand`]: Input types and aggregation
//! - [`sampler`]: Working-set downsampling
//! - [`candidates`]: Candidate site generation
//! - [`coverage`]: Coverage-set precomputation and post-hoc evaluation
//! - [`greedy`]: Lazy greedy selection
//! - [`result`]: Output types
//! - [`sink`]: Result persistence hand-off
//! - [`error`]: Error types

pub mod candidates;
pub mod config;
pub mod coverage;
pub mod demand;
pub mod error;
pub mod greedy;
pub mod result;
pub mod sampler;
pub mod sink;

mod optimizer;

pub use candidates::{CandidateSet, CandidateSource};
pub use config::{AggregationGrid, CandidateStrategy, OptimizerConfig};
pub use coverage::evaluate_coverage;
pub use demand::{DemandAggregator, DemandPoint, GpsPing, WeightedPing};
pub use error::{CoverageError, Result};
pub use greedy::StopReason;
pub use optimizer::CoverageOptimizer;
pub use result::{EmptyReason, MapCenter, OptimizationResult, OptimizationStats, Station};
pub use sink::{persist_result, MemorySink, ResultSink};

//! Error types for coverage optimization.
//!
//! Empty or zero-weight demand is not an error: the optimizer returns a
//! zero-station result flagged with an [`EmptyReason`](crate::EmptyReason).

use stationcov_spatial::SpatialError;
use thiserror::Error;

/// Coverage optimization errors.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// Malformed input records (bad coordinates, negative or NaN weights).
    #[error("Invalid input: {offending} of {total} records are malformed")]
    InvalidInput { offending: usize, total: usize },

    /// Configuration rejected by [`OptimizerConfig::validate`](crate::OptimizerConfig::validate).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spatial index error other than malformed coordinates.
    #[error("Spatial index error: {0}")]
    Spatial(SpatialError),

    /// Hex aggregation resolution outside 0..=15.
    #[error("Invalid H3 resolution: {0}")]
    InvalidResolution(u8),

    /// The coverage worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Result sink failed to persist a payload.
    #[error("Sink error: {0}")]
    Sink(String),
}

impl From<SpatialError> for CoverageError {
    fn from(e: SpatialError) -> Self {
        match e {
            SpatialError::InvalidCoordinates { offending, total } => {
                CoverageError::InvalidInput { offending, total }
            }
            other => CoverageError::Spatial(other),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for CoverageError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        CoverageError::WorkerPool(e.to_string())
    }
}

/// Result type for coverage operations.
pub type Result<T> = std::result::Result<T, CoverageError>;

//! Error types for the spatial index.

use thiserror::Error;

/// Spatial index errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// Coordinates that are NaN, infinite, or outside the lat/lng range.
    #[error("Invalid coordinates: {offending} of {total} records are malformed")]
    InvalidCoordinates { offending: usize, total: usize },

    /// Query radius is negative or not a number.
    #[error("Invalid radius: {0} km")]
    InvalidRadius(f64),
}

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;

//! Spatial index builder.
//!
//! Builds a [`SpatialIndex`] from coordinate records. The builder:
//! 1. Accepts `(lat, lng)` records one at a time or in bulk
//! 2. Validates each record (finite, inside the lat/lng range)
//! 3. Counts malformed records instead of stopping at the first one
//! 4. Produces an index over the accepted records, or fails if any were malformed
//!
//! # Usage
//!
//! ```
//! use stationcov_spatial::{IndexConfig, SpatialIndexBuilder};
//!
//! let mut builder = SpatialIndexBuilder::new(IndexConfig::default());
//! builder.add_point(6.9271, 79.8612);
//! builder.add_point(7.2906, 80.6337);
//!
//! let index = builder.build().unwrap();
//! assert_eq!(index.len(), 2);
//! ```

use crate::config::IndexConfig;
use crate::error::{Result, SpatialError};
use crate::geometry::is_valid_coordinate;
use crate::index::SpatialIndex;

/// Statistics collected during index building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of coordinate records seen.
    pub records_processed: usize,

    /// Number of records accepted into the index.
    pub points_added: usize,

    /// Number of malformed records (NaN, infinite, or out of range).
    pub records_rejected: usize,
}

/// Builder for spatial indexes.
///
/// Accumulates coordinates and produces a [`SpatialIndex`]. Record indices
/// in query results refer to the order of accepted records, which is the
/// insertion order whenever the build succeeds.
pub struct SpatialIndexBuilder {
    /// Configuration used for building.
    config: IndexConfig,

    /// Accepted coordinates, in insertion order.
    points: Vec<(f64, f64)>,

    /// Build statistics.
    stats: BuildStats,
}

impl SpatialIndexBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Create a builder with room for `capacity` points.
    pub fn with_capacity(config: IndexConfig, capacity: usize) -> Self {
        Self {
            config,
            points: Vec::with_capacity(capacity),
            stats: BuildStats::default(),
        }
    }

    /// Get current build statistics.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Add a coordinate record.
    ///
    /// Returns `false` if the record is malformed. Malformed records are
    /// counted in `stats.records_rejected` and make [`build`](Self::build) fail.
    pub fn add_point(&mut self, lat: f64, lng: f64) -> bool {
        self.stats.records_processed += 1;

        if !is_valid_coordinate(lat, lng) {
            self.stats.records_rejected += 1;
            tracing::trace!(lat, lng, "Rejecting malformed coordinate");
            return false;
        }

        self.points.push((lat, lng));
        self.stats.points_added += 1;
        true
    }

    /// Add many coordinate records.
    pub fn extend(&mut self, points: impl IntoIterator<Item = (f64, f64)>) {
        for (lat, lng) in points {
            self.add_point(lat, lng);
        }
    }

    /// Finalize the index.
    ///
    /// Fails with [`SpatialError::InvalidCoordinates`] if any record was rejected.
    pub fn build(self) -> Result<SpatialIndex> {
        if self.stats.records_rejected > 0 {
            tracing::debug!(
                rejected = self.stats.records_rejected,
                total = self.stats.records_processed,
                "Spatial index build failed on malformed coordinates"
            );
            return Err(SpatialError::InvalidCoordinates {
                offending: self.stats.records_rejected,
                total: self.stats.records_processed,
            });
        }

        let index = SpatialIndex::from_validated(self.points, &self.config);
        tracing::debug!(
            points = index.len(),
            tree = index.is_tree_backed(),
            "Built spatial index"
        );
        Ok(index)
    }
}

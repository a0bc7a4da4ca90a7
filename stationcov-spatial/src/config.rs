//! Spatial index configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for building a [`SpatialIndex`](crate::SpatialIndex).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Point sets smaller than this are answered with a linear scan instead
    /// of an R-tree. Tree construction costs more than it saves below a few
    /// dozen points.
    /// Default: 64
    pub linear_scan_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            linear_scan_threshold: 64,
        }
    }
}

impl IndexConfig {
    /// Set the linear scan threshold.
    pub fn with_linear_scan_threshold(mut self, threshold: usize) -> Self {
        self.linear_scan_threshold = threshold;
        self
    }

    /// Always build an R-tree, regardless of point count.
    pub fn tree_only() -> Self {
        Self {
            linear_scan_threshold: 0,
        }
    }
}

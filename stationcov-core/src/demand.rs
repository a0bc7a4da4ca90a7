//! Demand aggregation.
//!
//! Reduces raw GPS pings to weighted demand points by spatial binning: every
//! ping falls into a cell (an H3 hexagon or a square lat/lng cell), and each
//! occupied cell becomes one [`DemandPoint`] at the mean coordinate of its
//! pings with weight equal to the ping count.
//!
//! Output is ordered by weight descending, then by cell key, so the same
//! input always produces the same demand set.

use crate::config::AggregationGrid;
use crate::error::{CoverageError, Result};
use h3o::{LatLng, Resolution};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use stationcov_spatial::geometry::is_valid_coordinate;

/// A single raw telemetry ping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPing {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPing {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A pre-aggregated location with a ping count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPing {
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
}

impl WeightedPing {
    pub fn new(latitude: f64, longitude: f64, count: u64) -> Self {
        Self {
            latitude,
            longitude,
            count,
        }
    }
}

/// A weighted demand location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Non-negative traffic intensity.
    pub weight: f64,
}

impl DemandPoint {
    pub fn new(latitude: f64, longitude: f64, weight: f64) -> Self {
        Self {
            latitude,
            longitude,
            weight,
        }
    }

    /// `(lat, lng)` pair.
    #[inline]
    pub fn coordinate(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude) && self.weight.is_finite() && self.weight >= 0.0
    }
}

/// Check demand points for malformed coordinates or weights.
pub fn validate_demand(points: &[DemandPoint]) -> Result<()> {
    let offending = points.iter().filter(|p| !p.is_valid()).count();
    if offending > 0 {
        return Err(CoverageError::InvalidInput {
            offending,
            total: points.len(),
        });
    }
    Ok(())
}

/// Sum of demand weights.
pub fn total_weight(points: &[DemandPoint]) -> f64 {
    points.iter().map(|p| p.weight).sum()
}

/// Rescale demand weights in place.
///
/// With traffic weighting, `w' = 1 + 9 * w / max_w`, which bounds the ratio
/// between the densest and sparsest cells at 10. Without it, every weight
/// becomes 1. A set whose maximum weight is zero is left untouched.
pub fn apply_weighting(points: &mut [DemandPoint], use_traffic_weighting: bool) {
    if !use_traffic_weighting {
        points.iter_mut().for_each(|p| p.weight = 1.0);
        return;
    }

    let max_weight = points.iter().map(|p| p.weight).fold(0.0, f64::max);
    if max_weight <= 0.0 {
        return;
    }
    for p in points.iter_mut() {
        p.weight = 1.0 + 9.0 * (p.weight / max_weight);
    }
}

/// Cell identifier; ordering gives the deterministic tie-break on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum CellKey {
    Hex(u64),
    Uniform(i64, i64),
}

#[derive(Debug, Default, Clone, Copy)]
struct CellAccum {
    sum_lat: f64,
    sum_lng: f64,
    count: u64,
}

/// Bins pings into cells and emits one demand point per occupied cell.
#[derive(Debug, Clone, Copy)]
pub struct DemandAggregator {
    grid: AggregationGrid,
    resolution: Option<Resolution>,
}

impl DemandAggregator {
    /// Create an aggregator for the given grid.
    pub fn new(grid: AggregationGrid) -> Result<Self> {
        let resolution = match grid {
            AggregationGrid::Hex { resolution } => Some(
                Resolution::try_from(resolution)
                    .map_err(|_| CoverageError::InvalidResolution(resolution))?,
            ),
            AggregationGrid::Uniform { cell_deg } => {
                if !(cell_deg.is_finite() && cell_deg > 0.0) {
                    return Err(CoverageError::InvalidConfig(format!(
                        "aggregation cell_deg must be > 0, got {cell_deg}"
                    )));
                }
                None
            }
        };
        Ok(Self { grid, resolution })
    }

    fn cell_key(&self, lat: f64, lng: f64) -> Option<CellKey> {
        match (self.grid, self.resolution) {
            (AggregationGrid::Hex { .. }, Some(resolution)) => {
                let ll = LatLng::new(lat, lng).ok()?;
                Some(CellKey::Hex(u64::from(ll.to_cell(resolution))))
            }
            (AggregationGrid::Uniform { cell_deg }, _) => Some(CellKey::Uniform(
                (lat / cell_deg).floor() as i64,
                (lng / cell_deg).floor() as i64,
            )),
            (AggregationGrid::Hex { .. }, None) => None,
        }
    }

    /// Aggregate raw pings; each ping contributes weight 1.
    pub fn aggregate_pings(&self, pings: &[GpsPing]) -> Result<Vec<DemandPoint>> {
        self.aggregate(pings.iter().map(|p| (p.latitude, p.longitude, 1)), pings.len())
    }

    /// Aggregate pre-counted pings; each record contributes its `count`.
    ///
    /// The cell coordinate is the count-weighted mean. Zero-count records
    /// carry no demand and are skipped.
    pub fn aggregate_weighted(&self, pings: &[WeightedPing]) -> Result<Vec<DemandPoint>> {
        self.aggregate(
            pings.iter().map(|p| (p.latitude, p.longitude, p.count)),
            pings.len(),
        )
    }

    fn aggregate(
        &self,
        records: impl Iterator<Item = (f64, f64, u64)> + Clone,
        total: usize,
    ) -> Result<Vec<DemandPoint>> {
        let offending = records
            .clone()
            .filter(|&(lat, lng, _)| !is_valid_coordinate(lat, lng))
            .count();
        if offending > 0 {
            return Err(CoverageError::InvalidInput { offending, total });
        }

        let mut cells: FxHashMap<CellKey, CellAccum> = FxHashMap::default();
        for (lat, lng, count) in records {
            if count == 0 {
                continue;
            }
            let Some(key) = self.cell_key(lat, lng) else {
                return Err(CoverageError::InvalidInput { offending: 1, total });
            };
            let acc = cells.entry(key).or_default();
            let w = count as f64;
            acc.sum_lat += lat * w;
            acc.sum_lng += lng * w;
            acc.count += count;
        }

        let mut cells: Vec<(CellKey, CellAccum)> = cells.into_iter().collect();
        cells.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

        let points: Vec<DemandPoint> = cells
            .into_iter()
            .map(|(_, acc)| {
                let n = acc.count as f64;
                DemandPoint::new(acc.sum_lat / n, acc.sum_lng / n, n)
            })
            .collect();

        tracing::debug!(
            records = total,
            cells = points.len(),
            grid = ?self.grid,
            "Aggregated pings into demand cells"
        );
        Ok(points)
    }
}

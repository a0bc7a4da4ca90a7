//! Station-placement candidate generation.
//!
//! The default strategy uses the demand points themselves, so every
//! candidate sits on real demand. The grid strategy lays a regular lat/lng
//! lattice over the interquartile-expanded bounding box of the demand and
//! keeps only lattice points within one grid step of some demand point.
//!
//! A non-empty demand set always yields a non-empty candidate set: when the
//! lattice is empty or too large, generation falls back to demand points.

use crate::config::CandidateStrategy;
use crate::demand::DemandPoint;
use stationcov_spatial::geometry::{degrees_to_km, is_valid_coordinate};
use stationcov_spatial::SpatialIndex;

/// Upper bound on raw lattice size before filtering.
pub const GRID_CANDIDATE_LIMIT: usize = 1_000_000;

/// Fraction of the interquartile range added on each side of the box.
const IQR_EXPANSION: f64 = 0.2;

/// Where a candidate set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    DemandPoints,
    Grid,
    /// Grid strategy requested but it produced nothing usable.
    GridFallback,
}

/// Candidate coordinates for one run.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub coords: Vec<(f64, f64)>,
    pub source: CandidateSource,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Generate candidates for `points`.
///
/// `demand_index` must index exactly `points` (the grid strategy asks it for
/// nearest-demand distances).
pub fn generate_candidates(
    points: &[DemandPoint],
    demand_index: &SpatialIndex,
    strategy: CandidateStrategy,
) -> CandidateSet {
    let from_demand = |source| CandidateSet {
        coords: points.iter().map(DemandPoint::coordinate).collect(),
        source,
    };

    match strategy {
        CandidateStrategy::DemandPoints => from_demand(CandidateSource::DemandPoints),
        CandidateStrategy::Grid { step_deg } => match grid_candidates(points, demand_index, step_deg) {
            Some(coords) if !coords.is_empty() => {
                tracing::debug!(candidates = coords.len(), step_deg, "Generated grid candidates");
                CandidateSet {
                    coords,
                    source: CandidateSource::Grid,
                }
            }
            _ => {
                if !points.is_empty() {
                    tracing::warn!(step_deg, "Grid produced no candidates; using demand points");
                }
                from_demand(CandidateSource::GridFallback)
            }
        },
    }
}

/// Linear-interpolated percentile of sorted data (`q` in 0..=100).
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = q / 100.0 * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

/// `[min, max)` stepped by `step`, like a half-open range.
fn arange(min: f64, max: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = if max > min {
        ((max - min) / step).ceil() as usize
    } else {
        0
    };
    (0..count).map(move |k| min + k as f64 * step)
}

fn expanded_range(mut values: Vec<f64>) -> (f64, f64) {
    values.sort_by(f64::total_cmp);
    let q1 = percentile(&values, 25.0);
    let q3 = percentile(&values, 75.0);
    let iqr = q3 - q1;
    (q1 - IQR_EXPANSION * iqr, q3 + IQR_EXPANSION * iqr)
}

fn grid_candidates(points: &[DemandPoint], demand_index: &SpatialIndex, step_deg: f64) -> Option<Vec<(f64, f64)>> {
    if points.is_empty() || !(step_deg.is_finite() && step_deg > 0.0) {
        return None;
    }

    let (lat_min, lat_max) = expanded_range(points.iter().map(|p| p.latitude).collect());
    let (lng_min, lng_max) = expanded_range(points.iter().map(|p| p.longitude).collect());

    let lat_steps = arange(lat_min, lat_max, step_deg).count();
    let lng_steps = arange(lng_min, lng_max, step_deg).count();
    if lat_steps.saturating_mul(lng_steps) > GRID_CANDIDATE_LIMIT {
        tracing::warn!(
            lat_steps,
            lng_steps,
            limit = GRID_CANDIDATE_LIMIT,
            "Candidate grid too large"
        );
        return None;
    }

    let max_distance_km = degrees_to_km(step_deg);
    let mut coords = Vec::new();
    for lat in arange(lat_min, lat_max, step_deg) {
        for lng in arange(lng_min, lng_max, step_deg) {
            if !is_valid_coordinate(lat, lng) {
                continue;
            }
            if let Some(nearest) = demand_index.nearest(lat, lng) {
                if nearest.distance_km <= max_distance_km {
                    coords.push((lat, lng));
                }
            }
        }
    }
    Some(coords)
}

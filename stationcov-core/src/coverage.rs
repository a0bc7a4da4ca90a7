//! Coverage precomputation.
//!
//! For every candidate, the set of demand points within the service radius
//! and the total weight of that set. Candidates are processed in fixed-size
//! batches; each batch runs in parallel on a rayon pool and results are
//! assembled in candidate order, so the output is identical regardless of
//! thread count.

use crate::error::Result;
use rayon::prelude::*;
use serde::Serialize;
use stationcov_spatial::SpatialIndex;
use std::time::Instant;

/// Demand points a single candidate would serve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageSet {
    /// Indices into the demand array, ascending.
    pub points: Vec<usize>,

    /// Sum of the weights of `points`.
    pub weight: f64,
}

impl CoverageSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Summary of one precomputation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageStats {
    pub candidates: usize,
    pub batches: usize,
    /// Candidates that cover no demand at all.
    pub empty_sets: usize,
    pub max_set_len: usize,
    pub mean_set_len: f64,
    pub elapsed_ms: u64,
}

/// Per-candidate coverage sets plus stats.
#[derive(Debug, Clone)]
pub struct CoverageMatrix {
    pub sets: Vec<CoverageSet>,
    pub stats: CoverageStats,
}

/// Parameters for [`precompute_coverage`].
#[derive(Debug, Clone, Copy)]
pub struct CoverageParams {
    pub radius_km: f64,
    pub batch_size: usize,
    /// Worker threads; `None` runs on the global rayon pool.
    pub partitions: Option<usize>,
}

/// Compute coverage sets for every candidate.
///
/// `weights[i]` is the weight of the demand point at record index `i` in
/// `demand_index`.
pub fn precompute_coverage(
    candidates: &[(f64, f64)],
    demand_index: &SpatialIndex,
    weights: &[f64],
    params: CoverageParams,
) -> Result<CoverageMatrix> {
    debug_assert_eq!(demand_index.len(), weights.len());
    let start = Instant::now();

    let compute = || -> Result<(Vec<CoverageSet>, usize)> {
        let mut sets = Vec::with_capacity(candidates.len());
        let mut batches = 0;
        for batch in candidates.chunks(params.batch_size.max(1)) {
            let batch_sets: Vec<Result<CoverageSet>> = batch
                .par_iter()
                .map(|&(lat, lng)| {
                    let points = demand_index.radius_query(lat, lng, params.radius_km)?;
                    let weight = points.iter().map(|&i| weights[i]).sum();
                    Ok(CoverageSet { points, weight })
                })
                .collect();
            for set in batch_sets {
                sets.push(set?);
            }
            batches += 1;
        }
        Ok((sets, batches))
    };

    let (sets, batches) = match params.partitions {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(compute)?
        }
        None => compute()?,
    };

    let total_len: usize = sets.iter().map(CoverageSet::len).sum();
    let stats = CoverageStats {
        candidates: sets.len(),
        batches,
        empty_sets: sets.iter().filter(|s| s.is_empty()).count(),
        max_set_len: sets.iter().map(CoverageSet::len).max().unwrap_or(0),
        mean_set_len: if sets.is_empty() {
            0.0
        } else {
            total_len as f64 / sets.len() as f64
        },
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    tracing::debug!(
        candidates = stats.candidates,
        batches = stats.batches,
        empty_sets = stats.empty_sets,
        max_set_len = stats.max_set_len,
        mean_set_len = stats.mean_set_len,
        elapsed_ms = stats.elapsed_ms,
        "Coverage precomputed"
    );

    Ok(CoverageMatrix { sets, stats })
}

/// Fraction of total demand weight within `radius_km` of any station.
///
/// Independent of the optimizer: useful for scoring a hand-picked or
/// previously saved station layout against new demand. Returns 0.0 when the
/// demand carries no weight.
pub fn evaluate_coverage(
    demand: &[crate::DemandPoint],
    stations: &[(f64, f64)],
    radius_km: f64,
) -> Result<f64> {
    let total: f64 = demand.iter().map(|p| p.weight).sum();
    if demand.is_empty() || total <= 0.0 {
        return Ok(0.0);
    }

    let coords: Vec<(f64, f64)> = demand.iter().map(|p| p.coordinate()).collect();
    let index = SpatialIndex::build(&coords)?;

    let mut covered = vec![false; demand.len()];
    for &(lat, lng) in stations {
        for i in index.radius_query(lat, lng, radius_km)? {
            covered[i] = true;
        }
    }

    let covered_weight: f64 = demand
        .iter()
        .zip(&covered)
        .filter(|&(_, &c)| c)
        .map(|(p, _)| p.weight)
        .sum();
    Ok((covered_weight / total).min(1.0))
}

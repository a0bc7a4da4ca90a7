//! Adaptive sampling of the demand working set.
//!
//! Coverage precomputation costs one radius query per candidate, so the
//! demand set is capped at `max_points`. Two strategies:
//!
//! - **Density-aware** (stratified): split the bounding box into a coarse
//!   20×20 grid, give each occupied stratum a quota proportional to its share
//!   of total weight (at least 1), and sample each stratum by weight without
//!   replacement. Every occupied region keeps a representative unless there
//!   are more occupied strata than `max_points`.
//! - **Plain**: weighted sampling without replacement over the whole set.
//!
//! Both draw from a caller-supplied RNG; seeding it makes runs reproducible.
//! Surviving points keep their input order.

use crate::demand::DemandPoint;
use rand::seq::index::sample_weighted;
use rand::Rng;
use stationcov_spatial::BBox;
use std::collections::BTreeMap;

/// Strata per axis of the coarse sampling grid.
pub const COARSE_GRID_DIM: usize = 20;

/// Downsample `points` to at most `max_points`.
///
/// Returns the input unchanged when it already fits.
pub fn adaptive_sample<R: Rng + ?Sized>(
    points: Vec<DemandPoint>,
    max_points: usize,
    density_aware: bool,
    rng: &mut R,
) -> Vec<DemandPoint> {
    if points.len() <= max_points {
        return points;
    }

    let keep = if density_aware {
        stratified_indices(&points, max_points, rng)
    } else {
        weighted_indices(&points, &(0..points.len()).collect::<Vec<_>>(), max_points, rng)
    };

    tracing::info!(
        input = points.len(),
        output = keep.len(),
        density_aware,
        "Applied adaptive sampling"
    );

    keep.into_iter().map(|i| points[i]).collect()
}

/// Weighted sample without replacement of `amount` members of `pool`.
///
/// Zero weights are lifted to the smallest positive value so they are drawn
/// only after every positively weighted member.
fn weighted_indices<R: Rng + ?Sized>(
    points: &[DemandPoint],
    pool: &[usize],
    amount: usize,
    rng: &mut R,
) -> Vec<usize> {
    let amount = amount.min(pool.len());
    let mut picked: Vec<usize> = match sample_weighted(
        rng,
        pool.len(),
        |i| points[pool[i]].weight.max(f64::MIN_POSITIVE),
        amount,
    ) {
        Ok(sample) => sample.into_iter().map(|i| pool[i]).collect(),
        // Only reachable with non-finite weights, which validation rejects.
        Err(e) => {
            tracing::warn!(error = %e, "Weighted sampling failed; keeping leading points");
            pool[..amount].to_vec()
        }
    };
    picked.sort_unstable();
    picked
}

fn stratum_of(value: f64, min: f64, span: f64) -> usize {
    if span <= 0.0 {
        return 0;
    }
    (((value - min) / span * COARSE_GRID_DIM as f64).floor() as usize).min(COARSE_GRID_DIM - 1)
}

/// Per-stratum quotas summing to at most `max_points`.
///
/// Starts from `max(1, floor(max_points * share))`, then takes surplus back
/// one unit at a time from the largest quota. If even one point per stratum
/// does not fit, only the heaviest `max_points` strata keep a point.
fn allocate_quotas(strata: &[(f64, usize)], total_weight: f64, total_points: usize, max_points: usize) -> Vec<usize> {
    let mut quotas: Vec<usize> = strata
        .iter()
        .map(|&(weight, count)| {
            let share = if total_weight > 0.0 {
                weight / total_weight
            } else {
                count as f64 / total_points as f64
            };
            ((max_points as f64 * share).floor() as usize).max(1)
        })
        .collect();

    if strata.len() > max_points {
        let mut order: Vec<usize> = (0..strata.len()).collect();
        order.sort_by(|&a, &b| strata[b].0.total_cmp(&strata[a].0).then(a.cmp(&b)));
        quotas.iter_mut().for_each(|q| *q = 0);
        for &s in order.iter().take(max_points) {
            quotas[s] = 1;
        }
        return quotas;
    }

    let mut allotted: usize = quotas.iter().sum();
    while allotted > max_points {
        let largest = quotas
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i);
        match largest {
            Some(i) if quotas[i] > 1 => {
                quotas[i] -= 1;
                allotted -= 1;
            }
            _ => break,
        }
    }
    quotas
}

fn stratified_indices<R: Rng + ?Sized>(points: &[DemandPoint], max_points: usize, rng: &mut R) -> Vec<usize> {
    let Some(bbox) = BBox::from_points(points.iter().map(DemandPoint::coordinate)) else {
        return Vec::new();
    };

    let mut strata: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, p) in points.iter().enumerate() {
        let row = stratum_of(p.latitude, bbox.min_lat, bbox.lat_span());
        let col = stratum_of(p.longitude, bbox.min_lng, bbox.lng_span());
        strata.entry(row * COARSE_GRID_DIM + col).or_default().push(i);
    }
    let strata: Vec<Vec<usize>> = strata.into_values().collect();

    let totals: Vec<(f64, usize)> = strata
        .iter()
        .map(|members| (members.iter().map(|&i| points[i].weight).sum(), members.len()))
        .collect();
    let total_weight: f64 = totals.iter().map(|t| t.0).sum();
    let quotas = allocate_quotas(&totals, total_weight, points.len(), max_points);

    tracing::debug!(strata = strata.len(), max_points, "Stratified sampling quotas allocated");

    let mut keep = Vec::with_capacity(max_points);
    for (members, &quota) in strata.iter().zip(&quotas) {
        if members.len() <= quota {
            keep.extend_from_slice(members);
        } else if quota > 0 {
            keep.extend(weighted_indices(points, members, quota, rng));
        }
    }
    keep.sort_unstable();
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Dense cluster near (7, 80) plus a sparse outlying ring.
    fn clustered(n_dense: usize, n_sparse: usize) -> Vec<DemandPoint> {
        let mut pts = Vec::new();
        for i in 0..n_dense {
            pts.push(DemandPoint::new(7.0 + (i % 50) as f64 * 1e-4, 80.0 + (i / 50) as f64 * 1e-4, 50.0));
        }
        for i in 0..n_sparse {
            let a = i as f64 / n_sparse as f64 * std::f64::consts::TAU;
            pts.push(DemandPoint::new(7.0 + a.sin(), 80.0 + a.cos(), 1.0));
        }
        pts
    }

    #[test]
    fn test_small_input_passes_through() {
        let pts = clustered(10, 5);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(adaptive_sample(pts.clone(), 100, true, &mut rng), pts);
    }

    #[test]
    fn test_output_respects_cap() {
        let pts = clustered(2000, 200);
        for density_aware in [true, false] {
            let mut rng = SmallRng::seed_from_u64(7);
            let out = adaptive_sample(pts.clone(), 300, density_aware, &mut rng);
            assert!(out.len() <= 300, "got {}", out.len());
            assert!(!out.is_empty());
        }
    }

    #[test]
    fn test_stratified_keeps_sparse_regions() {
        let pts = clustered(5000, 40);
        let mut rng = SmallRng::seed_from_u64(3);
        let out = adaptive_sample(pts, 200, true, &mut rng);

        // The dense cluster owns ~99.98% of the weight; plain weighted
        // sampling would almost never draw the ring. Stratification keeps
        // a representative per occupied stratum.
        let sparse_kept = out.iter().filter(|p| p.weight == 1.0).count();
        assert!(sparse_kept >= 20, "only {sparse_kept} sparse points kept");
    }

    #[test]
    fn test_same_seed_same_sample() {
        let pts = clustered(3000, 100);
        let a = adaptive_sample(pts.clone(), 500, true, &mut SmallRng::seed_from_u64(42));
        let b = adaptive_sample(pts, 500, true, &mut SmallRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_preserves_input_order() {
        let pts: Vec<DemandPoint> = (0..1000)
            .map(|i| DemandPoint::new(i as f64 * 0.001, 0.0, 1.0 + (i % 3) as f64))
            .collect();
        let out = adaptive_sample(pts, 100, false, &mut SmallRng::seed_from_u64(5));
        assert_eq!(out.len(), 100);
        assert!(out.windows(2).all(|w| w[0].latitude < w[1].latitude));
    }

    #[test]
    fn test_zero_weight_points_drawn_last() {
        let mut pts: Vec<DemandPoint> = (0..10).map(|i| DemandPoint::new(0.0, i as f64 * 0.01, 0.0)).collect();
        pts.extend((0..5).map(|i| DemandPoint::new(1.0, i as f64 * 0.01, 2.0)));
        let out = adaptive_sample(pts, 5, false, &mut SmallRng::seed_from_u64(9));
        assert!(out.iter().all(|p| p.weight == 2.0));
    }

    #[test]
    fn test_quota_trimming() {
        // Three strata with shares 0.98 / 0.01 / 0.01 and a cap of 10:
        // floors are 9 / 0 / 0, lifted to 9 / 1 / 1 = 11, trimmed to 8 / 1 / 1.
        let quotas = allocate_quotas(&[(98.0, 50), (1.0, 5), (1.0, 5)], 100.0, 60, 10);
        assert_eq!(quotas, vec![8, 1, 1]);
    }

    #[test]
    fn test_more_strata_than_cap() {
        let quotas = allocate_quotas(&[(1.0, 1), (5.0, 1), (3.0, 1), (5.0, 1)], 14.0, 4, 2);
        assert_eq!(quotas, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_degenerate_bbox_single_stratum() {
        let pts: Vec<DemandPoint> = (0..50).map(|_| DemandPoint::new(5.0, 5.0, 1.0)).collect();
        let out = adaptive_sample(pts, 10, true, &mut SmallRng::seed_from_u64(1));
        assert_eq!(out.len(), 10);
    }
}

//! Result types and assembly.
//!
//! Assembly is a pure transformation of a finished [`Selection`] into the
//! serializable [`OptimizationResult`]; it makes no placement decisions.

use crate::config::OptimizerConfig;
use crate::greedy::{Selection, StopReason};
use serde::{Deserialize, Serialize};

/// A placed station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// 1-based, in selection order.
    pub id: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Where a map showing the result should center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom_hint: u8,
}

/// Why a run returned no stations without running selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// Nothing left after aggregation.
    NoDemand,
    /// Demand exists but its total weight is zero.
    DegenerateWeights,
}

/// Diagnostic counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStats {
    /// Records handed to the optimizer (pings or aggregated rows).
    pub raw_records: usize,
    /// Demand points after aggregation.
    pub demand_points: usize,
    /// Demand points after sampling.
    pub sampled_points: usize,
    pub candidates: usize,
    pub stations_selected: usize,
    pub total_weight: f64,
    pub covered_weight: f64,
    pub heap_pops: usize,
    pub revalidations: usize,
    pub zero_gain_discards: usize,
    pub separation_rejections: usize,
    pub coverage_ms: u64,
    pub selection_ms: u64,
    pub elapsed_ms: u64,
}

/// Output of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub message: String,
    pub stations: Vec<Station>,
    /// Covered fraction of total weight, in `[0, 1]`.
    pub coverage_percentage: f64,
    pub map_center: MapCenter,
    /// `None` when the run short-circuited before selection.
    pub stop_reason: Option<StopReason>,
    pub empty_reason: Option<EmptyReason>,
    pub stats: OptimizationStats,
    /// Effective configuration for the run.
    pub parameters: OptimizerConfig,
}

impl OptimizationResult {
    /// Station coordinates as `(lat, lng)` pairs.
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.stations.iter().map(|s| (s.latitude, s.longitude)).collect()
    }
}

fn mean_center(coords: impl IntoIterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    let (mut lat_sum, mut lng_sum, mut n) = (0.0, 0.0, 0usize);
    for (lat, lng) in coords {
        lat_sum += lat;
        lng_sum += lng;
        n += 1;
    }
    (n > 0).then(|| (lat_sum / n as f64, lng_sum / n as f64))
}

fn map_center(center: Option<(f64, f64)>, config: &OptimizerConfig) -> MapCenter {
    let (latitude, longitude) = center.unwrap_or((config.fallback_center[0], config.fallback_center[1]));
    MapCenter {
        latitude,
        longitude,
        zoom_hint: config.zoom_level,
    }
}

/// Build the result for a completed selection.
///
/// `stats` carries the pipeline counters (record counts, timings); the
/// selection counters are filled in here. `stats.elapsed_ms` should already
/// hold the run time, as it feeds the message.
pub fn assemble(
    candidates: &[(f64, f64)],
    selection: &Selection,
    config: &OptimizerConfig,
    mut stats: OptimizationStats,
) -> OptimizationResult {
    let stations: Vec<Station> = selection
        .stations
        .iter()
        .enumerate()
        .map(|(i, &c)| Station {
            id: i + 1,
            latitude: candidates[c].0,
            longitude: candidates[c].1,
        })
        .collect();

    let center = mean_center(stations.iter().map(|s| (s.latitude, s.longitude)))
        .or_else(|| mean_center(candidates.iter().copied()));

    let coverage = selection.coverage();
    stats.stations_selected = stations.len();
    stats.total_weight = selection.total_weight;
    stats.covered_weight = selection.covered_weight;
    stats.heap_pops = selection.counters.heap_pops;
    stats.revalidations = selection.counters.revalidations;
    stats.zero_gain_discards = selection.counters.zero_gain_discards;
    stats.separation_rejections = selection.counters.separation_rejections;
    stats.selection_ms = selection.elapsed_ms;

    let message = format!(
        "Optimally selected {} stations covering {:.2}% of traffic in {:.1}s",
        stations.len(),
        coverage * 100.0,
        stats.elapsed_ms as f64 / 1000.0
    );

    OptimizationResult {
        message,
        stations,
        coverage_percentage: coverage,
        map_center: map_center(center, config),
        stop_reason: Some(selection.stop_reason),
        empty_reason: None,
        stats,
        parameters: config.clone(),
    }
}

/// Build the zero-station result for a run with nothing to optimize.
///
/// `center_hint` is used for the map when there is demand to look at.
pub fn assemble_empty(
    reason: EmptyReason,
    center_hint: &[(f64, f64)],
    config: &OptimizerConfig,
    stats: OptimizationStats,
) -> OptimizationResult {
    let message = match reason {
        EmptyReason::NoDemand => "No demand points to optimize; no stations selected",
        EmptyReason::DegenerateWeights => "Demand carries no weight; no stations selected",
    };

    OptimizationResult {
        message: message.to_string(),
        stations: Vec::new(),
        coverage_percentage: 0.0,
        map_center: map_center(mean_center(center_hint.iter().copied()), config),
        stop_reason: None,
        empty_reason: Some(reason),
        stats,
        parameters: config.clone(),
    }
}

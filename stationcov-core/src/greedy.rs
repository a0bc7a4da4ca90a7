//! Lazy greedy station selection.
//!
//! # Algorithm
//!
//! A max-heap holds one entry per candidate keyed by a cached marginal gain.
//! Cached gains only ever overestimate (coverage is submodular), so each pop
//! recomputes the real gain against the points covered so far:
//!
//! - gain collapsed below `stale_tolerance` of the cached value: re-push with
//!   the corrected gain and pop again
//! - gain zero: discard
//! - closer than `min_separation_km` to a selected station: discard for good
//!   (the selected set only grows, so it can never become admissible)
//! - otherwise accept, mark its points covered, check the stop conditions
//!
//! The loop always ends in one of the [`StopReason`]s; it never fails.

use crate::config::OptimizerConfig;
use crate::coverage::CoverageSet;
use serde::{Deserialize, Serialize};
use stationcov_spatial::haversine_km;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// Why the selection loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_stations` reached.
    StationLimit,
    /// Coverage reached the target, or every demand point is covered.
    CoverageTarget,
    /// No admissible candidate left.
    Exhaustion,
    /// Diminishing returns, or the time budget ran out.
    EarlyTermination,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::StationLimit => "station_limit",
            StopReason::CoverageTarget => "coverage_target",
            StopReason::Exhaustion => "exhaustion",
            StopReason::EarlyTermination => "early_termination",
        };
        f.write_str(s)
    }
}

/// Heap entry ordered by cached gain; ties go to the lower candidate index
/// so selection order is deterministic.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    gain: f64,
    candidate: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.candidate.cmp(&self.candidate))
    }
}

/// Knobs for one selection run.
#[derive(Debug, Clone)]
pub struct SelectionParams {
    pub max_stations: usize,
    pub min_separation_km: f64,
    pub coverage_target: f64,
    pub stale_tolerance: f64,
    pub early_termination_threshold: f64,
    pub early_termination_min_stations: usize,
    pub early_termination_target_fraction: f64,
    pub time_budget: Option<Duration>,
}

impl From<&OptimizerConfig> for SelectionParams {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            max_stations: config.max_stations,
            min_separation_km: config.min_separation_km,
            coverage_target: config.coverage_target,
            stale_tolerance: config.stale_tolerance,
            early_termination_threshold: config.early_termination_threshold,
            early_termination_min_stations: config.early_termination_min_stations,
            early_termination_target_fraction: config.early_termination_target_fraction,
            time_budget: config.time_budget_ms.map(Duration::from_millis),
        }
    }
}

/// Loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionCounters {
    pub heap_pops: usize,
    /// Stale entries re-pushed with a corrected gain.
    pub revalidations: usize,
    pub zero_gain_discards: usize,
    pub separation_rejections: usize,
}

/// Outcome of a selection run.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Candidate indices in acceptance order.
    pub stations: Vec<usize>,
    /// Marginal gain of each accepted station.
    pub gains: Vec<f64>,
    pub total_weight: f64,
    pub covered_weight: f64,
    pub uncovered_weight: f64,
    pub stop_reason: StopReason,
    pub counters: SelectionCounters,
    pub elapsed_ms: u64,
}

impl Selection {
    /// Covered fraction of total weight; 0.0 for weightless demand.
    pub fn coverage(&self) -> f64 {
        coverage_fraction(self.uncovered_weight, self.total_weight)
    }
}

fn coverage_fraction(uncovered: f64, total: f64) -> f64 {
    if total > 0.0 {
        (1.0 - uncovered / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Covered-point bookkeeping.
struct SelectionState {
    covered: Vec<bool>,
    covered_count: usize,
    total_weight: f64,
    covered_weight: f64,
    uncovered_weight: f64,
}

impl SelectionState {
    fn new(weights: &[f64]) -> Self {
        let total_weight: f64 = weights.iter().sum();
        Self {
            covered: vec![false; weights.len()],
            covered_count: 0,
            total_weight,
            covered_weight: 0.0,
            uncovered_weight: total_weight,
        }
    }

    fn marginal_gain(&self, set: &CoverageSet, weights: &[f64]) -> f64 {
        set.points
            .iter()
            .filter(|&&i| !self.covered[i])
            .map(|&i| weights[i])
            .sum()
    }

    fn mark(&mut self, set: &CoverageSet, gain: f64) {
        for &i in &set.points {
            if !self.covered[i] {
                self.covered[i] = true;
                self.covered_count += 1;
            }
        }
        if self.covered_count == self.covered.len() {
            // Everything is served; drop accumulated rounding.
            self.covered_weight = self.total_weight;
            self.uncovered_weight = 0.0;
        } else {
            self.covered_weight += gain;
            self.uncovered_weight = (self.uncovered_weight - gain).max(0.0);
        }
    }

    fn coverage(&self) -> f64 {
        coverage_fraction(self.uncovered_weight, self.total_weight)
    }
}

/// Lazy greedy selector over precomputed coverage sets.
pub struct GreedySelector<'a> {
    candidates: &'a [(f64, f64)],
    sets: &'a [CoverageSet],
    weights: &'a [f64],
    params: SelectionParams,
}

impl<'a> GreedySelector<'a> {
    /// `sets[c]` must be the coverage set of `candidates[c]`, indexing into
    /// `weights`.
    pub fn new(
        candidates: &'a [(f64, f64)],
        sets: &'a [CoverageSet],
        weights: &'a [f64],
        params: SelectionParams,
    ) -> Self {
        debug_assert_eq!(candidates.len(), sets.len());
        Self {
            candidates,
            sets,
            weights,
            params,
        }
    }

    fn too_close(&self, candidate: usize, selected: &[usize]) -> bool {
        let (lat, lng) = self.candidates[candidate];
        selected.iter().any(|&s| {
            let (s_lat, s_lng) = self.candidates[s];
            haversine_km(lat, lng, s_lat, s_lng) < self.params.min_separation_km
        })
    }

    fn diminishing_returns(&self, selected: usize, last_gain: f64, state: &SelectionState) -> bool {
        let p = &self.params;
        selected > p.early_termination_min_stations
            && last_gain / state.total_weight < p.early_termination_threshold
            && state.coverage() > p.early_termination_target_fraction * p.coverage_target
    }

    /// Run the selection loop to a terminal state.
    pub fn run(&self) -> Selection {
        let start = Instant::now();
        let mut state = SelectionState::new(self.weights);
        let mut counters = SelectionCounters::default();
        let mut stations: Vec<usize> = Vec::new();
        let mut gains: Vec<f64> = Vec::new();

        let mut heap: BinaryHeap<HeapEntry> = self
            .sets
            .iter()
            .enumerate()
            .filter(|(_, set)| set.weight > 0.0)
            .map(|(candidate, set)| HeapEntry {
                gain: set.weight,
                candidate,
            })
            .collect();

        tracing::debug!(
            candidates = self.sets.len(),
            seeded = heap.len(),
            total_weight = state.total_weight,
            "Greedy selection started"
        );

        let stop_reason = loop {
            if stations.len() >= self.params.max_stations {
                break StopReason::StationLimit;
            }
            if state.uncovered_weight <= 0.0 {
                break StopReason::CoverageTarget;
            }
            if let Some(budget) = self.params.time_budget {
                if start.elapsed() >= budget {
                    tracing::warn!(budget_ms = budget.as_millis() as u64, "Selection time budget exhausted");
                    break StopReason::EarlyTermination;
                }
            }
            let Some(entry) = heap.pop() else {
                break StopReason::Exhaustion;
            };
            counters.heap_pops += 1;

            let set = &self.sets[entry.candidate];
            let gain = state.marginal_gain(set, self.weights);

            if gain <= 0.0 {
                counters.zero_gain_discards += 1;
                continue;
            }
            if gain < self.params.stale_tolerance * entry.gain {
                counters.revalidations += 1;
                heap.push(HeapEntry {
                    gain,
                    candidate: entry.candidate,
                });
                continue;
            }
            if self.too_close(entry.candidate, &stations) {
                counters.separation_rejections += 1;
                tracing::trace!(candidate = entry.candidate, "Rejected by separation constraint");
                continue;
            }

            state.mark(set, gain);
            stations.push(entry.candidate);
            gains.push(gain);

            let coverage = state.coverage();
            tracing::debug!(
                station = stations.len(),
                candidate = entry.candidate,
                gain,
                coverage,
                "Station selected"
            );

            if coverage >= self.params.coverage_target {
                break StopReason::CoverageTarget;
            }
            if self.diminishing_returns(stations.len(), gain, &state) {
                break StopReason::EarlyTermination;
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            stations = stations.len(),
            coverage = state.coverage(),
            stop_reason = %stop_reason,
            heap_pops = counters.heap_pops,
            revalidations = counters.revalidations,
            separation_rejections = counters.separation_rejections,
            elapsed_ms,
            "Greedy selection finished"
        );

        Selection {
            stations,
            gains,
            total_weight: state.total_weight,
            covered_weight: state.covered_weight,
            uncovered_weight: state.uncovered_weight,
            stop_reason,
            counters,
            elapsed_ms,
        }
    }
}

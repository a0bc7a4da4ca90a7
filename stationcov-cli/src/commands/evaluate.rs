use crate::cli::InputFormat;
use crate::config::FileConfig;
use crate::error::{CliError, CliResult};
use crate::input::{load_records, load_stations, to_demand};
use crate::output::{emit, to_json};
use stationcov_core::evaluate_coverage;
use std::path::Path;

/// Weighted coverage of an existing layout. Demand weights are the record
/// counts (1 when absent), unscaled.
pub fn run(
    input: &Path,
    stations: &Path,
    radius_km: Option<f64>,
    format: Option<InputFormat>,
    file: &FileConfig,
) -> CliResult<()> {
    let radius_km = radius_km.unwrap_or_else(|| file.optimizer_config().service_radius_km);
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(CliError::Usage(format!("--radius-km must be > 0, got {radius_km}")));
    }

    let demand = to_demand(&load_records(input, format)?);
    let stations = load_stations(stations)?;
    let coverage = evaluate_coverage(&demand, &stations, radius_km)?;

    let report = serde_json::json!({
        "coverage_percentage": coverage,
        "stations": stations.len(),
        "demand_points": demand.len(),
        "radius_km": radius_km,
    });
    emit(&to_json(&report, false)?, None)
}

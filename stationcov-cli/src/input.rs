//! Demand and station file loading.
//!
//! Demand records are `latitude,longitude[,count]` rows (CSV with header) or
//! a JSON array of objects with the same fields. `lat`, `lng` and `lon` are
//! accepted as column aliases.

use crate::cli::InputFormat;
use crate::error::{CliError, CliResult};
use serde::Deserialize;
use stationcov_core::{DemandPoint, GpsPing, WeightedPing};
use stationcov_spatial::geometry::is_valid_coordinate;
use std::io::{self, Read};
use std::path::Path;

/// One demand record as read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct InputRecord {
    #[serde(alias = "lat", alias = "LAT", alias = "LATITUDE")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon", alias = "LON", alias = "LONGITUDE")]
    pub longitude: f64,
    #[serde(default, alias = "COUNT")]
    pub count: Option<u64>,
}

/// Pick the format from the flag, else from the file extension.
pub fn detect_format(path: &Path, explicit: Option<InputFormat>) -> CliResult<InputFormat> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("csv") => Ok(InputFormat::Csv),
        Some("json") => Ok(InputFormat::Json),
        _ if is_stdin(path) => Ok(InputFormat::Csv),
        _ => Err(CliError::Usage(format!(
            "cannot detect format of {}\n  {} pass --format csv or --format json",
            path.display(),
            colored::Colorize::bold(colored::Colorize::cyan("help:"))
        ))),
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_source(path: &Path) -> CliResult<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .map_err(|e| CliError::Input(format!("failed to read {}: {e}", path.display())))
}

/// Parse records from text in the given format.
pub fn parse_records(content: &str, format: InputFormat) -> CliResult<Vec<InputRecord>> {
    match format {
        InputFormat::Json => Ok(serde_json::from_str(content)?),
        InputFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(content.as_bytes());
            let mut records = Vec::new();
            for row in reader.deserialize() {
                records.push(row?);
            }
            Ok(records)
        }
    }
}

/// Read and parse a demand file.
pub fn load_records(path: &Path, format: Option<InputFormat>) -> CliResult<Vec<InputRecord>> {
    let format = detect_format(path, format)?;
    let records = parse_records(&read_source(path)?, format)?;
    tracing::debug!(path = %path.display(), records = records.len(), ?format, "Loaded input");
    Ok(records)
}

/// Records as raw pings; `count` is ignored.
pub fn to_pings(records: &[InputRecord]) -> Vec<GpsPing> {
    records.iter().map(|r| GpsPing::new(r.latitude, r.longitude)).collect()
}

/// Records as pre-aggregated pings; every record must carry a count.
pub fn to_weighted(records: &[InputRecord]) -> CliResult<Vec<WeightedPing>> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| match r.count {
            Some(count) => Ok(WeightedPing::new(r.latitude, r.longitude, count)),
            None => Err(CliError::Input(format!(
                "record {} has no count; --aggregated needs a count for every record",
                i + 1
            ))),
        })
        .collect()
}

/// Records as demand points weighted by their count (1 when absent).
pub fn to_demand(records: &[InputRecord]) -> Vec<DemandPoint> {
    records
        .iter()
        .map(|r| DemandPoint::new(r.latitude, r.longitude, r.count.unwrap_or(1) as f64))
        .collect()
}

#[derive(Deserialize)]
struct StationCoord {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StationsFile {
    Result { stations: Vec<StationCoord> },
    List(Vec<StationCoord>),
}

/// Load station coordinates from a saved result or a plain JSON array.
pub fn load_stations(path: &Path) -> CliResult<Vec<(f64, f64)>> {
    parse_stations(&read_source(path)?)
}

/// Parse station coordinates, rejecting the file if any are out of range.
pub fn parse_stations(content: &str) -> CliResult<Vec<(f64, f64)>> {
    let parsed: StationsFile = serde_json::from_str(content)?;
    let stations = match parsed {
        StationsFile::Result { stations } | StationsFile::List(stations) => stations,
    };

    let offending = stations
        .iter()
        .filter(|s| !is_valid_coordinate(s.latitude, s.longitude))
        .count();
    if offending > 0 {
        return Err(CliError::Input(format!(
            "{offending} of {} station records have invalid coordinates",
            stations.len()
        )));
    }
    Ok(stations.into_iter().map(|s| (s.latitude, s.longitude)).collect())
}

//! Config file support.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI arguments
//! 2. Config file (`[optimizer]`, `[output]`)
//! 3. Built-in defaults
//!
//! ```toml
//! [optimizer]
//! service_radius_km = 3.0
//! max_stations = 20
//!
//! [optimizer.candidates]
//! kind = "grid"
//! step_deg = 0.01
//!
//! [output]
//! pretty = true
//! stage_dir = "results"
//! ```

use crate::cli::OptimizeArgs;
use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use stationcov_core::{AggregationGrid, CandidateStrategy, OptimizerConfig};
use std::path::{Path, PathBuf};

/// Top-level config file structure. Absent sections mean "not set in file".
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileConfig {
    /// `[optimizer]`; any subset of the optimizer fields.
    #[serde(default)]
    pub optimizer: Option<OptimizerConfig>,

    /// `[output]`
    #[serde(default)]
    pub output: Option<OutputFileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct OutputFileConfig {
    pub pretty: Option<bool>,
    pub stage_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Optimizer settings from the file over defaults.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        self.optimizer.clone().unwrap_or_default()
    }

    pub fn pretty(&self) -> bool {
        self.output.as_ref().and_then(|o| o.pretty).unwrap_or(false)
    }

    pub fn stage_dir(&self) -> Option<&Path> {
        self.output.as_ref().and_then(|o| o.stage_dir.as_deref())
    }
}

/// Load the config file, or defaults when no path is given.
pub fn load_file_config(path: Option<&Path>) -> CliResult<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("failed to read {}: {e}", path.display())))?;
    let config: FileConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Apply command-line overrides on top of `config`.
pub fn apply_overrides(mut config: OptimizerConfig, args: &OptimizeArgs) -> OptimizerConfig {
    if let Some(v) = args.radius_km {
        config.service_radius_km = v;
    }
    if let Some(v) = args.min_separation_km {
        config.min_separation_km = v;
    }
    if let Some(v) = args.coverage_target {
        config.coverage_target = v;
    }
    if let Some(v) = args.max_stations {
        config.max_stations = v;
    }
    if args.no_traffic_weighting {
        config.use_traffic_weighting = false;
    }
    if let Some(resolution) = args.h3_resolution {
        config.aggregation = AggregationGrid::Hex { resolution };
    }
    if let Some(cell_deg) = args.cell_deg {
        config.aggregation = AggregationGrid::Uniform { cell_deg };
    }
    if let Some(v) = args.max_data_points {
        config.max_data_points = v;
    }
    if let Some(v) = args.early_termination_threshold {
        config.early_termination_threshold = v;
    }
    if let Some(step_deg) = args.grid_step_deg {
        config.candidates = CandidateStrategy::Grid { step_deg };
    }
    if let Some(v) = args.seed {
        config.sampling_seed = v;
    }
    if let Some(v) = args.threads {
        config.coverage_partitions = Some(v);
    }
    if let Some(v) = args.time_budget_ms {
        config.time_budget_ms = Some(v);
    }
    config
}

/// Render an optimizer config as a `[optimizer]` TOML document.
pub fn render_toml(config: &OptimizerConfig) -> CliResult<String> {
    let file = FileConfig {
        optimizer: Some(config.clone()),
        output: None,
    };
    toml::to_string_pretty(&file).map_err(|e| CliError::Config(format!("failed to render config: {e}")))
}

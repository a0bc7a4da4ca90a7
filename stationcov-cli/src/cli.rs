use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stationcov", about = "Service-station coverage optimizer", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Place stations over demand read from a CSV or JSON file
    Optimize(OptimizeArgs),

    /// Score an existing station layout against demand
    Evaluate {
        /// Demand file (CSV or JSON); `-` reads stdin
        input: PathBuf,

        /// Stations file: a saved result or a JSON array of {latitude, longitude}
        #[arg(long)]
        stations: PathBuf,

        /// Service radius in km (defaults to the configured radius)
        #[arg(long)]
        radius_km: Option<f64>,

        /// Input format; detected from the file extension if omitted
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
    },

    /// Print the effective optimizer configuration as TOML
    Config,
}

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Json,
}

#[derive(Args, Debug, Default)]
pub struct OptimizeArgs {
    /// Demand file (CSV or JSON); `-` reads stdin
    pub input: PathBuf,

    /// Input format; detected from the file extension if omitted
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Records carry a `count` column of pre-aggregated pings
    #[arg(long)]
    pub aggregated: bool,

    /// Service radius in km
    #[arg(long)]
    pub radius_km: Option<f64>,

    /// Minimum distance between stations in km
    #[arg(long)]
    pub min_separation_km: Option<f64>,

    /// Stop once this fraction of weighted demand is covered
    #[arg(long)]
    pub coverage_target: Option<f64>,

    /// Maximum number of stations
    #[arg(long)]
    pub max_stations: Option<usize>,

    /// Treat every demand cell as weight 1
    #[arg(long)]
    pub no_traffic_weighting: bool,

    /// H3 resolution for ping aggregation (0-15)
    #[arg(long, conflicts_with = "cell_deg")]
    pub h3_resolution: Option<u8>,

    /// Aggregate on square lat/lng cells of this size instead of H3
    #[arg(long)]
    pub cell_deg: Option<f64>,

    /// Cap on the working set before sampling kicks in
    #[arg(long)]
    pub max_data_points: Option<usize>,

    /// Minimum per-station improvement before early termination
    #[arg(long)]
    pub early_termination_threshold: Option<f64>,

    /// Use a lat/lng grid of this step as candidates instead of demand points
    #[arg(long)]
    pub grid_step_deg: Option<f64>,

    /// Seed for sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads for coverage precomputation
    #[arg(long)]
    pub threads: Option<usize>,

    /// Wall-clock budget for station selection in milliseconds
    #[arg(long)]
    pub time_budget_ms: Option<u64>,

    /// Write the result to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,

    /// Also save the compact result into this directory
    #[arg(long)]
    pub stage_dir: Option<PathBuf>,
}

use crate::cli::OptimizeArgs;
use crate::config::{apply_overrides, FileConfig};
use crate::error::CliResult;
use crate::input::{load_records, to_pings, to_weighted};
use crate::output::{emit, to_json, StageDirSink};
use colored::Colorize;
use stationcov_core::{persist_result, CoverageOptimizer};

pub fn run(args: &OptimizeArgs, file: &FileConfig, quiet: bool) -> CliResult<()> {
    let config = apply_overrides(file.optimizer_config(), args);
    let optimizer = CoverageOptimizer::new(config)?;

    let records = load_records(&args.input, args.format)?;
    let result = if args.aggregated {
        optimizer.optimize_weighted(&to_weighted(&records)?)?
    } else {
        optimizer.optimize_pings(&to_pings(&records))?
    };

    let pretty = args.pretty || file.pretty();
    emit(&to_json(&result, pretty)?, args.output.as_deref())?;

    if let Some(dir) = args.stage_dir.as_deref().or(file.stage_dir()) {
        match persist_result(&StageDirSink::new(dir), &result) {
            Some(name) => {
                if !quiet {
                    eprintln!("{} {}", "saved:".green().bold(), dir.join(name).display());
                }
            }
            None => eprintln!(
                "{} could not save result to {}",
                "warning:".yellow().bold(),
                dir.display()
            ),
        }
    }

    if !quiet && args.output.is_some() {
        eprintln!("{}", result.message);
    }
    Ok(())
}

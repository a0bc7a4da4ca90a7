use crate::error::{CliError, CliResult};
use serde::Serialize;
use stationcov_core::{CoverageError, ResultSink};
use std::path::{Path, PathBuf};

/// Serialize `value` as JSON, pretty or compact.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> CliResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| CliError::Output(format!("failed to serialize result: {e}")))
}

/// Write `json` to `path`, or to stdout when no path is given.
pub fn emit(json: &str, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .map_err(|e| CliError::Output(format!("failed to write {}: {e}", path.display()))),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/// Result sink writing one file per payload into a directory.
#[derive(Debug, Clone)]
pub struct StageDirSink {
    dir: PathBuf,
}

impl StageDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultSink for StageDirSink {
    fn persist(&self, name: &str, payload: &[u8]) -> stationcov_core::Result<()> {
        let sink_err = |e: std::io::Error| CoverageError::Sink(format!("{}: {e}", self.dir.display()));
        std::fs::create_dir_all(&self.dir).map_err(sink_err)?;
        std::fs::write(self.dir.join(name), payload).map_err(sink_err)
    }
}

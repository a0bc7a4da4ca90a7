//! Hand-off of finished results to durable storage.
//!
//! The optimizer never does I/O itself. A [`ResultSink`] receives the
//! serialized result as an opaque payload under a generated name; failure to
//! persist is logged and does not fail the run.

use crate::error::{CoverageError, Result};
use crate::result::OptimizationResult;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Destination for serialized results.
pub trait ResultSink {
    /// Store `payload` under `name`.
    fn persist(&self, name: &str, payload: &[u8]) -> Result<()>;
}

/// `stations_opt_<n>_<unix-seconds>.json`
pub fn result_file_name(stations: usize, unix_secs: u64) -> String {
    format!("stations_opt_{stations}_{unix_secs}.json")
}

/// Serialize `result` as compact JSON and hand it to `sink`.
///
/// Returns the name it was stored under, or `None` (after a warning) if
/// serialization or the sink failed.
pub fn persist_result(sink: &dyn ResultSink, result: &OptimizationResult) -> Option<String> {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let name = result_file_name(result.stations.len(), unix_secs);

    let outcome = serde_json::to_vec(result)
        .map_err(|e| CoverageError::Sink(e.to_string()))
        .and_then(|payload| sink.persist(&name, &payload));

    match outcome {
        Ok(()) => {
            tracing::info!(name = %name, "Result persisted");
            Some(name)
        }
        Err(e) => {
            tracing::warn!(error = %e, name = %name, "Failed to persist result");
            None
        }
    }
}

/// In-memory sink; keeps every payload it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored `(name, payload)` pairs in arrival order.
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for MemorySink {
    fn persist(&self, name: &str, payload: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CoverageError::Sink("memory sink lock poisoned".to_string()))?;
        entries.push((name.to_string(), payload.to_vec()));
        Ok(())
    }
}

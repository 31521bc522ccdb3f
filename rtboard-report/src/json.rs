//! JSON Snapshots
//!
//! One pretty-printed JSON object per run, written to a timestamped file.
//! Loading a snapshot back recovers the same statistics: the model is
//! plain serde data with no lossy massaging on either side.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use crate::model::RunReport;

/// Snapshot persistence failures.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem trouble
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed snapshot
    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a report into pretty JSON.
pub fn to_json(report: &RunReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write a report to an explicit path.
pub fn write_report(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_json(report)?)?;
    Ok(())
}

/// Write a report into `dir` under a timestamped file name and return the
/// path used.
pub fn save_report(report: &RunReport, dir: &Path) -> Result<PathBuf, ReportError> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("rtboard_results_{stamp}.json"));
    write_report(report, &path)?;
    Ok(path)
}

/// Load a snapshot back.
pub fn load_report(path: &Path) -> Result<RunReport, ReportError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#![warn(missing_docs)]
//! rtboard report - aggregation, persistence and the board
//!
//! Composes the measurements into one [`RunReport`], persists it as a
//! timestamped JSON snapshot and renders the human-readable ASCII board.
//! The snapshot format is for human and archival consumption, not a
//! versioned wire contract.

mod board;
mod certification;
mod json;
mod model;

pub use board::render_board;
pub use certification::{composite_score, CertificationSummary, OverallTier};
pub use json::{load_report, save_report, write_report, ReportError};
pub use model::{
    AlgorithmReport, LoadLatency, ReportMeta, RunReport, SystemInfo, ThermalReport, SCHEMA_VERSION,
};

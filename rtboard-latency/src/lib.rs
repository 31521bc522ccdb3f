#![warn(missing_docs)]
//! rtboard latency - scheduler latency measurement
//!
//! Wraps the external cyclic latency probe: builds its command lines,
//! bounds its runtime, parses its summary output into structured
//! statistics and classifies the result into a real-time tier. When the
//! probe cannot run (missing binary, wrong platform, no privileges) the
//! adapter degrades to a clearly-flagged simulation rather than failing
//! the board.

mod analysis;
mod parse;
mod probe;
mod simulate;
mod types;

pub use analysis::{analyze_distribution, DistributionStats, LatencyDistribution};
pub use parse::{parse_summary, LatencySummary, ParseError, MAX_RAW_DIAGNOSTIC};
pub use probe::{LatencyProbe, ProbeError, ProbeOutcome, DEFAULT_PROBE_COMMAND};
pub use simulate::{simulated_measurement, SIM_JITTER_MAX_US, SIM_MIN_BASE_US};
pub use types::{LatencyClass, LatencyMeasurement};

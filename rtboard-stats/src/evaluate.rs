//! Per-Workload Evaluation
//!
//! Combines a timing summary with operation counts and temperature readings
//! into the statistics record the board reports for each workload.

use serde::{Deserialize, Serialize};

use crate::rating::RtRating;
use crate::summary::{compute_summary, TimingSummary};

/// Full statistics for one benchmarked workload.
///
/// Recomputed fresh for every benchmark run; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Timing dispersion metrics (seconds)
    pub timing: TimingSummary,
    /// Mean operation count per run (0 when the workload does not count)
    pub mean_operations: f64,
    /// Operations per second derived from mean time and mean count
    pub operations_per_second: f64,
    /// Suitability tier derived from the coefficient of variation
    pub rating: RtRating,
    /// Whether the tier carries certification
    pub certified: bool,
    /// Mean temperature across the runs, when a sensor was available
    pub avg_temperature_c: Option<f64>,
}

impl AlgorithmStatistics {
    /// The documented zero-run result: all metrics zero, rating
    /// `NotSuitable`, uncertified. An empty sample proves nothing, so it
    /// must not inherit the hard-real-time tier a zero CV would imply.
    pub fn empty() -> Self {
        Self {
            timing: TimingSummary::empty(),
            mean_operations: 0.0,
            operations_per_second: 0.0,
            rating: RtRating::NotSuitable,
            certified: false,
            avg_temperature_c: None,
        }
    }
}

/// Evaluate a collected sample.
///
/// `times_s` and `op_counts` are parallel sequences (one entry per
/// successful run); `temperatures_c` may be shorter when the sensor was
/// intermittently unavailable.
pub fn evaluate(times_s: &[f64], op_counts: &[u64], temperatures_c: &[f64]) -> AlgorithmStatistics {
    if times_s.is_empty() {
        return AlgorithmStatistics::empty();
    }

    let timing = compute_summary(times_s);

    let mean_operations = if op_counts.is_empty() {
        0.0
    } else {
        op_counts.iter().sum::<u64>() as f64 / op_counts.len() as f64
    };

    let operations_per_second = if timing.mean > 0.0 && mean_operations > 0.0 {
        mean_operations / timing.mean
    } else {
        0.0
    };

    let rating = RtRating::from_cv(timing.cv_percent);

    let avg_temperature_c = if temperatures_c.is_empty() {
        None
    } else {
        Some(temperatures_c.iter().sum::<f64>() / temperatures_c.len() as f64)
    };

    AlgorithmStatistics {
        timing,
        mean_operations,
        operations_per_second,
        rating,
        certified: rating.is_certified(),
        avg_temperature_c,
    }
}

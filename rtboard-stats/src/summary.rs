//! Summary Statistics
//!
//! Computes dispersion metrics over repeated wall-clock timings of one
//! operation. The coefficient of variation (relative stddev) is the primary
//! predictability signal; jitter (max − min) is the secondary one.

use serde::{Deserialize, Serialize};

/// Summary statistics over a set of timing samples.
///
/// All values carry the unit of the input samples (the harness feeds seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Median (50th percentile, linear interpolation)
    pub median: f64,
    /// Sample standard deviation (n − 1 denominator)
    pub std_dev: f64,
    /// Smallest observed value
    pub min: f64,
    /// Largest observed value
    pub max: f64,
    /// Coefficient of variation: stddev / mean × 100 (0 when mean is 0)
    pub cv_percent: f64,
    /// Timing spread: max − min
    pub jitter: f64,
    /// Number of samples the summary was computed from
    pub sample_count: usize,
}

impl TimingSummary {
    /// Summary of an empty sample set. All metrics zero.
    pub fn empty() -> Self {
        Self {
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            cv_percent: 0.0,
            jitter: 0.0,
            sample_count: 0,
        }
    }
}

/// Compute summary statistics over raw samples.
///
/// An empty slice yields [`TimingSummary::empty`] rather than NaN-poisoned
/// fields, so callers never divide by zero downstream.
pub fn compute_summary(samples: &[f64]) -> TimingSummary {
    if samples.is_empty() {
        return TimingSummary::empty();
    }

    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;

    let std_dev = if n < 2 {
        0.0
    } else {
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    };

    let min = samples
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min)
        .min(samples[0]);
    let max = samples
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        .max(samples[0]);

    let cv_percent = if mean > 0.0 {
        (std_dev / mean) * 100.0
    } else {
        0.0
    };

    TimingSummary {
        mean,
        median: median_of(samples),
        std_dev,
        min,
        max,
        cv_percent,
        jitter: max - min,
        sample_count: n,
    }
}

fn median_of(samples: &[f64]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_summary() {
        let summary = compute_summary(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((summary.mean - 3.0).abs() < 1e-12);
        assert!((summary.median - 3.0).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert!((summary.jitter - 4.0).abs() < 1e-12);
        assert_eq!(summary.sample_count, 5);
    }

    #[test]
    fn identical_samples_have_zero_cv() {
        let summary = compute_summary(&[0.004, 0.004, 0.004, 0.004]);
        assert!(summary.std_dev.abs() < f64::EPSILON);
        assert!(summary.cv_percent.abs() < f64::EPSILON);
        assert!(summary.jitter.abs() < f64::EPSILON);
    }

    #[test]
    fn single_sample_has_zero_stddev() {
        let summary = compute_summary(&[0.1]);
        assert_eq!(summary.sample_count, 1);
        assert!(summary.std_dev.abs() < f64::EPSILON);
        assert!((summary.median - 0.1).abs() < 1e-12);
    }

    #[test]
    fn empty_samples_yield_zeros() {
        let summary = compute_summary(&[]);
        assert_eq!(summary, TimingSummary::empty());
    }

    #[test]
    fn even_count_median_interpolates() {
        let summary = compute_summary(&[1.0, 2.0, 3.0, 4.0]);
        assert!((summary.median - 2.5).abs() < 1e-12);
    }

    #[test]
    fn jitter_never_negative() {
        let summary = compute_summary(&[0.002, 0.0021, 0.0019, 0.002]);
        assert!(summary.jitter >= 0.0);
    }
}

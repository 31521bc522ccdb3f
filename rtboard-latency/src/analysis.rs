//! Latency Distribution Analysis
//!
//! Aggregates repeated probe runs into distribution statistics per metric
//! (worst case, average, jitter). Used when the board is asked to repeat
//! the latency phase and by the test suite to sanity-check the simulator.

use rtboard_stats::{compute_summary, TimingSummary};

use crate::types::LatencyMeasurement;

/// Distribution of one latency metric across runs.
#[derive(Debug, Clone)]
pub struct DistributionStats {
    /// Summary over the metric's values (microseconds)
    pub summary: TimingSummary,
}

/// Distributions across a set of probe runs.
#[derive(Debug, Clone)]
pub struct LatencyDistribution {
    /// Worst-case latency across runs
    pub max_latency: DistributionStats,
    /// Average latency across runs
    pub avg_latency: DistributionStats,
    /// Jitter across runs
    pub jitter: DistributionStats,
    /// Total measurements considered
    pub test_count: usize,
    /// Share of runs that carried a worst-case figure, in percent
    pub success_rate: f64,
}

/// Analyze a batch of measurements. Returns `None` when no run carried a
/// usable worst-case latency.
pub fn analyze_distribution(measurements: &[LatencyMeasurement]) -> Option<LatencyDistribution> {
    if measurements.is_empty() {
        return None;
    }

    let max_values: Vec<f64> = measurements
        .iter()
        .filter_map(|m| m.max_us)
        .map(|v| v as f64)
        .collect();
    if max_values.is_empty() {
        return None;
    }

    let avg_values: Vec<f64> = measurements
        .iter()
        .filter_map(|m| m.avg_us)
        .map(|v| v as f64)
        .collect();
    let jitter_values: Vec<f64> = measurements
        .iter()
        .filter_map(|m| m.jitter_us)
        .map(|v| v as f64)
        .collect();

    Some(LatencyDistribution {
        max_latency: DistributionStats {
            summary: compute_summary(&max_values),
        },
        avg_latency: DistributionStats {
            summary: compute_summary(&avg_values),
        },
        jitter: DistributionStats {
            summary: compute_summary(&jitter_values),
        },
        test_count: measurements.len(),
        success_rate: max_values.len() as f64 / measurements.len() as f64 * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::simulated_measurement;

    #[test]
    fn empty_input_has_no_distribution() {
        assert!(analyze_distribution(&[]).is_none());
    }

    #[test]
    fn all_unknown_measurements_have_no_distribution() {
        let unknown = LatencyMeasurement::from_latencies(None, None, None, 5.0, false);
        assert!(analyze_distribution(&[unknown]).is_none());
    }

    #[test]
    fn distribution_over_simulated_runs() {
        let runs: Vec<LatencyMeasurement> =
            (0..20).map(|_| simulated_measurement(15.0)).collect();
        let dist = analyze_distribution(&runs).expect("simulated runs analyze");

        assert_eq!(dist.test_count, 20);
        assert!((dist.success_rate - 100.0).abs() < f64::EPSILON);
        assert!(dist.max_latency.summary.mean >= 8.0);
        assert!(dist.max_latency.summary.max <= 21.0);
        assert!(dist.jitter.summary.min >= 0.0);
    }

    #[test]
    fn mixed_success_rate() {
        let good = LatencyMeasurement::from_latencies(Some(5), Some(10), Some(20), 5.0, false);
        let bad = LatencyMeasurement::from_latencies(None, None, None, 5.0, false);
        let dist = analyze_distribution(&[good, bad]).expect("one good run analyzes");
        assert_eq!(dist.test_count, 2);
        assert!((dist.success_rate - 50.0).abs() < f64::EPSILON);
    }
}

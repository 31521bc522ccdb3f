//! Certification Summary
//!
//! Rolls the per-workload verdicts and the baseline latency into one
//! overall tier plus a weighted readiness score. The tier rules: most
//! workloads certified and a sub-50 µs worst case make the system
//! certified; half the workloads certified still earns soft suitability.

use serde::{Deserialize, Serialize};

use rtboard_latency::{LatencyClass, LatencyMeasurement};

use crate::model::AlgorithmReport;

/// Certification rate required for the top tier, in percent.
const CERTIFIED_RATE_PERCENT: f64 = 80.0;
/// Baseline worst case required for the top tier, in microseconds.
const CERTIFIED_MAX_LATENCY_US: u64 = 50;
/// Certification rate required for soft suitability, in percent.
const SOFT_RATE_PERCENT: f64 = 50.0;

/// Overall system verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallTier {
    /// Certified for real-time applications
    Certified,
    /// Suitable for soft real-time applications
    SoftSuitable,
    /// Not suitable for real-time applications
    NotSuitable,
}

impl OverallTier {
    /// Human label used by the board renderer.
    pub fn label(self) -> &'static str {
        match self {
            OverallTier::Certified => "SYSTEM CERTIFIED FOR REAL-TIME APPLICATIONS",
            OverallTier::SoftSuitable => "SYSTEM SUITABLE FOR SOFT REAL-TIME APPLICATIONS",
            OverallTier::NotSuitable => "SYSTEM NOT SUITABLE FOR REAL-TIME APPLICATIONS",
        }
    }
}

/// Aggregated certification verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationSummary {
    /// Workloads whose rating carries certification
    pub certified_workloads: usize,
    /// Workloads measured
    pub total_workloads: usize,
    /// certified / total × 100
    pub cert_rate_percent: f64,
    /// Overall verdict
    pub overall: OverallTier,
}

impl CertificationSummary {
    /// Evaluate the verdicts for a run.
    pub fn evaluate(
        algorithms: &[AlgorithmReport],
        baseline: Option<&LatencyMeasurement>,
    ) -> Self {
        let total_workloads = algorithms.len();
        let certified_workloads = algorithms
            .iter()
            .filter(|a| a.statistics.certified)
            .count();
        let cert_rate_percent = if total_workloads > 0 {
            certified_workloads as f64 / total_workloads as f64 * 100.0
        } else {
            0.0
        };

        let latency_ok = baseline
            .and_then(|m| m.max_us)
            .map(|max| max <= CERTIFIED_MAX_LATENCY_US)
            .unwrap_or(false);

        let overall = if cert_rate_percent >= CERTIFIED_RATE_PERCENT && latency_ok {
            OverallTier::Certified
        } else if cert_rate_percent >= SOFT_RATE_PERCENT {
            OverallTier::SoftSuitable
        } else {
            OverallTier::NotSuitable
        };

        Self {
            certified_workloads,
            total_workloads,
            cert_rate_percent,
            overall,
        }
    }
}

/// Weighted 0–100 readiness score: 60% workload certification rate, 40%
/// latency tier. A policy number for the leaderboard, not a guarantee.
pub fn composite_score(
    certification: &CertificationSummary,
    baseline: Option<&LatencyMeasurement>,
) -> f64 {
    let latency_component = match baseline.map(|m| m.classification) {
        Some(LatencyClass::HardRealTime) => 100.0,
        Some(LatencyClass::SoftRealTime) => 80.0,
        Some(LatencyClass::NearRealTime) => 60.0,
        Some(LatencyClass::NonRealTime) => 30.0,
        Some(LatencyClass::Unknown) | None => 50.0,
    };
    certification.cert_rate_percent * 0.6 + latency_component * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtboard_stats::{evaluate, AlgorithmStatistics};

    fn report(id: &str, statistics: AlgorithmStatistics) -> AlgorithmReport {
        AlgorithmReport {
            id: id.to_string(),
            name: id.to_string(),
            statistics,
            failed_runs: 0,
        }
    }

    fn certified_stats() -> AlgorithmStatistics {
        evaluate(&[0.001; 10], &[100; 10], &[])
    }

    fn uncertified_stats() -> AlgorithmStatistics {
        evaluate(&[0.001, 0.002, 0.0005, 0.003], &[100; 4], &[])
    }

    fn fast_baseline() -> LatencyMeasurement {
        LatencyMeasurement::from_latencies(Some(4), Some(9), Some(20), 15.0, false)
    }

    #[test]
    fn all_certified_with_fast_latency_is_certified() {
        let algorithms = vec![
            report("a", certified_stats()),
            report("b", certified_stats()),
            report("c", certified_stats()),
        ];
        let summary = CertificationSummary::evaluate(&algorithms, Some(&fast_baseline()));
        assert_eq!(summary.overall, OverallTier::Certified);
        assert!((summary.cert_rate_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slow_latency_blocks_full_certification() {
        let slow = LatencyMeasurement::from_latencies(Some(50), Some(200), Some(800), 15.0, false);
        let algorithms = vec![report("a", certified_stats()), report("b", certified_stats())];
        let summary = CertificationSummary::evaluate(&algorithms, Some(&slow));
        assert_eq!(summary.overall, OverallTier::SoftSuitable);
    }

    #[test]
    fn half_certified_is_soft_suitable() {
        let algorithms = vec![
            report("a", certified_stats()),
            report("b", uncertified_stats()),
        ];
        let summary = CertificationSummary::evaluate(&algorithms, Some(&fast_baseline()));
        assert_eq!(summary.overall, OverallTier::SoftSuitable);
    }

    #[test]
    fn nothing_certified_is_not_suitable() {
        let algorithms = vec![
            report("a", uncertified_stats()),
            report("b", uncertified_stats()),
        ];
        let summary = CertificationSummary::evaluate(&algorithms, None);
        assert_eq!(summary.overall, OverallTier::NotSuitable);
        assert_eq!(summary.certified_workloads, 0);
    }

    #[test]
    fn empty_run_is_not_suitable() {
        let summary = CertificationSummary::evaluate(&[], None);
        assert_eq!(summary.overall, OverallTier::NotSuitable);
        assert_eq!(summary.cert_rate_percent, 0.0);
    }

    #[test]
    fn composite_score_weights_latency() {
        let algorithms = vec![report("a", certified_stats())];
        let summary = CertificationSummary::evaluate(&algorithms, Some(&fast_baseline()));
        let score = composite_score(&summary, Some(&fast_baseline()));
        // 100 × 0.6 + 80 × 0.4 (soft tier baseline at 20 µs)
        assert!((score - 92.0).abs() < 1e-9);
        let no_latency = composite_score(&summary, None);
        assert!((no_latency - 80.0).abs() < 1e-9);
    }
}

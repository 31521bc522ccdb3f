//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rtboard_core::{platform, Capabilities, CoreComparison, EnvironmentState};
use rtboard_latency::LatencyMeasurement;
use rtboard_stats::AlgorithmStatistics;

use crate::certification::CertificationSummary;

/// Snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// One complete board run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run metadata: versions, timestamp, host description
    pub meta: ReportMeta,
    /// Detected real-time capabilities
    pub capabilities: Capabilities,
    /// Environment flags as applied for the measurement window
    pub environment: EnvironmentState,
    /// Baseline latency measurement (absent only when the probe failed
    /// with fallback disabled)
    pub latency_baseline: Option<LatencyMeasurement>,
    /// Latency re-measured while each workload acted as load
    pub latency_under_load: Vec<LoadLatency>,
    /// Per-workload timing statistics
    pub algorithms: Vec<AlgorithmReport>,
    /// Single-core vs. multicore scaling, when the phase ran
    pub core_comparison: Option<CoreComparison>,
    /// Temperatures at the edges of the run
    pub thermal: ThermalReport,
    /// Certification verdicts
    pub certification: CertificationSummary,
    /// Weighted 0–100 readiness score
    pub composite_score: f64,
}

/// Run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Snapshot schema version
    pub schema_version: u32,
    /// rtboard crate version
    pub version: String,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Host description
    pub system: SystemInfo,
}

impl ReportMeta {
    /// Metadata for a run finishing now on this host.
    pub fn collect() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system: SystemInfo::collect(),
        }
    }
}

/// Host description. Linux-specific fields degrade to `None` elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// Kernel release, when readable
    pub kernel: Option<String>,
    /// CPU model name, when readable
    pub cpu: Option<String>,
    /// Logical core count
    pub cpu_cores: usize,
    /// Total memory in GB, when readable
    pub memory_gb: Option<f64>,
}

impl SystemInfo {
    /// Describe the current host.
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            kernel: platform::kernel_release(),
            cpu: platform::cpu_model(),
            cpu_cores: platform::core_count(),
            memory_gb: platform::memory_gb(),
        }
    }
}

/// Statistics for one benchmarked workload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmReport {
    /// Workload identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Derived statistics
    pub statistics: AlgorithmStatistics,
    /// Runs excluded after failures
    pub failed_runs: usize,
}

/// Latency measured while a workload acted as computational load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadLatency {
    /// The workload that provided the load
    pub workload_id: String,
    /// The measurement taken under that load
    pub measurement: LatencyMeasurement,
}

impl LoadLatency {
    /// Worst-case degradation against a baseline, when both sides carry a
    /// maximum.
    pub fn degradation_us(&self, baseline: &LatencyMeasurement) -> Option<i64> {
        match (self.measurement.max_us, baseline.max_us) {
            (Some(loaded), Some(base)) => Some(loaded as i64 - base as i64),
            _ => None,
        }
    }
}

/// Temperatures at the edges of the run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThermalReport {
    /// Before the first phase
    pub initial_c: Option<f64>,
    /// After the last phase
    pub final_c: Option<f64>,
}

impl ThermalReport {
    /// Temperature rise across the run, when both edges were readable.
    pub fn rise_c(&self) -> Option<f64> {
        match (self.initial_c, self.final_c) {
            (Some(initial), Some(last)) => Some(last - initial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtboard_latency::LatencyMeasurement;

    #[test]
    fn system_info_collects_without_panicking() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores >= 1);
    }

    #[test]
    fn load_degradation_is_signed() {
        let baseline = LatencyMeasurement::from_latencies(Some(5), Some(10), Some(20), 15.0, false);
        let better = LoadLatency {
            workload_id: "x".into(),
            measurement: LatencyMeasurement::from_latencies(Some(5), Some(9), Some(15), 7.0, false),
        };
        let worse = LoadLatency {
            workload_id: "y".into(),
            measurement: LatencyMeasurement::from_latencies(Some(5), Some(20), Some(90), 7.0, false),
        };
        assert_eq!(better.degradation_us(&baseline), Some(-5));
        assert_eq!(worse.degradation_us(&baseline), Some(70));
    }

    #[test]
    fn thermal_rise() {
        let thermal = ThermalReport {
            initial_c: Some(55.0),
            final_c: Some(61.5),
        };
        assert!((thermal.rise_c().unwrap() - 6.5).abs() < 1e-12);
        assert!(ThermalReport::default().rise_c().is_none());
    }
}

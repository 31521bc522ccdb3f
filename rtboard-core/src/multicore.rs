//! Multicore Comparator
//!
//! Measures how a workload scales across cores by pinning one logical
//! thread of control to each core in turn, never in parallel. One core is
//! permanently reserved for the latency probe and is excluded from the
//! pool as a hard partition, not a preference. Pinning failure degrades to
//! unpinned execution and the result says so.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::measure::{pin_to_core, Timer};
use crate::platform;
use crate::session::{with_session, SessionError};
use crate::workload::Workload;

/// Settle pause between the two comparison phases.
const PHASE_SETTLE: Duration = Duration::from_secs(1);

/// Measurement windows for the comparison phases.
#[derive(Debug, Clone, Copy)]
pub struct MulticoreWindows {
    /// Window for the pinned single-core baseline
    pub single_core: Duration,
    /// Window per core during the utilization sweep
    pub per_core: Duration,
}

impl Default for MulticoreWindows {
    fn default() -> Self {
        Self {
            single_core: Duration::from_secs(3),
            per_core: Duration::from_secs(2),
        }
    }
}

/// Scaling metrics from the single-core vs. multicore comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreComparison {
    /// Iterations achieved in the single-core window
    pub single_core_iterations: u64,
    /// Single-core iterations per second
    pub single_core_rate: f64,
    /// Iterations per tested core id
    pub per_core_iterations: BTreeMap<usize, u64>,
    /// Sum of iterations across tested cores
    pub multicore_total_iterations: u64,
    /// Aggregate multicore iterations per second
    pub multicore_rate: f64,
    /// Number of cores in the sweep (the reserved core is never one)
    pub cores_tested: usize,
    /// multicore_total / (single × cores × window correction)
    pub efficiency_ratio: f64,
    /// multicore_rate / single_core_rate
    pub actual_speedup: f64,
    /// Ideal speedup: the number of cores tested
    pub theoretical_speedup: f64,
    /// per-core window / single-core window, applied to the efficiency
    /// denominator because the sweep windows are shorter
    pub window_correction: f64,
    /// Whether every phase actually ran pinned; false means the numbers
    /// are uncorroborated by affinity
    pub pinned: bool,
    /// Single-core window length in seconds
    pub single_window_s: f64,
    /// Per-core window length in seconds
    pub per_core_window_s: f64,
}

/// Core allocation around the reserved latency core.
#[derive(Debug, Clone)]
pub struct MultiCoreManager {
    total_cores: usize,
    reserved_core: usize,
    available: Vec<usize>,
    windows: MulticoreWindows,
}

impl MultiCoreManager {
    /// Partition the machine's cores around `reserved_core`.
    pub fn detect(reserved_core: usize, windows: MulticoreWindows) -> Self {
        Self::with_topology(platform::core_count(), reserved_core, windows)
    }

    /// Partition an explicit topology (used by tests).
    pub fn with_topology(
        total_cores: usize,
        reserved_core: usize,
        windows: MulticoreWindows,
    ) -> Self {
        let available: Vec<usize> = (0..total_cores).filter(|&c| c != reserved_core).collect();
        info!(
            total_cores,
            reserved_core,
            available = ?available,
            "multicore configuration"
        );
        Self {
            total_cores,
            reserved_core,
            available,
            windows,
        }
    }

    /// Total logical cores.
    pub fn total_cores(&self) -> usize {
        self.total_cores
    }

    /// The core excluded from the pool.
    pub fn reserved_core(&self) -> usize {
        self.reserved_core
    }

    /// Cores the comparator may use.
    pub fn available_cores(&self) -> &[usize] {
        &self.available
    }

    /// Iterations of the workload completed inside `window`, optionally
    /// pinned. Returns the count and whether the pin actually held.
    fn run_window(&self, workload: &Workload, window: Duration, core: Option<usize>) -> (u64, bool) {
        let pinned = match core {
            Some(core) => match pin_to_core(core) {
                Ok(()) => true,
                Err(err) => {
                    warn!(core, error = %err, "core pinning unavailable; running unpinned");
                    false
                }
            },
            None => false,
        };

        let timer = Timer::start();
        let mut iterations = 0u64;
        while timer.elapsed() < window {
            let _ = std::hint::black_box((workload.runner)(workload.input.clone()));
            iterations += 1;
        }
        (iterations, pinned)
    }

    /// Pinned single-core baseline over the first available core.
    fn single_core_baseline(&self, workload: &Workload) -> (u64, bool) {
        let core = self.available.first().copied();
        debug!(?core, "single-core baseline");
        self.run_window(workload, self.windows.single_core, core)
    }

    /// Per-core utilization sweep: the workload pinned to each available
    /// core in turn. The reserved core is structurally absent from the
    /// iteration, so it can never acquire an entry.
    fn core_utilization(&self, workload: &Workload) -> (BTreeMap<usize, u64>, bool) {
        let mut results = BTreeMap::new();
        let mut all_pinned = true;
        for &core in &self.available {
            debug!(core, "utilization window");
            let (iterations, pinned) = self.run_window(workload, self.windows.per_core, Some(core));
            all_pinned &= pinned;
            results.insert(core, iterations);
        }
        (results, all_pinned)
    }

    /// Full comparison: isolated single-core baseline, settle pause,
    /// isolated utilization sweep, derived scaling metrics. The process is
    /// re-pinned to the reserved core afterwards so the environment
    /// controller's placement survives the sweep.
    pub fn compare(&self, workload: &Workload) -> Result<CoreComparison, SessionError> {
        let ((single_iterations, single_pinned), _report) =
            with_session("single_core_baseline", |_| {
                self.single_core_baseline(workload)
            })?;

        std::thread::sleep(PHASE_SETTLE);

        let ((per_core, sweep_pinned), _report) =
            with_session("multicore_utilization", |_| self.core_utilization(workload))?;

        if let Err(err) = pin_to_core(self.reserved_core) {
            debug!(error = %err, "could not re-pin to reserved core after sweep");
        }

        Ok(compose_comparison(
            single_iterations,
            single_pinned && sweep_pinned,
            per_core,
            self.windows,
        ))
    }
}

/// Pure assembly of the comparison metrics; split out so the arithmetic is
/// testable without burning real measurement windows.
fn compose_comparison(
    single_core_iterations: u64,
    pinned: bool,
    per_core_iterations: BTreeMap<usize, u64>,
    windows: MulticoreWindows,
) -> CoreComparison {
    let single_window_s = windows.single_core.as_secs_f64();
    let per_core_window_s = windows.per_core.as_secs_f64();
    let cores_tested = per_core_iterations.len();

    let multicore_total_iterations: u64 = per_core_iterations.values().sum();
    let single_core_rate = if single_window_s > 0.0 {
        single_core_iterations as f64 / single_window_s
    } else {
        0.0
    };
    let multicore_rate = if per_core_window_s > 0.0 {
        multicore_total_iterations as f64 / per_core_window_s
    } else {
        0.0
    };

    // The sweep's window is shorter than the baseline's, so the raw
    // iteration totals are not directly comparable; the denominator is
    // scaled by the window ratio.
    let window_correction = if single_window_s > 0.0 {
        per_core_window_s / single_window_s
    } else {
        0.0
    };

    let denominator = single_core_iterations as f64 * cores_tested as f64 * window_correction;
    let efficiency_ratio = if denominator > 0.0 {
        multicore_total_iterations as f64 / denominator
    } else {
        0.0
    };

    let actual_speedup = if single_core_rate > 0.0 {
        multicore_rate / single_core_rate
    } else {
        0.0
    };

    CoreComparison {
        single_core_iterations,
        single_core_rate,
        per_core_iterations,
        multicore_total_iterations,
        multicore_rate,
        cores_tested,
        efficiency_ratio,
        actual_speedup,
        theoretical_speedup: cores_tested as f64,
        window_correction,
        pinned,
        single_window_s,
        per_core_window_s,
    }
}

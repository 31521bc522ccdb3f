//! Algorithm Timing Harness
//!
//! Runs one workload N times under isolation and turns the collected
//! timings into statistics. Every batch runs inside a single isolated
//! session; every run gets a cache pre-warm, a reclamation point, a
//! thermal check and a fresh owned copy of the input. A run that panics is
//! recorded and the batch continues; a batch in which every run fails is
//! an explicit error, never fabricated statistics.

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

use rtboard_stats::{evaluate, AlgorithmStatistics};

use crate::measure::Timer;
use crate::platform;
use crate::session::{with_session, CleanupReport, SessionError};
use crate::thermal::{TemperatureSource, ThermalGovernor};
use crate::workload::Workload;

/// Harness failure modes.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Every run in the batch failed; there is nothing honest to report.
    #[error("all {runs} runs of '{workload}' failed")]
    AllRunsFailed {
        /// Workload identifier
        workload: String,
        /// How many runs were attempted
        runs: usize,
    },

    /// The isolated session could not be established.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Harness tuning.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Measured runs per workload
    pub runs: usize,
    /// Temperature the governor enforces before each run
    pub thermal_target_c: f64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            runs: 15,
            thermal_target_c: 62.0,
        }
    }
}

/// Raw data collected over one batch.
///
/// `times_s` and `op_counts` are parallel (one entry per successful run);
/// `temperatures_c` holds whatever readings the sensor produced and may be
/// shorter. Failed runs appear only in `failed_runs`; a partial run
/// contributes no partial timing.
#[derive(Debug, Clone, Default)]
pub struct TimingSample {
    /// Wall-clock duration of each successful run, in seconds
    pub times_s: Vec<f64>,
    /// Operations counted by each successful run
    pub op_counts: Vec<u64>,
    /// Temperature readings captured alongside the runs
    pub temperatures_c: Vec<f64>,
    /// Runs that panicked and were excluded
    pub failed_runs: usize,
}

/// Result of benchmarking one workload.
#[derive(Debug)]
pub struct WorkloadRun {
    /// Workload identifier
    pub id: &'static str,
    /// Workload display name
    pub name: &'static str,
    /// Raw collected data
    pub sample: TimingSample,
    /// Statistics derived from the sample
    pub statistics: AlgorithmStatistics,
    /// Session cleanup record for this batch
    pub cleanup: CleanupReport,
}

/// Repeated-execution timing harness.
pub struct TimingHarness<S: TemperatureSource> {
    config: HarnessConfig,
    governor: ThermalGovernor<S>,
}

impl<S: TemperatureSource> TimingHarness<S> {
    /// Harness with the given tuning and thermal governor.
    pub fn new(config: HarnessConfig, governor: ThermalGovernor<S>) -> Self {
        Self { config, governor }
    }

    /// Benchmark one workload: N isolated, thermally-gated runs.
    pub fn benchmark(&mut self, workload: &Workload) -> Result<WorkloadRun, HarnessError> {
        if self.config.runs == 0 {
            // Zero runs is a degenerate request, not a crash: empty sample,
            // uncertified statistics.
            return Ok(WorkloadRun {
                id: workload.id,
                name: workload.name,
                sample: TimingSample::default(),
                statistics: AlgorithmStatistics::empty(),
                cleanup: CleanupReport::default(),
            });
        }

        let runs = self.config.runs;
        let target = self.config.thermal_target_c;
        let governor = &mut self.governor;

        let (sample, cleanup) = with_session(workload.id, |_session| {
            let mut sample = TimingSample::default();

            // Pre-warm execution, untimed: pays one-time costs before the
            // measured loop.
            let _ = run_guarded(workload);

            for run in 0..runs {
                platform::warm_cpu_cache();
                platform::reclaim_memory(1);

                let cooldown = governor.ensure_below(target);
                if !cooldown.reached_target() {
                    debug!(workload = workload.id, run, "proceeding above thermal target");
                }

                let timer = Timer::start();
                match run_guarded(workload) {
                    Some(op_count) => {
                        sample.times_s.push(timer.elapsed_s());
                        sample.op_counts.push(op_count);
                    }
                    None => {
                        warn!(workload = workload.id, run, "run panicked; recorded as failed");
                        sample.failed_runs += 1;
                    }
                }

                if let Some(temp) = governor.temperature() {
                    sample.temperatures_c.push(temp);
                }

                if (run + 1) % 5 == 0 && !sample.times_s.is_empty() {
                    let tail = &sample.times_s[sample.times_s.len().saturating_sub(5)..];
                    let recent = tail.iter().sum::<f64>() / tail.len() as f64;
                    debug!(
                        workload = workload.id,
                        progress = %format!("{}/{}", run + 1, runs),
                        recent_mean_s = recent,
                        "harness progress"
                    );
                }
            }

            sample
        })?;

        if sample.times_s.is_empty() {
            return Err(HarnessError::AllRunsFailed {
                workload: workload.id.to_string(),
                runs,
            });
        }

        let statistics = evaluate(&sample.times_s, &sample.op_counts, &sample.temperatures_c);

        Ok(WorkloadRun {
            id: workload.id,
            name: workload.name,
            sample,
            statistics,
            cleanup,
        })
    }
}

/// Execute one run with the panic boundary the failure policy requires.
/// The input is cloned here, so a run can never observe a predecessor's
/// mutations.
fn run_guarded(workload: &Workload) -> Option<u64> {
    let input = workload.input.clone();
    let runner = workload.runner;
    catch_unwind(AssertUnwindSafe(move || runner(input))).ok()
}

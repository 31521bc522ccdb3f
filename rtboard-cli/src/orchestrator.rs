//! Phase Orchestration
//!
//! Drives a full board run: capability detection, environment setup, the
//! scaling comparison, the baseline latency probe, the algorithm
//! benchmarks, the latency-under-load pass and finally report assembly
//! with guaranteed environment teardown. Degraded phases produce warnings
//! and keep going; only the total absence of any measurement is an error.

use std::path::PathBuf;

use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tracing::{info, warn};

use rtboard_core::{
    standard_workloads, Capabilities, HarnessConfig, HarnessError, MultiCoreManager,
    MulticoreWindows, RtEnvironment, SystemSensor, ThermalConfig, ThermalGovernor, TimingHarness,
    Workload,
};
use rtboard_latency::{LatencyProbe, ProbeOutcome, DEFAULT_PROBE_COMMAND};
use rtboard_report::{
    composite_score, AlgorithmReport, CertificationSummary, LoadLatency, ReportMeta, RunReport,
    ThermalReport,
};

/// Priority requested from the latency probe's strongest variant.
const PROBE_PRIORITY: u32 = 99;

/// Everything a board run can be told.
#[derive(Debug, Clone)]
pub struct BoardOptions {
    /// Baseline probe duration in seconds
    pub probe_duration_s: u64,
    /// Measured runs per workload
    pub runs: usize,
    /// Core reserved for the latency probe
    pub reserved_core: usize,
    /// Temperature the governor enforces before runs
    pub thermal_target_c: f64,
    /// Skip the single-core vs. multicore phase
    pub skip_multicore: bool,
    /// Skip the latency-under-load pass
    pub skip_load: bool,
    /// Fail instead of simulating when the probe cannot run
    pub no_fallback: bool,
    /// Regex over workload ids; non-matching workloads are skipped
    pub filter: Option<String>,
    /// Override the probe binary (tests use a missing one)
    pub probe_command: Option<String>,
    /// Windows for the scaling comparison
    pub multicore_windows: MulticoreWindows,
    /// Directory for the timestamped JSON snapshot (`None` disables it)
    pub export_dir: Option<PathBuf>,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            probe_duration_s: 15,
            runs: 15,
            reserved_core: 3,
            thermal_target_c: 62.0,
            skip_multicore: false,
            skip_load: false,
            no_fallback: false,
            filter: None,
            probe_command: None,
            multicore_windows: MulticoreWindows::default(),
            export_dir: Some(PathBuf::from(".")),
        }
    }
}

impl BoardOptions {
    fn probe(&self) -> LatencyProbe {
        let probe = match &self.probe_command {
            Some(command) => LatencyProbe::with_command(command),
            None => LatencyProbe::new(),
        };
        if self.no_fallback {
            probe.without_fallback()
        } else {
            probe
        }
    }

    fn probe_command_name(&self) -> &str {
        self.probe_command.as_deref().unwrap_or(DEFAULT_PROBE_COMMAND)
    }
}

/// Select workloads matching the filter.
pub fn filtered_workloads(filter: Option<&str>) -> anyhow::Result<Vec<Workload>> {
    let workloads = standard_workloads();
    let Some(pattern) = filter else {
        return Ok(workloads);
    };
    let re = Regex::new(pattern).with_context(|| format!("invalid filter regex '{pattern}'"))?;
    Ok(workloads
        .into_iter()
        .filter(|w| re.is_match(w.id) || re.is_match(w.name))
        .collect())
}

/// Execute a complete board run and assemble the report.
pub fn run_board(options: &BoardOptions) -> anyhow::Result<RunReport> {
    let capabilities = Capabilities::detect(options.probe_command_name());
    info!(?capabilities, "capability probe");

    let mut environment = RtEnvironment::new(options.reserved_core);
    let environment_state = environment.setup();

    // The run must revert the environment on every path from here on.
    let result = run_phases(options, capabilities, environment_state);
    environment.teardown();
    result
}

fn run_phases(
    options: &BoardOptions,
    capabilities: Capabilities,
    environment_state: rtboard_core::EnvironmentState,
) -> anyhow::Result<RunReport> {
    let mut governor = ThermalGovernor::with_source(SystemSensor, ThermalConfig::default());
    let initial_c = governor.temperature();

    let workloads = filtered_workloads(options.filter.as_deref())?;
    if workloads.is_empty() {
        warn!("workload filter matched nothing");
    }

    // Phase 0: scaling comparison, before anything heats the package up.
    let core_comparison = if options.skip_multicore || workloads.is_empty() {
        None
    } else {
        let manager = MultiCoreManager::detect(options.reserved_core, options.multicore_windows);
        match manager.compare(&workloads[0]) {
            Ok(comparison) => Some(comparison),
            Err(err) => {
                warn!(error = %err, "scaling comparison skipped");
                None
            }
        }
    };

    // The sweep warms the package; settle before the latency phase.
    governor.ensure_below(options.thermal_target_c);

    // Phase 1: baseline scheduling latency.
    let probe = options.probe();
    let latency_baseline = match probe.run(options.probe_duration_s, PROBE_PRIORITY) {
        ProbeOutcome::Real(m) | ProbeOutcome::Simulated(m) => Some(m),
        ProbeOutcome::Failed(err) => {
            warn!(error = %err, "no latency measurement");
            None
        }
    };

    // Phase 2: algorithm benchmarks.
    let algorithms = benchmark_workloads(options, &workloads)?;

    // Phase 3: latency under computational load.
    let latency_under_load = if options.skip_load || latency_baseline.is_none() {
        Vec::new()
    } else {
        let load_duration = (options.probe_duration_s / 2).max(1);
        algorithms
            .iter()
            .filter_map(|algorithm| {
                match probe.run(load_duration, PROBE_PRIORITY) {
                    ProbeOutcome::Real(m) | ProbeOutcome::Simulated(m) => Some(LoadLatency {
                        workload_id: algorithm.id.clone(),
                        measurement: m,
                    }),
                    ProbeOutcome::Failed(err) => {
                        warn!(workload = %algorithm.id, error = %err, "load latency pass failed");
                        None
                    }
                }
            })
            .collect()
    };

    if latency_baseline.is_none() && algorithms.is_empty() {
        bail!("no measurement could be produced: latency probe failed and no workload completed");
    }

    let final_c = governor.temperature();

    let certification = CertificationSummary::evaluate(&algorithms, latency_baseline.as_ref());
    let score = composite_score(&certification, latency_baseline.as_ref());

    Ok(RunReport {
        meta: ReportMeta::collect(),
        capabilities,
        environment: environment_state,
        latency_baseline,
        latency_under_load,
        algorithms,
        core_comparison,
        thermal: ThermalReport { initial_c, final_c },
        certification,
        composite_score: score,
    })
}

fn benchmark_workloads(
    options: &BoardOptions,
    workloads: &[Workload],
) -> anyhow::Result<Vec<AlgorithmReport>> {
    let governor = ThermalGovernor::with_source(SystemSensor, ThermalConfig::default());
    let mut harness = TimingHarness::new(
        HarnessConfig {
            runs: options.runs,
            thermal_target_c: options.thermal_target_c,
        },
        governor,
    );

    let progress = ProgressBar::new(workloads.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut reports = Vec::with_capacity(workloads.len());
    for workload in workloads {
        progress.set_message(workload.id.to_string());
        match harness.benchmark(workload) {
            Ok(run) => {
                if !run.cleanup.is_success() {
                    warn!(workload = run.id, "session cleanup reported failures");
                }
                reports.push(AlgorithmReport {
                    id: run.id.to_string(),
                    name: run.name.to_string(),
                    statistics: run.statistics,
                    failed_runs: run.sample.failed_runs,
                });
            }
            Err(HarnessError::AllRunsFailed { workload, runs }) => {
                warn!(%workload, runs, "workload excluded: every run failed");
            }
            // A session that cannot even be created is fatal for the run.
            Err(HarnessError::Session(err)) => {
                progress.abandon();
                return Err(err).context("isolated session could not be established");
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("benchmarks complete");

    Ok(reports)
}

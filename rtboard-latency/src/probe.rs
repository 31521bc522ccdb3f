//! Latency Probe Adapter
//!
//! Drives the external cyclic latency probe with up to three
//! decreasing-capability command variants: full real-time priority, a
//! reduced priority that works without RT privileges, and a minimal
//! invocation with a shorter loop count. Each attempt is bounded by its
//! own timeout; any failure moves on to the next variant, and exhausting
//! them falls back to simulation unless the caller disabled the fallback.

use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use rtboard_core::{run_with_timeout, ProcessError};

use crate::parse::{parse_summary, ParseError};
use crate::simulate::simulated_measurement;
use crate::types::LatencyMeasurement;

/// The binary the adapter runs by default.
pub const DEFAULT_PROBE_COMMAND: &str = "cyclictest";

/// Probe interval in microseconds passed to every variant.
const PROBE_INTERVAL_US: u64 = 100;

/// Extra wall-clock budget on top of the nominal probe duration.
const TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Why a real probe run could not produce a measurement.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe binary is missing or this platform cannot run it.
    #[error("latency probe unavailable: {0}")]
    Unavailable(String),

    /// Every command variant failed (timeout, bad exit, unparsable output).
    #[error("all probe command variants failed; last error: {last_error}")]
    AllVariantsFailed {
        /// Error from the final attempted variant
        last_error: String,
    },
}

/// Result of a probe invocation. Callers must handle all three cases;
/// a simulated measurement is never disguised as a real one.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// A real probe run parsed successfully.
    Real(LatencyMeasurement),
    /// The fallback simulation was used.
    Simulated(LatencyMeasurement),
    /// The probe failed and the fallback was disabled.
    Failed(ProbeError),
}

impl ProbeOutcome {
    /// The measurement, when one exists.
    pub fn measurement(&self) -> Option<&LatencyMeasurement> {
        match self {
            ProbeOutcome::Real(m) | ProbeOutcome::Simulated(m) => Some(m),
            ProbeOutcome::Failed(_) => None,
        }
    }
}

/// Adapter around the external probe binary.
#[derive(Debug, Clone)]
pub struct LatencyProbe {
    command: String,
    fallback: bool,
}

impl Default for LatencyProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyProbe {
    /// Adapter for the default probe binary with simulation fallback.
    pub fn new() -> Self {
        Self {
            command: DEFAULT_PROBE_COMMAND.to_string(),
            fallback: true,
        }
    }

    /// Use a different probe binary (mainly for tests).
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            fallback: true,
        }
    }

    /// Disable the simulation fallback: failures become
    /// [`ProbeOutcome::Failed`].
    pub fn without_fallback(mut self) -> Self {
        self.fallback = false;
        self
    }

    /// Whether the probe binary answers `--help`.
    pub fn available(&self) -> bool {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--help");
        matches!(
            run_with_timeout(&mut cmd, Duration::from_secs(5)),
            Ok(output) if output.status.success()
        )
    }

    /// Run the probe for `duration_s` seconds at the given priority.
    ///
    /// Spawns no threads and mutates no shared state; the only side
    /// effect is the child process itself.
    pub fn run(&self, duration_s: u64, priority: u32) -> ProbeOutcome {
        if !cfg!(target_os = "linux") {
            return self.fall_back(duration_s, "probe only runs on Linux");
        }
        if !self.available() {
            return self.fall_back(duration_s, "probe binary not found");
        }

        let timeout = Duration::from_secs(duration_s) + TIMEOUT_SLACK;
        let mut last_error = String::from("no variant attempted");

        for (attempt, argv) in self.command_variants(duration_s, priority).iter().enumerate() {
            debug!(attempt, ?argv, "probe attempt");
            let mut cmd = Command::new(&self.command);
            cmd.args(argv);

            match run_with_timeout(&mut cmd, timeout) {
                Ok(output) if output.status.success() => {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.trim().is_empty() {
                        last_error = "probe produced no output".to_string();
                        continue;
                    }
                    match parse_summary(&stdout) {
                        Ok(summary) => {
                            let measurement = LatencyMeasurement::from_latencies(
                                summary.min_us,
                                summary.avg_us,
                                Some(summary.max_us),
                                duration_s as f64,
                                false,
                            );
                            info!(
                                max_us = summary.max_us,
                                class = measurement.classification.label(),
                                "latency probe complete"
                            );
                            return ProbeOutcome::Real(measurement);
                        }
                        Err(err) => {
                            last_error = describe_parse_failure(&err);
                            warn!(attempt, error = %err, "probe output unparsable");
                        }
                    }
                }
                Ok(output) => {
                    last_error = format!("probe exited with {}", output.status);
                    debug!(attempt, status = %output.status, "probe attempt failed");
                }
                Err(ProcessError::Timeout { timeout }) => {
                    last_error = format!("probe timed out after {:.0}s", timeout.as_secs_f64());
                    debug!(attempt, "probe attempt timed out");
                }
                Err(ProcessError::Io(err)) => {
                    last_error = format!("probe spawn failed: {err}");
                    debug!(attempt, error = %err, "probe spawn failed");
                }
            }
        }

        if self.fallback {
            warn!(%last_error, "all probe variants failed; using simulation");
            ProbeOutcome::Simulated(simulated_measurement(duration_s as f64))
        } else {
            ProbeOutcome::Failed(ProbeError::AllVariantsFailed { last_error })
        }
    }

    /// The decreasing-capability argument sets, strongest first.
    fn command_variants(&self, duration_s: u64, priority: u32) -> [Vec<String>; 3] {
        let loops = duration_s * 1000;
        let interval = PROBE_INTERVAL_US.to_string();
        [
            // Full real-time priority
            vec![
                "-t".into(),
                "1".into(),
                "-p".into(),
                priority.to_string(),
                "-i".into(),
                interval.clone(),
                "-q".into(),
                "-l".into(),
                loops.to_string(),
            ],
            // Reduced priority, works without full RT privileges
            vec![
                "-t".into(),
                "1".into(),
                "-p".into(),
                "50".into(),
                "-i".into(),
                interval.clone(),
                "-q".into(),
                "-l".into(),
                loops.to_string(),
            ],
            // Minimal: no priority request, half the loop count
            vec![
                "-t".into(),
                "1".into(),
                "-i".into(),
                interval,
                "-q".into(),
                "-l".into(),
                (duration_s * 500).to_string(),
            ],
        ]
    }

    fn fall_back(&self, duration_s: u64, reason: &str) -> ProbeOutcome {
        if self.fallback {
            info!(reason, "latency probe unavailable; using simulation");
            ProbeOutcome::Simulated(simulated_measurement(duration_s as f64))
        } else {
            ProbeOutcome::Failed(ProbeError::Unavailable(reason.to_string()))
        }
    }
}

fn describe_parse_failure(err: &ParseError) -> String {
    format!("{} (raw: {:?})", err.message, err.raw_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatencyClass;

    fn missing_probe() -> LatencyProbe {
        LatencyProbe::with_command("rtboard-test-no-such-probe-binary")
    }

    #[test]
    fn missing_binary_simulates_and_flags_it() {
        let outcome = missing_probe().run(15, 99);
        match outcome {
            ProbeOutcome::Simulated(m) => {
                assert!(m.simulated);
                assert!((m.duration_s - 15.0).abs() < f64::EPSILON);
                let max = m.max_us.unwrap();
                assert!((8..=21).contains(&max));
                assert!(matches!(
                    m.classification,
                    LatencyClass::SoftRealTime | LatencyClass::NearRealTime
                ));
            }
            other => panic!("expected simulation, got {other:?}"),
        }
    }

    #[test]
    fn missing_binary_without_fallback_fails() {
        let outcome = missing_probe().without_fallback().run(5, 99);
        match outcome {
            ProbeOutcome::Failed(ProbeError::Unavailable(reason)) => {
                assert!(reason.contains("not found") || reason.contains("Linux"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn outcome_measurement_accessor() {
        let outcome = missing_probe().run(5, 99);
        assert!(outcome.measurement().is_some());
        let failed = ProbeOutcome::Failed(ProbeError::Unavailable("x".into()));
        assert!(failed.measurement().is_none());
    }

    #[test]
    fn variants_degrade_in_capability() {
        let probe = LatencyProbe::new();
        let variants = probe.command_variants(15, 99);
        assert!(variants[0].contains(&"99".to_string()));
        assert!(variants[1].contains(&"50".to_string()));
        assert!(!variants[2].contains(&"-p".to_string()));
        // Minimal variant halves the loop count.
        assert!(variants[2].contains(&"7500".to_string()));
        assert!(variants[0].contains(&"15000".to_string()));
    }

    #[test]
    fn probe_availability_is_false_for_missing_binary() {
        assert!(!missing_probe().available());
    }
}

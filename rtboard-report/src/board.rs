//! ASCII Board Rendering
//!
//! Pure formatting of a [`RunReport`] into the terminal board: system and
//! environment status, scaling analysis, per-workload performance, the
//! latency analysis and the certification verdict. The renderer only
//! builds the string; printing is the caller's business.

use crate::certification::OverallTier;
use crate::model::{AlgorithmReport, RunReport};

const WIDTH: usize = 78;

fn rule(out: &mut String, ch: char) {
    out.push_str(&ch.to_string().repeat(WIDTH));
    out.push('\n');
}

fn title(out: &mut String, text: &str) {
    rule(out, '=');
    out.push_str(&format!("{:^WIDTH$}\n", text));
    rule(out, '=');
}

fn section(out: &mut String, text: &str) {
    out.push_str(&format!("\n{text}\n"));
    out.push_str(&"-".repeat(WIDTH));
    out.push('\n');
}

fn field(out: &mut String, label: &str, value: impl AsRef<str>) {
    out.push_str(&format!("  {:<28} {}\n", label, value.as_ref()));
}

fn on_off(value: bool, on: &str, off: &str) -> String {
    if value { on.to_string() } else { off.to_string() }
}

fn format_us(value: Option<u64>) -> String {
    match value {
        Some(v) => format!("{v} us"),
        None => "n/a".to_string(),
    }
}

fn format_temp(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1} C"),
        None => "n/a".to_string(),
    }
}

/// Render the complete results board.
pub fn render_board(report: &RunReport) -> String {
    let mut out = String::new();

    title(&mut out, "RTBOARD - REAL-TIME READINESS BOARD");
    out.push_str(&format!(
        "{:^WIDTH$}\n",
        format!("generated {}", report.meta.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))
    ));

    render_system(&mut out, report);
    render_scaling(&mut out, report);
    render_algorithms(&mut out, report);
    render_latency(&mut out, report);
    render_thermal(&mut out, report);
    render_certification(&mut out, report);

    rule(&mut out, '=');
    out
}

fn render_system(out: &mut String, report: &RunReport) {
    section(out, "SYSTEM CONFIGURATION");
    let system = &report.meta.system;
    field(out, "OS", format!("{} ({})", system.os, system.arch));
    if let Some(kernel) = &system.kernel {
        field(out, "Kernel", kernel);
    }
    if let Some(cpu) = &system.cpu {
        field(out, "CPU", cpu);
    }
    field(out, "CPU cores", system.cpu_cores.to_string());
    if let Some(memory) = system.memory_gb {
        field(out, "Memory", format!("{memory:.1} GB"));
    }

    let caps = &report.capabilities;
    field(
        out,
        "RT scheduling",
        on_off(caps.rt_scheduling, "available", "not available"),
    );
    field(out, "Root privileges", on_off(caps.root, "yes", "no"));
    field(
        out,
        "Latency probe",
        on_off(caps.probe_binary, "installed", "not installed (simulated)"),
    );
    field(
        out,
        "Temperature sensor",
        on_off(caps.temperature, "available", "not available"),
    );

    let env = &report.environment;
    field(
        out,
        "Memory locking",
        on_off(env.memory_locked, "LOCKED", "unlocked"),
    );
    field(
        out,
        "RT priority",
        on_off(env.rt_priority_set, "ACTIVE", "inactive"),
    );
    field(
        out,
        "Heap trim",
        on_off(env.heap_trim_disabled, "SUSPENDED", "default"),
    );
    field(
        out,
        "CPU affinity",
        on_off(env.cpu_affinity_set, "PINNED", "unpinned"),
    );
}

fn render_scaling(out: &mut String, report: &RunReport) {
    let Some(cmp) = &report.core_comparison else {
        return;
    };
    section(out, "SINGLE-CORE vs MULTI-CORE SCALING");

    field(
        out,
        "Single-core rate",
        format!(
            "{:.1} iter/s ({} iterations / {:.1}s)",
            cmp.single_core_rate, cmp.single_core_iterations, cmp.single_window_s
        ),
    );
    field(
        out,
        "Multi-core rate",
        format!(
            "{:.1} iter/s ({} iterations / {:.1}s per core)",
            cmp.multicore_rate, cmp.multicore_total_iterations, cmp.per_core_window_s
        ),
    );
    field(out, "Cores tested", cmp.cores_tested.to_string());
    field(
        out,
        "Actual speedup",
        format!("{:.2}x of {:.1}x theoretical", cmp.actual_speedup, cmp.theoretical_speedup),
    );
    field(out, "Efficiency ratio", format!("{:.3}", cmp.efficiency_ratio));
    if !cmp.pinned {
        field(out, "Affinity", "UNPINNED - scaling figures uncorroborated");
    }

    let max_iterations = cmp.per_core_iterations.values().copied().max().unwrap_or(0);
    for (core, iterations) in &cmp.per_core_iterations {
        let bar_len = if max_iterations > 0 {
            (20 * iterations / max_iterations) as usize
        } else {
            0
        };
        let bar = format!("{}{}", "#".repeat(bar_len), ".".repeat(20 - bar_len));
        field(out, &format!("Core {core}"), format!("[{bar}] {iterations} iter"));
    }
}

fn render_algorithms(out: &mut String, report: &RunReport) {
    section(out, "ALGORITHM PERFORMANCE");
    if report.algorithms.is_empty() {
        field(out, "Status", "no workload results");
        return;
    }

    for algorithm in &report.algorithms {
        render_one_algorithm(out, algorithm);
    }

    // Leaderboard: most predictable first.
    let mut ranked: Vec<&AlgorithmReport> = report.algorithms.iter().collect();
    ranked.sort_by(|a, b| {
        a.statistics
            .timing
            .cv_percent
            .partial_cmp(&b.statistics.timing.cv_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.push('\n');
    field(out, "Predictability ranking", "");
    for (rank, algorithm) in ranked.iter().enumerate() {
        field(
            out,
            &format!("  {}.", rank + 1),
            format!(
                "{:<24} CoV {:>8.3}%  {}",
                algorithm.name,
                algorithm.statistics.timing.cv_percent,
                algorithm.statistics.rating.stars()
            ),
        );
    }
}

fn render_one_algorithm(out: &mut String, algorithm: &AlgorithmReport) {
    let stats = &algorithm.statistics;
    out.push_str(&format!("\n  [{}]\n", algorithm.name.to_uppercase()));
    field(
        out,
        "Execution time",
        format!(
            "{:.3} ms +/- {:.3} ms",
            stats.timing.mean * 1000.0,
            stats.timing.std_dev * 1000.0
        ),
    );
    field(
        out,
        "Coefficient of variation",
        format!("{:.3}%", stats.timing.cv_percent),
    );
    field(out, "Jitter", format!("{:.3} ms", stats.timing.jitter * 1000.0));
    field(
        out,
        "Throughput",
        format!("{:.0} ops/s", stats.operations_per_second),
    );
    field(out, "Samples", stats.timing.sample_count.to_string());
    if algorithm.failed_runs > 0 {
        field(out, "Failed runs", algorithm.failed_runs.to_string());
    }
    field(
        out,
        "Rating",
        format!("{} {}", stats.rating.stars(), stats.rating.label()),
    );
    field(
        out,
        "Certification",
        on_off(stats.certified, "CERTIFIED", "not certified"),
    );
    if let Some(temp) = stats.avg_temperature_c {
        field(out, "Avg temperature", format!("{temp:.1} C"));
    }
}

fn render_latency(out: &mut String, report: &RunReport) {
    section(out, "SCHEDULING LATENCY");
    let Some(baseline) = &report.latency_baseline else {
        field(out, "Status", "no latency data (probe failed, fallback disabled)");
        return;
    };

    field(out, "Minimum latency", format_us(baseline.min_us));
    field(out, "Average latency", format_us(baseline.avg_us));
    field(out, "Maximum latency", format_us(baseline.max_us));
    field(out, "Jitter (max-min)", format_us(baseline.jitter_us));
    field(out, "Duration", format!("{:.1} s", baseline.duration_s));
    field(
        out,
        "Classification",
        format!("{} {}", baseline.classification.stars(), baseline.classification.label()),
    );
    if baseline.simulated {
        field(out, "Source", "SIMULATED (probe unavailable)");
    }

    if !report.latency_under_load.is_empty() {
        out.push('\n');
        field(out, "Latency under load", "");
        for load in &report.latency_under_load {
            let degradation = load
                .degradation_us(baseline)
                .map(|d| format!("{d:+} us"))
                .unwrap_or_else(|| "n/a".to_string());
            field(
                out,
                &format!("  {}", load.workload_id),
                format!(
                    "max {}  degradation {}",
                    format_us(load.measurement.max_us),
                    degradation
                ),
            );
        }
    }
}

fn render_thermal(out: &mut String, report: &RunReport) {
    section(out, "THERMAL");
    field(out, "Initial temperature", format_temp(report.thermal.initial_c));
    field(out, "Final temperature", format_temp(report.thermal.final_c));
    match report.thermal.rise_c() {
        Some(rise) => field(out, "Temperature rise", format!("{rise:+.1} C")),
        None => field(out, "Temperature rise", "n/a (no sensor)"),
    }
}

fn render_certification(out: &mut String, report: &RunReport) {
    section(out, "CERTIFICATION");
    let cert = &report.certification;
    for algorithm in &report.algorithms {
        field(
            out,
            &algorithm.name,
            format!(
                "{}  CoV {:.3}%",
                on_off(algorithm.statistics.certified, "[PASS]", "[FAIL]"),
                algorithm.statistics.timing.cv_percent
            ),
        );
    }
    field(
        out,
        "Certification rate",
        format!(
            "{:.1}% ({}/{})",
            cert.cert_rate_percent, cert.certified_workloads, cert.total_workloads
        ),
    );
    field(out, "Composite score", format!("{:.1} / 100", report.composite_score));

    let marker = match cert.overall {
        OverallTier::Certified => "+++",
        OverallTier::SoftSuitable => "~~~",
        OverallTier::NotSuitable => "---",
    };
    out.push('\n');
    out.push_str(&format!("  {marker} {}\n", cert.overall.label()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certification::{composite_score, CertificationSummary};
    use crate::model::{AlgorithmReport, LoadLatency, ReportMeta, ThermalReport};
    use rtboard_core::{Capabilities, EnvironmentState};
    use rtboard_latency::LatencyMeasurement;
    use rtboard_stats::evaluate;

    fn report_with(latency: Option<LatencyMeasurement>) -> RunReport {
        let algorithms = vec![AlgorithmReport {
            id: "bubble_sort".into(),
            name: "Bubble Sort".into(),
            statistics: evaluate(&[0.002; 5], &[2450; 5], &[60.0]),
            failed_runs: 1,
        }];
        let certification = CertificationSummary::evaluate(&algorithms, latency.as_ref());
        let composite = composite_score(&certification, latency.as_ref());
        RunReport {
            meta: ReportMeta::collect(),
            capabilities: Capabilities::detect("rtboard-test-no-such-probe"),
            environment: EnvironmentState::default(),
            latency_under_load: latency
                .iter()
                .map(|_| LoadLatency {
                    workload_id: "bubble_sort".into(),
                    measurement: LatencyMeasurement::from_latencies(
                        Some(7),
                        Some(14),
                        Some(60),
                        7.0,
                        false,
                    ),
                })
                .collect(),
            latency_baseline: latency,
            algorithms,
            core_comparison: None,
            thermal: ThermalReport::default(),
            certification,
            composite_score: composite,
        }
    }

    #[test]
    fn board_contains_all_sections() {
        let baseline =
            LatencyMeasurement::from_latencies(Some(5), Some(10), Some(30), 15.0, false);
        let board = render_board(&report_with(Some(baseline)));

        for heading in [
            "SYSTEM CONFIGURATION",
            "ALGORITHM PERFORMANCE",
            "SCHEDULING LATENCY",
            "THERMAL",
            "CERTIFICATION",
        ] {
            assert!(board.contains(heading), "missing section {heading}");
        }
        assert!(board.contains("BUBBLE SORT"));
        assert!(board.contains("degradation +30 us"));
        assert!(board.contains("Failed runs"));
    }

    #[test]
    fn simulated_latency_is_marked_on_the_board() {
        let simulated =
            LatencyMeasurement::from_latencies(Some(8), Some(11), Some(14), 15.0, true);
        let board = render_board(&report_with(Some(simulated)));
        assert!(board.contains("SIMULATED"));
    }

    #[test]
    fn missing_latency_renders_a_notice() {
        let board = render_board(&report_with(None));
        assert!(board.contains("no latency data"));
    }
}

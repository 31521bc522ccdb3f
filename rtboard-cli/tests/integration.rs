//! End-to-end board runs against a missing probe binary, so every test is
//! fast and deterministic: the latency section always comes from the
//! simulation fallback. Board runs open isolated sessions, which are
//! process-global, so the tests serialize on one lock.

use std::sync::Mutex;
use std::time::Duration;

use rtboard_cli::{filtered_workloads, run_board, BoardOptions};
use rtboard_core::MulticoreWindows;
use rtboard_latency::LatencyClass;
use rtboard_report::{load_report, render_board, save_report, OverallTier};

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> std::sync::MutexGuard<'static, ()> {
    PROCESS_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Options tuned for test speed: tiny windows, two runs, no real probe,
/// a thermal target no machine exceeds.
fn fast_options() -> BoardOptions {
    BoardOptions {
        probe_duration_s: 15,
        runs: 2,
        reserved_core: 1,
        thermal_target_c: 1000.0,
        skip_multicore: true,
        skip_load: true,
        no_fallback: false,
        filter: Some("bubble".to_string()),
        probe_command: Some("rtboard-test-no-such-probe".to_string()),
        multicore_windows: MulticoreWindows {
            single_core: Duration::from_millis(30),
            per_core: Duration::from_millis(20),
        },
        export_dir: None,
    }
}

#[test]
fn board_run_with_missing_probe_simulates_latency() {
    let _guard = lock();

    let report = run_board(&fast_options()).expect("board run");

    let baseline = report.latency_baseline.expect("fallback produced a measurement");
    assert!(baseline.simulated, "missing probe must be flagged as simulated");
    assert!((baseline.duration_s - 15.0).abs() < f64::EPSILON);

    let max = baseline.max_us.expect("simulation always has a max");
    assert!((8..=21).contains(&max), "max {max} outside documented bounds");
    assert!(matches!(
        baseline.classification,
        LatencyClass::SoftRealTime | LatencyClass::NearRealTime
    ));

    assert!(!report.capabilities.probe_binary);
    assert_eq!(report.algorithms.len(), 1);
    assert_eq!(report.algorithms[0].id, "bubble_sort");
    assert_eq!(report.algorithms[0].statistics.timing.sample_count, 2);
}

#[test]
fn board_run_renders_and_round_trips() {
    let _guard = lock();

    let report = run_board(&fast_options()).expect("board run");

    let board = render_board(&report);
    assert!(board.contains("REAL-TIME READINESS BOARD"));
    assert!(board.contains("BUBBLE SORT"));
    assert!(board.contains("SIMULATED"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = save_report(&report, dir.path()).expect("save snapshot");
    let loaded = load_report(&path).expect("load snapshot");

    assert_eq!(
        report.algorithms[0].statistics.timing.mean,
        loaded.algorithms[0].statistics.timing.mean
    );
    assert_eq!(
        report.algorithms[0].statistics.timing.cv_percent,
        loaded.algorithms[0].statistics.timing.cv_percent
    );
    assert_eq!(
        report.algorithms[0].statistics.rating,
        loaded.algorithms[0].statistics.rating
    );
    assert_eq!(report.certification.overall, loaded.certification.overall);
}

#[test]
fn multicore_phase_respects_the_reserved_core() {
    let _guard = lock();

    let options = BoardOptions {
        skip_multicore: false,
        ..fast_options()
    };
    let report = run_board(&options).expect("board run");

    let comparison = report.core_comparison.expect("comparison ran");
    assert!(
        !comparison.per_core_iterations.contains_key(&options.reserved_core),
        "reserved core must never receive comparator work"
    );
    assert_eq!(
        comparison.theoretical_speedup,
        comparison.cores_tested as f64
    );
}

#[test]
fn load_pass_records_one_entry_per_workload() {
    let _guard = lock();

    let options = BoardOptions {
        skip_load: false,
        ..fast_options()
    };
    let report = run_board(&options).expect("board run");

    assert_eq!(report.latency_under_load.len(), report.algorithms.len());
    for load in &report.latency_under_load {
        assert!(load.measurement.simulated);
        // Load passes run at half the baseline duration.
        assert!((load.measurement.duration_s - 7.0).abs() < f64::EPSILON);
    }
}

#[test]
fn no_fallback_without_any_workload_is_fatal() {
    let _guard = lock();

    let options = BoardOptions {
        no_fallback: true,
        filter: Some("no-workload-matches-this".to_string()),
        ..fast_options()
    };
    let err = run_board(&options).expect_err("nothing measurable must fail");
    assert!(err.to_string().contains("no measurement"));
}

#[test]
fn no_fallback_with_workloads_still_produces_a_board() {
    let _guard = lock();

    let options = BoardOptions {
        no_fallback: true,
        ..fast_options()
    };
    let report = run_board(&options).expect("workloads alone are a valid run");

    assert!(report.latency_baseline.is_none());
    assert_eq!(report.algorithms.len(), 1);
    // Without a baseline the system cannot be fully certified.
    assert_ne!(report.certification.overall, OverallTier::Certified);

    let board = render_board(&report);
    assert!(board.contains("no latency data"));
}

#[test]
fn workload_filter_is_shared_between_cli_and_orchestrator() {
    let all = filtered_workloads(None).expect("no filter");
    assert_eq!(all.len(), 3);
    let filtered = filtered_workloads(Some("binary|matrix")).expect("filter");
    assert_eq!(filtered.len(), 2);
}

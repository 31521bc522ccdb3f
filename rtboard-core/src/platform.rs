//! Platform Queries
//!
//! Read-only probes of the host: real-time capability detection,
//! temperature, memory statistics, cache control. Everything here degrades
//! to "no data" or `false` rather than erroring, since the absence of a
//! feature is an expected condition on most machines the board runs on.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::process::run_with_timeout;

/// Thermal zones probed for a CPU temperature, in order.
#[cfg(target_os = "linux")]
const THERMAL_ZONES: [&str; 3] = [
    "/sys/class/thermal/thermal_zone0/temp",
    "/sys/class/thermal/thermal_zone1/temp",
    "/sys/class/thermal/thermal_zone2/temp",
];

/// OS-level real-time features available to this process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    /// SCHED_FIFO scheduling is available on this platform
    pub rt_scheduling: bool,
    /// Running with root privileges
    pub root: bool,
    /// A CPU temperature sensor is readable
    pub temperature: bool,
    /// The external latency probe binary is runnable
    pub probe_binary: bool,
    /// Page-cache dropping is possible (Linux + root)
    pub cache_drop: bool,
    /// Logical core count
    pub core_count: usize,
}

impl Capabilities {
    /// Detect capabilities. `probe_command` is the latency probe binary to
    /// look for (normally `cyclictest`).
    pub fn detect(probe_command: &str) -> Self {
        let root = is_root();
        Self {
            rt_scheduling: has_rt_scheduler(),
            root,
            temperature: cpu_temperature().is_some(),
            probe_binary: probe_available(probe_command),
            cache_drop: cfg!(target_os = "linux") && root,
            core_count: core_count(),
        }
    }
}

/// Whether the process runs with root privileges.
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no failure modes.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
#[allow(missing_docs)]
pub fn is_root() -> bool {
    false
}

/// Whether SCHED_FIFO exists on this platform.
#[cfg(target_os = "linux")]
pub fn has_rt_scheduler() -> bool {
    // SAFETY: pure query, no state touched.
    unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) > 0 }
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn has_rt_scheduler() -> bool {
    false
}

/// Logical core count.
pub fn core_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn probe_available(command: &str) -> bool {
    let mut cmd = std::process::Command::new(command);
    cmd.arg("--help");
    matches!(run_with_timeout(&mut cmd, Duration::from_secs(5)), Ok(out) if out.status.success())
}

/// Current CPU temperature in degrees Celsius, if a sensor is readable.
#[cfg(target_os = "linux")]
pub fn cpu_temperature() -> Option<f64> {
    for zone in THERMAL_ZONES {
        if let Ok(raw) = std::fs::read_to_string(zone) {
            if let Ok(millidegrees) = raw.trim().parse::<i64>() {
                return Some(millidegrees as f64 / 1000.0);
            }
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn cpu_temperature() -> Option<f64> {
    None
}

/// Flush filesystem buffers.
#[cfg(unix)]
pub fn sync_filesystem() {
    // SAFETY: sync() is always safe to call.
    unsafe { libc::sync() };
}

#[cfg(not(unix))]
#[allow(missing_docs)]
pub fn sync_filesystem() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

/// Drop the page cache if possible. Returns whether the drop happened;
/// lacking root or running off Linux is a silent `false`, never an error.
#[cfg(target_os = "linux")]
pub fn drop_caches() -> bool {
    if !is_root() {
        return false;
    }
    sync_filesystem();
    match std::fs::write("/proc/sys/vm/drop_caches", "3") {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "page cache drop failed");
            false
        }
    }
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn drop_caches() -> bool {
    false
}

/// Ask the allocator to return free heap pages to the OS. This is the
/// reclamation point the harness forces between runs.
pub fn reclaim_memory(rounds: usize) {
    for _ in 0..rounds {
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        // SAFETY: malloc_trim only walks allocator metadata.
        unsafe {
            libc::malloc_trim(0);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Touch a small working set so the first measured run does not pay the
/// instruction/data cold-cache penalty alone.
pub fn warm_cpu_cache() {
    let mut sum = 0u64;
    for i in 0..1000u64 {
        sum = sum.wrapping_add(std::hint::black_box(i));
    }
    std::hint::black_box(sum);
}

/// Point-in-time memory availability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Total physical memory in MB
    pub total_mb: f64,
    /// Memory available for allocation in MB
    pub available_mb: f64,
}

/// Snapshot current memory availability from `/proc/meminfo`.
#[cfg(target_os = "linux")]
pub fn memory_snapshot() -> Option<MemorySnapshot> {
    let content = std::fs::read_to_string("/proc/meminfo").ok()?;
    let field = |name: &str| -> Option<f64> {
        content
            .lines()
            .find(|l| l.starts_with(name))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb as f64 / 1024.0)
    };
    let total_mb = field("MemTotal")?;
    let available_mb = field("MemAvailable").or_else(|| field("MemFree"))?;
    Some(MemorySnapshot {
        total_mb,
        available_mb,
    })
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn memory_snapshot() -> Option<MemorySnapshot> {
    None
}

/// CPU model name from `/proc/cpuinfo` (Linux only).
pub fn cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Total system memory in GB.
pub fn memory_gb() -> Option<f64> {
    memory_snapshot().map(|snapshot| snapshot.total_mb / 1024.0)
}

/// Kernel release string (Linux only).
pub fn kernel_release() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_count_is_positive() {
        assert!(core_count() >= 1);
    }

    #[test]
    fn detect_never_panics() {
        let caps = Capabilities::detect("definitely-not-a-real-probe-binary");
        assert!(!caps.probe_binary);
        assert_eq!(caps.core_count, core_count());
    }

    #[test]
    fn cache_drop_without_root_is_false() {
        if !is_root() {
            assert!(!drop_caches());
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn memory_snapshot_is_sane() {
        let snapshot = memory_snapshot().expect("meminfo should parse on Linux");
        assert!(snapshot.total_mb > 0.0);
        assert!(snapshot.available_mb <= snapshot.total_mb);
    }

    #[test]
    fn warm_cache_and_reclaim_run() {
        warm_cpu_cache();
        reclaim_memory(1);
    }
}

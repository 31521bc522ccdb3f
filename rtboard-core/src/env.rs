//! Real-Time Environment Controller
//!
//! Applies and reverts process-wide real-time configuration: memory
//! locking, SCHED_FIFO priority, heap-trim suspension and CPU affinity.
//! The applied state lives in one explicit [`EnvironmentState`] value owned
//! by the controller; reporting reads it from here, nothing consults
//! ambient globals.
//!
//! Teardown reverses only what the OS lets us reverse: the allocator trim
//! threshold and the affinity mask. `mlockall` and an elevated scheduling
//! class are left to die with the process.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::measure::unpin_from_cores;
use crate::platform;

/// Highest SCHED_FIFO priority, matching what the latency probe asks for.
#[cfg(target_os = "linux")]
const RT_PRIORITY: i32 = 99;

/// glibc's default M_TRIM_THRESHOLD, restored at teardown.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
const DEFAULT_TRIM_THRESHOLD: i32 = 128 * 1024;

/// Process-wide flags describing the applied real-time configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// Current and future pages locked into RAM
    pub memory_locked: bool,
    /// SCHED_FIFO (or the nice-level fallback) is in effect
    pub rt_priority_set: bool,
    /// Automatic heap reclamation suspended for the measurement window
    pub heap_trim_disabled: bool,
    /// Process pinned to the reserved core
    pub cpu_affinity_set: bool,
}

/// Controller owning the real-time process configuration.
pub struct RtEnvironment {
    state: EnvironmentState,
    reserved_core: usize,
}

impl RtEnvironment {
    /// Create a controller that will pin the process to `reserved_core`.
    pub fn new(reserved_core: usize) -> Self {
        Self {
            state: EnvironmentState::default(),
            reserved_core,
        }
    }

    /// The currently applied configuration.
    pub fn state(&self) -> EnvironmentState {
        self.state
    }

    /// Apply the real-time configuration. Every step is best-effort: a
    /// denied privilege downgrades that step and the flag records the
    /// truth. Always returns the resulting state.
    pub fn setup(&mut self) -> EnvironmentState {
        if !cfg!(unix) {
            warn!("non-Unix platform: real-time scheduling and memory locking unavailable");
            return self.state;
        }

        self.state.memory_locked = lock_memory();
        self.state.rt_priority_set = set_rt_priority();
        self.state.heap_trim_disabled = disable_heap_trim();
        self.state.cpu_affinity_set = pin_to_reserved(self.reserved_core);

        info!(
            memory_locked = self.state.memory_locked,
            rt_priority = self.state.rt_priority_set,
            heap_trim_disabled = self.state.heap_trim_disabled,
            affinity = self.state.cpu_affinity_set,
            reserved_core = self.reserved_core,
            "real-time environment applied"
        );
        self.state
    }

    /// Revert the reversible parts of the configuration.
    pub fn teardown(&mut self) {
        if self.state.heap_trim_disabled {
            restore_heap_trim();
            self.state.heap_trim_disabled = false;
        }
        if self.state.cpu_affinity_set {
            if let Err(err) = unpin_from_cores(platform::core_count()) {
                debug!(error = %err, "affinity restore failed");
            }
            self.state.cpu_affinity_set = false;
        }
        debug!("real-time environment reverted");
    }
}

#[cfg(unix)]
fn lock_memory() -> bool {
    // SAFETY: mlockall takes no pointers; failure is reported via errno.
    let locked = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } == 0;
    if !locked {
        warn!("mlockall failed (needs CAP_IPC_LOCK); continuing unlocked");
    }
    locked
}

#[cfg(not(unix))]
fn lock_memory() -> bool {
    false
}

#[cfg(target_os = "linux")]
fn set_rt_priority() -> bool {
    if !platform::has_rt_scheduler() {
        return false;
    }
    let param = libc::sched_param {
        sched_priority: RT_PRIORITY,
    };
    // SAFETY: param outlives the call; pid 0 targets this process.
    if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } == 0 {
        return true;
    }
    // No CAP_SYS_NICE: the best remaining scheduling improvement is the
    // highest conventional priority.
    warn!("SCHED_FIFO denied; falling back to nice(-20)");
    // SAFETY: nice takes an increment, not a pointer.
    unsafe { libc::nice(-20) != -1 }
}

#[cfg(not(target_os = "linux"))]
fn set_rt_priority() -> bool {
    false
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn disable_heap_trim() -> bool {
    // SAFETY: mallopt only tweaks allocator parameters.
    unsafe { libc::mallopt(libc::M_TRIM_THRESHOLD, -1) == 1 }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn disable_heap_trim() -> bool {
    false
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn restore_heap_trim() {
    // SAFETY: as above.
    unsafe {
        libc::mallopt(libc::M_TRIM_THRESHOLD, DEFAULT_TRIM_THRESHOLD);
    }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn restore_heap_trim() {}

fn pin_to_reserved(core: usize) -> bool {
    match crate::measure::pin_to_core(core) {
        Ok(()) => true,
        Err(err) => {
            debug!(core, error = %err, "reserved-core pinning failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_all_false() {
        let env = RtEnvironment::new(3);
        assert_eq!(env.state(), EnvironmentState::default());
    }

    #[test]
    fn teardown_clears_reversible_flags() {
        let mut env = RtEnvironment::new(0);
        env.setup();
        env.teardown();
        let state = env.state();
        assert!(!state.heap_trim_disabled);
        assert!(!state.cpu_affinity_set);
    }

    #[test]
    fn setup_is_idempotent_on_state_shape() {
        let mut env = RtEnvironment::new(0);
        let first = env.setup();
        let second = env.setup();
        assert_eq!(first, second);
        env.teardown();
    }
}

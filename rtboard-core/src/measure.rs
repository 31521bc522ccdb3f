//! Wall-Clock Timing and Core Pinning
//!
//! Timing uses the monotonic clock; the board reports microsecond-scale
//! scheduler latency through the external probe, so nanosecond-resolution
//! `Instant` is sufficient for the algorithm trials. Pinning keeps a trial
//! on one core so the comparator's per-core numbers mean what they say.

use std::time::Duration;

/// Timer for one measured execution.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: std::time::Instant,
}

impl Timer {
    /// Start a new timer.
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }

    /// Elapsed time since the timer was started.
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in seconds.
    #[inline(always)]
    pub fn elapsed_s(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Pin the current thread to a single core.
#[cfg(target_os = "linux")]
pub fn pin_to_core(core: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(core, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// Pinning is not supported off Linux; callers degrade to unpinned
/// execution and flag their result accordingly.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_core(_core: usize) -> Result<(), std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "CPU affinity is only supported on Linux",
    ))
}

/// Restore the current thread's affinity to all of the first `total_cores`
/// cores. Used by environment teardown.
#[cfg(target_os = "linux")]
pub fn unpin_from_cores(total_cores: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        for core in 0..total_cores.min(libc::CPU_SETSIZE as usize) {
            libc::CPU_SET(core, set_ref);
        }

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(not(target_os = "linux"))]
#[allow(missing_docs)]
pub fn unpin_from_cores(_total_cores: usize) -> Result<(), std::io::Error> {
    Ok(())
}

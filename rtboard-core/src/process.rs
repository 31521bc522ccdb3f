//! Bounded Subprocess Execution
//!
//! The board shells out to the latency probe and to feature-detection
//! commands. Every such wait is bounded: a child that outlives its budget
//! is killed and reported as a timeout, never awaited indefinitely.

use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Poll interval while waiting on a child process.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Subprocess failure modes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The child did not exit within the allotted time and was killed.
    #[error("process exceeded {:.1}s timeout", .timeout.as_secs_f64())]
    Timeout {
        /// The budget that was exceeded
        timeout: Duration,
    },

    /// Spawning or reaping the child failed.
    #[error("process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a command to completion with a hard timeout.
///
/// stdin is closed and both output streams are captured. On timeout the
/// child is killed and reaped before the error is returned, so no zombie
/// outlives the call.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let started = Instant::now();

    loop {
        match child.try_wait()? {
            Some(_) => return Ok(child.wait_with_output()?),
            None => {
                if started.elapsed() >= timeout {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(ProcessError::Timeout { timeout });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_command_completes() {
        let mut cmd = Command::new("true");
        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).expect("true should run");
        assert!(output.status.success());
    }

    #[test]
    fn captures_stdout() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).expect("echo should run");
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn slow_command_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("10");
        let started = Instant::now();
        let result = run_with_timeout(&mut cmd, Duration::from_millis(200));
        assert!(matches!(result, Err(ProcessError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_binary_is_io_error() {
        let mut cmd = Command::new("definitely-not-a-real-binary-name");
        let result = run_with_timeout(&mut cmd, Duration::from_secs(1));
        assert!(matches!(result, Err(ProcessError::Io(_))));
    }
}

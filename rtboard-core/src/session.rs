//! Isolated Test Session
//!
//! A scoped resource that resets shared system state before a measurement
//! and guarantees cleanup after it, on every exit path. Entry snapshots
//! memory, creates a throwaway working directory and drops what caches it
//! may; exit terminates registered children, restores the original working
//! directory, removes the working area and reports each cleanup step
//! individually.
//!
//! Sessions are strictly sequential: the process-wide guard makes opening a
//! second session while one is active a hard error rather than undefined
//! behaviour.

use std::io::Write;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform::{self, MemorySnapshot};

/// Process-wide reentrancy guard. Working directory and cache state are
/// process-global, so two live sessions cannot both own them.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// How long to wait for a registered child to die before giving up.
const CHILD_WAIT: Duration = Duration::from_secs(5);

/// Session lifecycle failures. These are the fatal kind: if the isolated
/// working area cannot even be created, the measurement must not run.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already active in this process.
    #[error("an isolated session is already active; sessions must be sequential")]
    Active,

    /// Creating or entering the isolated working area failed.
    #[error("failed to set up isolated session: {0}")]
    Setup(#[from] std::io::Error),
}

/// Outcome of one cleanup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed fully.
    Done,
    /// Best-effort step degraded (e.g. no root for a cache drop).
    Partial(String),
    /// Step failed outright.
    Failed(String),
}

/// One labelled cleanup step.
#[derive(Debug, Clone)]
pub struct CleanupStep {
    /// What the step did
    pub label: &'static str,
    /// How it went
    pub outcome: StepOutcome,
}

/// Step-by-step record of a session teardown.
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// Steps in execution order
    pub steps: Vec<CleanupStep>,
    /// Change in available memory across the session, in MB
    pub memory_delta_mb: Option<f64>,
}

impl CleanupReport {
    /// Cleanup succeeded iff no step hard-failed. Partial best-effort
    /// steps do not count against success.
    pub fn is_success(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|step| matches!(step.outcome, StepOutcome::Failed(_)))
    }

    fn push(&mut self, label: &'static str, outcome: StepOutcome) {
        self.steps.push(CleanupStep { label, outcome });
    }
}

/// The scoped isolated environment. Construct through [`with_session`],
/// which guarantees the cleanup report runs even when the body panics.
pub struct IsolatedSession {
    name: String,
    original_cwd: PathBuf,
    workdir: Option<TempDir>,
    children: Vec<Child>,
    memory_before: Option<MemorySnapshot>,
    finished: bool,
}

impl IsolatedSession {
    fn begin(name: &str) -> Result<Self, SessionError> {
        if SESSION_ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(SessionError::Active);
        }
        match Self::enter(name) {
            Ok(session) => Ok(session),
            Err(err) => {
                SESSION_ACTIVE.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    fn enter(name: &str) -> Result<Self, SessionError> {
        let original_cwd = std::env::current_dir()?;
        let memory_before = platform::memory_snapshot();

        let workdir = tempfile::Builder::new()
            .prefix(&format!("rtboard_{name}_"))
            .tempdir()?;
        std::env::set_current_dir(workdir.path())?;

        if platform::drop_caches() {
            debug!(session = name, "page cache dropped on entry");
        } else {
            debug!(session = name, "cache drop skipped (unprivileged or unsupported)");
        }
        platform::reclaim_memory(3);
        std::io::stdout().flush().ok();

        info!(
            session = name,
            workdir = %workdir.path().display(),
            available_mb = memory_before.map(|m| m.available_mb),
            "isolated session created"
        );

        Ok(Self {
            name: name.to_string(),
            original_cwd,
            workdir: Some(workdir),
            children: Vec::new(),
            memory_before,
            finished: false,
        })
    }

    /// The session's throwaway working directory.
    pub fn workdir(&self) -> &Path {
        self.workdir
            .as_ref()
            .map(|dir| dir.path())
            .unwrap_or(&self.original_cwd)
    }

    /// Register a child process to be terminated at session exit.
    pub fn register_child(&mut self, child: Child) {
        self.children.push(child);
    }

    fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.finished {
            return report;
        }
        self.finished = true;

        // Registered children first, so nothing keeps the workdir busy.
        let mut partial = 0usize;
        let total = self.children.len();
        for child in &mut self.children {
            child.kill().ok();
            let deadline = Instant::now() + CHILD_WAIT;
            let mut reaped = false;
            while Instant::now() < deadline {
                match child.try_wait() {
                    Ok(Some(_)) => {
                        reaped = true;
                        break;
                    }
                    Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                    Err(_) => break,
                }
            }
            if !reaped {
                partial += 1;
            }
        }
        self.children.clear();
        if total > 0 {
            let outcome = if partial == 0 {
                StepOutcome::Done
            } else {
                StepOutcome::Partial(format!("{partial}/{total} children did not exit in time"))
            };
            report.push("terminate spawned processes", outcome);
        }

        platform::reclaim_memory(3);
        report.push("memory reclamation rounds", StepOutcome::Done);

        match std::env::set_current_dir(&self.original_cwd) {
            Ok(()) => report.push("restore working directory", StepOutcome::Done),
            Err(err) => report.push(
                "restore working directory",
                StepOutcome::Failed(err.to_string()),
            ),
        }

        match self.workdir.take() {
            Some(dir) => match dir.close() {
                Ok(()) => report.push("remove isolated directory", StepOutcome::Done),
                Err(err) => report.push(
                    "remove isolated directory",
                    StepOutcome::Failed(err.to_string()),
                ),
            },
            None => report.push(
                "remove isolated directory",
                StepOutcome::Partial("already removed".into()),
            ),
        }

        platform::sync_filesystem();
        if platform::drop_caches() {
            report.push("drop system caches", StepOutcome::Done);
        } else {
            report.push(
                "drop system caches",
                StepOutcome::Partial("unprivileged or unsupported".into()),
            );
        }

        report.memory_delta_mb = match (self.memory_before, platform::memory_snapshot()) {
            (Some(before), Some(after)) => Some(after.available_mb - before.available_mb),
            _ => None,
        };

        std::io::stdout().flush().ok();

        SESSION_ACTIVE.store(false, Ordering::SeqCst);

        if report.is_success() {
            debug!(session = %self.name, "session destroyed");
        } else {
            warn!(session = %self.name, ?report, "session cleanup completed with failures");
        }
        report
    }
}

impl Drop for IsolatedSession {
    fn drop(&mut self) {
        // Backstop only; with_session always runs cleanup explicitly.
        let _ = self.cleanup();
    }
}

/// Run `body` inside an isolated session.
///
/// Cleanup runs and the report is produced on every exit path; a panic in
/// the body is re-raised after the environment has been restored. This is
/// the only way to obtain a session, which is what makes the guarantee
/// structural.
pub fn with_session<T>(
    name: &str,
    body: impl FnOnce(&mut IsolatedSession) -> T,
) -> Result<(T, CleanupReport), SessionError> {
    let mut session = IsolatedSession::begin(name)?;
    let outcome = catch_unwind(AssertUnwindSafe(|| body(&mut session)));
    let report = session.cleanup();
    match outcome {
        Ok(value) => Ok((value, report)),
        Err(panic) => {
            warn!(session = name, "session body panicked; environment restored");
            drop(report);
            resume_unwind(panic)
        }
    }
}

#![warn(missing_docs)]
//! rtboard core - measurement runtime
//!
//! This crate provides everything the board needs to take a trustworthy
//! measurement on a live machine:
//! - Capability detection for OS-level real-time features
//! - An environment controller that applies and reverts real-time process
//!   configuration (memory lock, scheduling class, CPU affinity)
//! - A scoped isolated test session with guaranteed cleanup
//! - A thermal governor enforcing bounded cooldown waits
//! - The algorithm timing harness and the standard workload set
//! - A sequential multicore comparator with a reserved-core partition

mod env;
mod harness;
mod measure;
mod multicore;
pub mod platform;
mod process;
mod session;
mod thermal;
mod workload;

pub use env::{EnvironmentState, RtEnvironment};
pub use harness::{HarnessConfig, HarnessError, TimingHarness, TimingSample, WorkloadRun};
pub use measure::{pin_to_core, unpin_from_cores, Timer};
pub use multicore::{CoreComparison, MultiCoreManager, MulticoreWindows};
pub use platform::{Capabilities, MemorySnapshot};
pub use process::{run_with_timeout, ProcessError};
pub use session::{
    with_session, CleanupReport, CleanupStep, IsolatedSession, SessionError, StepOutcome,
};
pub use thermal::{
    CooldownOutcome, SystemSensor, TemperatureSource, ThermalConfig, ThermalGovernor,
};
pub use workload::{standard_workloads, Workload, WorkloadInput};

//! Simulation harness.
//!
//! Loads workloads from disk and runs them on a `Crossbar`.

/// Workload files and their execution.
pub mod workload;

pub use workload::{run_workload, Workload};

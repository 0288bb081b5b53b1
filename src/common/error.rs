//! Simulator Error Types.
//!
//! Every fallible operation of the crossbar returns `Result<T, XbarError>`.
//! Errors are raised before any conductance or counter state is touched, so a
//! caller that receives one still holds a consistent crossbar.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::MappingMode;

/// Result type alias for crossbar operations.
pub type Result<T> = std::result::Result<T, XbarError>;

/// Errors raised by configuration loading, encoding and MVM execution.
#[derive(Debug, Error)]
pub enum XbarError {
    /// Configuration file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration or workload file could not be parsed.
    #[error("failed to parse '{path}': {reason}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A configuration value is outside its legal range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration is legal on its own but not supported by the selected mode.
    #[error("unsupported configuration for {mode}: {reason}")]
    UnsupportedConfig {
        /// Selected mapping mode.
        mode: MappingMode,
        /// What is unsupported.
        reason: String,
    },

    /// Operand shape does not match the configured crossbar.
    #[error("dimension mismatch: crossbar is {expected_m}x{expected_n}, operand is {m}x{n}")]
    DimensionMismatch {
        /// Configured rows.
        expected_m: usize,
        /// Configured columns.
        expected_n: usize,
        /// Requested rows.
        m: usize,
        /// Requested columns.
        n: usize,
    },

    /// A buffer is shorter or longer than the shape it is passed with.
    #[error("{what} has {actual} elements, expected {expected}")]
    LengthMismatch {
        /// "matrix", "vector" or "result".
        what: &'static str,
        /// Length implied by the shape.
        expected: usize,
        /// Length of the buffer.
        actual: usize,
    },

    /// A weight or input lies outside the alphabet of the mapping mode.
    #[error("{mode} cannot encode {what} {value} (legal range {min}..={max})")]
    DomainViolation {
        /// Selected mapping mode.
        mode: MappingMode,
        /// "weight" or "input".
        what: &'static str,
        /// Offending value.
        value: i32,
        /// Smallest legal value.
        min: i32,
        /// Largest legal value.
        max: i32,
    },

    /// A read-disturb accessor was used while the model is disabled.
    #[error("read disturb model is disabled in this configuration")]
    ReadDisturbDisabled,
}

impl XbarError {
    /// Builds a `DomainViolation` for a matrix entry.
    pub fn weight(mode: MappingMode, value: i32, min: i32, max: i32) -> Self {
        Self::DomainViolation {
            mode,
            what: "weight",
            value,
            min,
            max,
        }
    }

    /// Builds a `DomainViolation` for an input vector entry.
    pub fn input(mode: MappingMode, value: i32, min: i32, max: i32) -> Self {
        Self::DomainViolation {
            mode,
            what: "input",
            value,
            min,
            max,
        }
    }

    /// Returns true for the fatal alphabet violations.
    pub fn is_domain_violation(&self) -> bool {
        matches!(self, Self::DomainViolation { .. })
    }
}

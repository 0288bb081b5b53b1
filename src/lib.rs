//! Analog In-Memory Computing Crossbar Simulator Library.
//!
//! This crate simulates a resistive crossbar array that evaluates integer
//! matrix-vector multiplications in the analog domain. Weights are encoded
//! into device conductances, inputs are applied bit-serially and column
//! currents are quantized by an ADC.
//!
//! # Architecture
//!
//! * **Mapping**: Nine encodings of signed or ternary operands into conductance pairs.
//! * **Readout**: Symmetric, positive-only and ideal ADC models.
//! * **Reliability**: Analytic read disturb model with three mitigation strategies.
//!
//! # Modules
//!
//! * `adc`: Readout quantizers.
//! * `common`: Error handling.
//! * `config`: Configuration loading and validation.
//! * `mapping`: Conductance encodings and MVM kernels.
//! * `sim`: Workload loading and execution.
//! * `stats`: Activity counters and mapping cost report.
//! * `xbar`: Crossbar orchestration and read disturb.

/// Analog-to-digital converter models.
///
/// Quantize accumulated column currents onto a fixed number of levels inside
/// a symmetric or positive-only window, or pass them through unchanged.
pub mod adc;

/// Error type and `Result` alias shared by all components.
pub mod common;

/// Configuration system for array geometry, encoding, ADC and read disturb.
///
/// Loads JSON or TOML files, fills in defaults and validates every field.
pub mod config;

/// Weight mapping and matrix-vector kernels.
///
/// Encodes integer matrices into conductance levels and evaluates products
/// exactly or through the ADC.
pub mod mapping;

/// Workload loading and execution for the CLI.
pub mod sim;

/// Crossbar activity statistics and per-mode cost report.
pub mod stats;

/// Crossbar orchestration, read disturb model and refresh policies.
pub mod xbar;

//! Common types shared across the simulator.
//!
//! Currently this is the error type and its `Result` alias; everything else
//! lives next to the component that owns it.

/// Error types for configuration, encoding and MVM execution.
pub mod error;

pub use error::{Result, XbarError};

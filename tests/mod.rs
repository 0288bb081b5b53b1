//! Test module organization.
//!
//! This module organizes all integration tests for the crossbar simulator.

/// ADC quantization window and conversion tests.
mod adc_tests;


/// Crossbar counters, read disturb accounting and refresh tests.
mod crossbar_tests;

/// End-to-end tests against the reference scenarios.
mod fixture_tests;

//! Integration tests for the ADC models.

use approx::assert_relative_eq;
use cim_crossbar::adc::{build_adc, Adc, InfAdc, PosAdc, SymAdc};
use cim_crossbar::config::{AdcKind, Config, MappingMode};

const HRS: f32 = 1e-5;
const LRS: f32 = 1e-4;

/// Tests that the symmetric window spans `±alpha * N * (LRS - HRS)`.
#[test]
fn test_sym_adc_window() {
    let adc = SymAdc::new(5, HRS, LRS, 1.0, 8);

    assert_relative_eq!(adc.max_current(), 5.0 * (LRS - HRS), max_relative = 1e-6);
    assert_eq!(adc.min_current(), -adc.max_current());
    assert_relative_eq!(
        adc.step_size(),
        2.0 * adc.max_current() / 255.0,
        max_relative = 1e-6
    );
}

/// Tests that alpha scales the window linearly.
#[test]
fn test_sym_adc_alpha_scaling() {
    let full = SymAdc::new(8, HRS, LRS, 1.0, 6);
    let half = SymAdc::new(8, HRS, LRS, 0.5, 6);

    assert_relative_eq!(half.max_current(), full.max_current() / 2.0, max_relative = 1e-6);
    assert_relative_eq!(half.step_size(), full.step_size() / 2.0, max_relative = 1e-6);
}

/// Tests clamping at both edges of the symmetric window.
#[test]
fn test_sym_adc_clamps() {
    let adc = SymAdc::new(4, HRS, LRS, 1.0, 4);

    assert_eq!(adc.convert(1.0), adc.max_current());
    assert_eq!(adc.convert(adc.max_current()), adc.max_current());
    assert_eq!(adc.convert(-1.0), adc.min_current());
    assert_eq!(adc.convert(adc.min_current()), adc.min_current());
}

/// Tests rounding to the nearest quantization level.
#[test]
fn test_sym_adc_rounds_to_nearest_level() {
    let adc = SymAdc::new(4, HRS, LRS, 1.0, 8);
    let step = adc.step_size();

    assert_eq!(adc.convert(0.0), 0.0);
    assert_relative_eq!(adc.convert(3.4 * step), 3.0 * step, max_relative = 1e-5);
    assert_relative_eq!(adc.convert(3.6 * step), 4.0 * step, max_relative = 1e-5);
    assert_relative_eq!(adc.convert(-7.2 * step), -7.0 * step, max_relative = 1e-5);
}

/// Tests that conversion is deterministic.
#[test]
fn test_adc_deterministic() {
    let adc = SymAdc::new(16, HRS, LRS, 0.75, 5);
    let current = 1.234e-4;

    let first = adc.convert(current);
    for _ in 0..10 {
        assert_eq!(adc.convert(current), first);
    }
}

/// Tests the positive-only window `[0, alpha * N * LRS]`.
#[test]
fn test_pos_adc_window_and_clamps() {
    let adc = PosAdc::new(5, LRS, 1.0, 7);

    assert_eq!(adc.min_current(), 0.0);
    assert_relative_eq!(adc.max_current(), 5.0 * LRS, max_relative = 1e-6);
    assert_relative_eq!(adc.step_size(), adc.max_current() / 127.0, max_relative = 1e-6);

    assert_eq!(adc.convert(-1e-6), 0.0);
    assert_eq!(adc.convert(1.0), adc.max_current());

    let step = adc.step_size();
    assert_relative_eq!(adc.convert(10.3 * step), 10.0 * step, max_relative = 1e-5);
}

/// Tests that the ideal ADC passes currents through.
#[test]
fn test_inf_adc_passthrough() {
    let adc = InfAdc;

    for &current in &[0.0f32, 1e-9, -3.7e-5, 123.0] {
        assert_eq!(adc.convert(current), current);
    }
    assert_eq!(adc.step_size(), 0.0);
}

/// Tests that the factory honours the configured ADC kind.
#[test]
fn test_build_adc_from_config() {
    let mut config = Config::new(2, 10, MappingMode::ITcWDiff);
    config.adc.resolution = 6;

    config.adc.kind = AdcKind::SymRange;
    let sym = build_adc(&config);
    assert_relative_eq!(sym.max_current(), 10.0 * (LRS - HRS), max_relative = 1e-6);
    assert!(sym.min_current() < 0.0);

    config.adc.kind = AdcKind::PosRange;
    let pos = build_adc(&config);
    assert_relative_eq!(pos.max_current(), 10.0 * LRS, max_relative = 1e-6);
    assert_eq!(pos.min_current(), 0.0);

    config.adc.kind = AdcKind::Inf;
    let inf = build_adc(&config);
    assert_eq!(inf.convert(42.5), 42.5);
}

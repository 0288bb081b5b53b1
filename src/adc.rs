//! Analog-to-Digital Converter Models.
//!
//! This module defines the `Adc` trait and the readout quantizers used by the
//! analog MVM path. A quantizer maps a column current onto the nearest of
//! `2^resolution` evenly spaced levels inside a fixed current window and clamps
//! everything outside that window to its edges.

use crate::config::{AdcKind, Config};

/// Trait for readout quantizers.
pub trait Adc {
    /// Quantizes a column current.
    ///
    /// # Arguments
    ///
    /// * `current` - Accumulated analog current of one conversion.
    ///
    /// # Returns
    ///
    /// The current of the nearest representable level.
    fn convert(&self, current: f32) -> f32;

    /// Distance between two adjacent quantization levels.
    fn step_size(&self) -> f32;

    /// Lower edge of the conversion window.
    fn min_current(&self) -> f32;

    /// Upper edge of the conversion window.
    fn max_current(&self) -> f32;
}

/// Uniform quantizer over `[min, max]` shared by the ranged ADCs.
#[derive(Debug, Clone, Copy)]
struct Window {
    min: f32,
    max: f32,
    step: f32,
}

impl Window {
    fn new(min: f32, max: f32, resolution: u32) -> Self {
        let levels = ((1u64 << resolution) - 1) as f32;
        Self {
            min,
            max,
            step: (max - min) / levels,
        }
    }

    fn convert(&self, current: f32) -> f32 {
        if current >= self.max {
            self.max
        } else if current <= self.min {
            self.min
        } else {
            (current / self.step).round() * self.step
        }
    }
}

/// ADC whose window is symmetric around zero.
///
/// Sized for differential readout, where a column can carry at most
/// `N * (LRS - HRS)` in either direction. `alpha` scales that bound.
#[derive(Debug, Clone, Copy)]
pub struct SymAdc {
    window: Window,
}

impl SymAdc {
    /// Creates a new SymAdc.
    ///
    /// # Arguments
    ///
    /// * `n` - Number of crossbar columns feeding one conversion.
    /// * `hrs` - High-resistance-state conductance.
    /// * `lrs` - Low-resistance-state conductance.
    /// * `alpha` - Range scale.
    /// * `resolution` - Converter bit width.
    pub fn new(n: usize, hrs: f32, lrs: f32, alpha: f32, resolution: u32) -> Self {
        let max = alpha * n as f32 * (lrs - hrs);
        Self {
            window: Window::new(-max, max, resolution),
        }
    }
}

impl Adc for SymAdc {
    fn convert(&self, current: f32) -> f32 {
        self.window.convert(current)
    }

    fn step_size(&self) -> f32 {
        self.window.step
    }

    fn min_current(&self) -> f32 {
        self.window.min
    }

    fn max_current(&self) -> f32 {
        self.window.max
    }
}

/// ADC whose window spans `[0, alpha * N * LRS]`.
///
/// Used with single-array encodings where column currents are never negative.
#[derive(Debug, Clone, Copy)]
pub struct PosAdc {
    window: Window,
}

impl PosAdc {
    /// Creates a new PosAdc.
    ///
    /// # Arguments
    ///
    /// * `n` - Number of crossbar columns feeding one conversion.
    /// * `lrs` - Low-resistance-state conductance.
    /// * `alpha` - Range scale.
    /// * `resolution` - Converter bit width.
    pub fn new(n: usize, lrs: f32, alpha: f32, resolution: u32) -> Self {
        let max = alpha * n as f32 * lrs;
        Self {
            window: Window::new(0.0, max, resolution),
        }
    }
}

impl Adc for PosAdc {
    fn convert(&self, current: f32) -> f32 {
        self.window.convert(current)
    }

    fn step_size(&self) -> f32 {
        self.window.step
    }

    fn min_current(&self) -> f32 {
        self.window.min
    }

    fn max_current(&self) -> f32 {
        self.window.max
    }
}

/// Ideal converter with infinite resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfAdc;

impl Adc for InfAdc {
    /// Returns the current unchanged.
    fn convert(&self, current: f32) -> f32 {
        current
    }

    fn step_size(&self) -> f32 {
        0.0
    }

    fn min_current(&self) -> f32 {
        f32::NEG_INFINITY
    }

    fn max_current(&self) -> f32 {
        f32::INFINITY
    }
}

/// Builds the ADC selected by `config.adc.kind`.
pub fn build_adc(config: &Config) -> Box<dyn Adc> {
    let x = &config.xbar;
    let a = &config.adc;
    match a.kind {
        AdcKind::SymRange => Box::new(SymAdc::new(x.n, x.hrs, x.lrs, a.alpha, a.resolution)),
        AdcKind::PosRange => Box::new(PosAdc::new(x.n, x.lrs, a.alpha, a.resolution)),
        AdcKind::Inf => Box::new(InfAdc),
    }
}

//! Read Disturb Model.
//!
//! Analytic model of conductance loss under repeated reads, after Jiang et
//! al. A set cell drifts towards HRS with a transition time that shortens
//! with the number of set/reset cycles it has endured:
//!
//! ```text
//! t_tt(N)   = t0 · exp((c1 - a·V) / (kB·T)) · max(N, 1)^-0.45
//! G/G0(r,N) = exp(-(r · t_read / t_tt(N))^p),   p = m + k·V
//! ```
//!
//! Alongside the equations the model keeps per-cell cycle and
//! consecutive-read counters for both conductance arrays.

use ndarray::Array2;
use std::cell::Cell;
use tracing::warn;

use crate::config::Config;
use crate::mapping::Polarity;

/// Attempt time constant in seconds.
const T0: f64 = 1e-9;
/// Activation barrier in eV.
const C1: f64 = 0.35;
/// Field-driven barrier lowering in eV/V.
const A: f64 = 0.25;
/// Boltzmann constant in eV/K.
const K_B: f64 = 8.617_333e-5;
/// Exponent of the cycle dependence of the transition time.
const CYCLE_EXPONENT: f64 = 0.45;
/// Slope of the shape factor over the read voltage.
const K: f64 = 2.0;
/// Intercept of the shape factor.
const M: f64 = 1.4;
/// Width of a single read pulse in seconds.
const T_READ: f64 = 10e-9;

/// Largest cycle count covered by the fit.
const MAX_CYCLES: u64 = 1_000_000;
/// Largest normalized stress time covered by the fit.
const MAX_STRESS_RATIO: f64 = 10.0;

/// Per-cell wear state plus the analytic degradation equations.
#[derive(Debug, Clone)]
pub struct ReadDisturb {
    v_read: f64,
    temperature: f64,
    exp_tt: f64,
    p: f64,
    cycles_p: Array2<u64>,
    cycles_m: Array2<u64>,
    consecutive_reads_p: Array2<u64>,
    consecutive_reads_m: Array2<u64>,
    run_out_of_bounds: Cell<bool>,
}

impl ReadDisturb {
    /// Creates a new model with all counters at zero.
    ///
    /// # Arguments
    ///
    /// * `v_read` - Read voltage in volts.
    /// * `temperature` - Device temperature in kelvin.
    /// * `rows` - Physical rows of each conductance array.
    /// * `cols` - Columns of each conductance array.
    pub fn new(v_read: f64, temperature: f64, rows: usize, cols: usize) -> Self {
        Self {
            v_read,
            temperature,
            exp_tt: (C1 - A * v_read) / (K_B * temperature),
            p: M + K * v_read,
            cycles_p: Array2::zeros((rows, cols)),
            cycles_m: Array2::zeros((rows, cols)),
            consecutive_reads_p: Array2::zeros((rows, cols)),
            consecutive_reads_m: Array2::zeros((rows, cols)),
            run_out_of_bounds: Cell::new(false),
        }
    }

    /// Creates a model sized for the crossbar described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.read_disturb.v_read as f64,
            config.read_disturb.temperature as f64,
            config.physical_rows(),
            config.xbar.n,
        )
    }

    pub fn v_read(&self) -> f64 {
        self.v_read
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Adds one set/reset cycle to every cell marked in the masks.
    ///
    /// # Arguments
    ///
    /// * `update_p` - Cells of `gd_p` that went through a cycle.
    /// * `update_m` - Cells of `gd_m` that went through a cycle.
    pub fn update_cycles(&mut self, update_p: &Array2<bool>, update_m: &Array2<bool>) {
        self.cycles_p
            .zip_mut_with(update_p, |cycles, &hit| *cycles += hit as u64);
        self.cycles_m
            .zip_mut_with(update_m, |cycles, &hit| *cycles += hit as u64);
    }

    /// Counts one more read on every cell of both arrays.
    pub fn update_consecutive_reads(&mut self) {
        self.consecutive_reads_p.mapv_inplace(|r| r + 1);
        self.consecutive_reads_m.mapv_inplace(|r| r + 1);
    }

    pub fn reset_all_consecutive_reads(&mut self) {
        self.consecutive_reads_p.fill(0);
        self.consecutive_reads_m.fill(0);
    }

    /// Records a reset and set of a single cell: one more cycle, no reads since.
    pub fn refresh_cell(&mut self, polarity: Polarity, row: usize, col: usize) {
        let (cycles, reads) = match polarity {
            Polarity::Plus => (&mut self.cycles_p, &mut self.consecutive_reads_p),
            Polarity::Minus => (&mut self.cycles_m, &mut self.consecutive_reads_m),
        };
        cycles[[row, col]] += 1;
        reads[[row, col]] = 0;
    }

    /// Mean time until a cell with `cycles` set/reset cycles flips, in seconds.
    pub fn calc_transition_time(&self, cycles: u64) -> f64 {
        if cycles > MAX_CYCLES {
            self.mark_out_of_bounds("cycle count", cycles as f64);
        }
        let n = cycles.max(1) as f64;
        T0 * self.exp_tt.exp() * n.powf(-CYCLE_EXPONENT)
    }

    /// Fraction of the pristine conductance left after `reads` consecutive reads.
    ///
    /// # Arguments
    ///
    /// * `reads` - Reads since the cell was last programmed.
    /// * `cycles` - Set/reset cycles of the cell.
    ///
    /// # Returns
    ///
    /// A factor in `(0, 1]`; exactly 1 when `reads` is 0.
    pub fn calc_g0_scaling_factor(&self, reads: u64, cycles: u64) -> f64 {
        let ratio = reads as f64 * T_READ / self.calc_transition_time(cycles);
        if ratio > MAX_STRESS_RATIO {
            self.mark_out_of_bounds("stress ratio", ratio);
        }
        (-ratio.powf(self.p)).exp()
    }

    fn mark_out_of_bounds(&self, what: &str, value: f64) {
        if !self.run_out_of_bounds.replace(true) {
            warn!(what, value, "read disturb model evaluated outside its fitted range");
        }
    }

    /// Whether any evaluation left the fitted range since the last reset.
    pub fn run_out_of_bounds(&self) -> bool {
        self.run_out_of_bounds.get()
    }

    pub fn reset_out_of_bounds(&mut self) {
        self.run_out_of_bounds.set(false);
    }

    pub fn cycles(&self, polarity: Polarity) -> &Array2<u64> {
        match polarity {
            Polarity::Plus => &self.cycles_p,
            Polarity::Minus => &self.cycles_m,
        }
    }

    pub fn consecutive_reads(&self, polarity: Polarity) -> &Array2<u64> {
        match polarity {
            Polarity::Plus => &self.consecutive_reads_p,
            Polarity::Minus => &self.consecutive_reads_m,
        }
    }

    pub fn cycles_p(&self) -> &Array2<u64> {
        &self.cycles_p
    }

    pub fn cycles_m(&self) -> &Array2<u64> {
        &self.cycles_m
    }

    pub fn consecutive_reads_p(&self) -> &Array2<u64> {
        &self.consecutive_reads_p
    }

    pub fn consecutive_reads_m(&self) -> &Array2<u64> {
        &self.consecutive_reads_m
    }
}

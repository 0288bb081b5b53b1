//! Weight Mapping.
//!
//! A `Mapper` turns signed integer matrices into device conductances and
//! evaluates matrix-vector products over them, either exactly (digital path)
//! or bit-serially through the ADC (analog path). The numeric encoding is
//! delegated to a `MappingKernel` picked once from the configured
//! `MappingMode`:
//!
//! * `int`: signed multi-bit weights with differential, offset, two's
//!   complement or unsigned inputs.
//! * `tnn`: ternary weights and inputs.
//!
//! Operands are validated before any state changes, so a failed call leaves
//! the conductance arrays untouched.

/// Conductance and analog current arrays.
pub mod arrays;
/// Integer encodings.
pub mod int;
/// Ternary encodings.
pub mod tnn;

pub use arrays::{CellArrays, Polarity};

use ndarray::Array2;

use crate::adc::{build_adc, Adc};
use crate::common::{Result, XbarError};
use crate::config::{Config, MappingMode};
use crate::xbar::ReadDisturb;

/// Mode-specific encoding and MVM kernels.
///
/// Kernels are stateless apart from scratch buffers sized at construction;
/// the conductance state they operate on is owned by the `Mapper`.
pub trait MappingKernel {
    /// The mode implemented by this kernel.
    fn mode(&self) -> MappingMode;

    /// Whether `gd_m` holds physical cells.
    fn has_minus_array(&self) -> bool {
        true
    }

    /// Inclusive range of legal weights.
    fn weight_range(&self) -> (i32, i32);

    /// Inclusive range of legal inputs.
    fn input_range(&self) -> (i32, i32);

    /// Encodes a validated row-major weight matrix into conductance levels.
    fn digital_write(&self, cells: &mut CellArrays, matrix: &[i32]);

    /// Decodes the weight stored at logical position `(m, n)`.
    fn weight_at(&self, cells: &CellArrays, m: usize, n: usize) -> i32;

    /// Accumulates the exact product of the stored weights and `vector` into `result`.
    fn digital_mvm(&mut self, cells: &CellArrays, result: &mut [i32], vector: &[i32]);

    /// Accumulates the ADC-quantized product into `result`.
    fn analog_mvm(
        &mut self,
        cells: &CellArrays,
        adc: &dyn Adc,
        result: &mut [i32],
        vector: &[i32],
    );
}

/// Builds the kernel for `config.xbar.m_mode`.
pub fn kernel_for(config: &Config) -> Box<dyn MappingKernel> {
    match config.xbar.m_mode {
        MappingMode::IDiffWDiff1xb => Box::new(int::DiffKernel::new(config, false)),
        MappingMode::IDiffWDiff2xb => Box::new(int::DiffKernel::new(config, true)),
        MappingMode::IOffsWDiff => Box::new(int::OffsDiffKernel::new(config)),
        MappingMode::ITcWDiff => Box::new(int::TcDiffKernel::new(config)),
        MappingMode::IUintWDiff => Box::new(int::UintDiffKernel::new(config)),
        MappingMode::IUintWOffs => Box::new(int::UintOffsKernel::new(config)),
        MappingMode::TnnIDiffWDiff => Box::new(tnn::TnnDiffKernel),
        MappingMode::TnnIDiffWTc => Box::new(tnn::TnnTcKernel::new(config)),
        MappingMode::TnnIDiffWOffs => Box::new(tnn::TnnOffsKernel::new(config)),
    }
}

/// Conductance state plus the encoding and readout used on it.
pub struct Mapper {
    cells: CellArrays,
    kernel: Box<dyn MappingKernel>,
    adc: Box<dyn Adc>,
    m: usize,
    n: usize,
}

impl Mapper {
    /// Creates a mapper with all cells in HRS.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulator configuration; validated before use.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cells: CellArrays::new(config),
            kernel: kernel_for(config),
            adc: build_adc(config),
            m: config.xbar.m,
            n: config.xbar.n,
        })
    }

    pub fn mode(&self) -> MappingMode {
        self.kernel.mode()
    }

    pub fn has_minus_array(&self) -> bool {
        self.kernel.has_minus_array()
    }

    pub fn cells(&self) -> &CellArrays {
        &self.cells
    }

    pub fn adc(&self) -> &dyn Adc {
        self.adc.as_ref()
    }

    pub fn gd_p(&self) -> &Array2<i32> {
        self.cells.gd_p()
    }

    pub fn gd_m(&self) -> &Array2<i32> {
        self.cells.gd_m()
    }

    pub fn ia_p(&self) -> &Array2<f32> {
        self.cells.ia_p()
    }

    pub fn ia_m(&self) -> &Array2<f32> {
        self.cells.ia_m()
    }

    /// Checks that `m` x `n` is the configured shape.
    pub fn check_shape(&self, m: usize, n: usize) -> Result<()> {
        if m != self.m || n != self.n {
            return Err(XbarError::DimensionMismatch {
                expected_m: self.m,
                expected_n: self.n,
                m,
                n,
            });
        }
        Ok(())
    }

    /// Validates a weight matrix against shape and weight alphabet.
    pub fn check_matrix(&self, matrix: &[i32], m: usize, n: usize) -> Result<()> {
        self.check_shape(m, n)?;
        check_len("matrix", m * n, matrix.len())?;
        let (min, max) = self.kernel.weight_range();
        if let Some(&bad) = matrix.iter().find(|&&w| w < min || w > max) {
            return Err(XbarError::weight(self.mode(), bad, min, max));
        }
        Ok(())
    }

    /// Validates an input vector and result buffer against shape and input alphabet.
    pub fn check_vector(&self, result: &[i32], vector: &[i32], m: usize, n: usize) -> Result<()> {
        self.check_shape(m, n)?;
        check_len("result", m, result.len())?;
        check_len("vector", n, vector.len())?;
        let (min, max) = self.kernel.input_range();
        if let Some(&bad) = vector.iter().find(|&&v| v < min || v > max) {
            return Err(XbarError::input(self.mode(), bad, min, max));
        }
        Ok(())
    }

    /// Encodes `matrix` into the conductance arrays.
    ///
    /// # Arguments
    ///
    /// * `matrix` - Row-major `m` x `n` weights.
    /// * `m` - Rows, must match the configuration.
    /// * `n` - Columns, must match the configuration.
    pub fn digital_write(&mut self, matrix: &[i32], m: usize, n: usize) -> Result<()> {
        self.check_matrix(matrix, m, n)?;
        self.kernel.digital_write(&mut self.cells, matrix);
        Ok(())
    }

    /// Derives pristine analog currents from the conductance levels.
    pub fn analog_write(&mut self) {
        self.cells.analog_write();
    }

    /// Accumulates the exact matrix-vector product into `result`.
    pub fn digital_mvm(&mut self, result: &mut [i32], vector: &[i32], m: usize, n: usize) -> Result<()> {
        self.check_vector(result, vector, m, n)?;
        self.kernel.digital_mvm(&self.cells, result, vector);
        Ok(())
    }

    /// Accumulates the ADC-quantized matrix-vector product into `result`.
    pub fn analog_mvm(&mut self, result: &mut [i32], vector: &[i32], m: usize, n: usize) -> Result<()> {
        self.check_vector(result, vector, m, n)?;
        self.kernel
            .analog_mvm(&self.cells, self.adc.as_ref(), result, vector);
        Ok(())
    }

    /// Decodes the weight stored at `(m, n)`.
    pub fn weight_at(&self, m: usize, n: usize) -> i32 {
        self.kernel.weight_at(&self.cells, m, n)
    }

    /// Decodes the complete stored weight matrix.
    pub fn decoded_matrix(&self) -> Array2<i32> {
        Array2::from_shape_fn((self.m, self.n), |(m, n)| self.weight_at(m, n))
    }

    /// Polarities whose arrays hold physical cells.
    pub fn polarities(&self) -> &'static [Polarity] {
        if self.has_minus_array() {
            &[Polarity::Plus, Polarity::Minus]
        } else {
            &[Polarity::Plus]
        }
    }

    /// Degrades every set cell after `reads` crossbar-wide consecutive reads.
    pub fn rd_update_conductance(&mut self, rd: &ReadDisturb, reads: u64) {
        for &polarity in self.polarities() {
            let (rows, cols) = self.cells.gd(polarity).dim();
            for r in 0..rows {
                for c in 0..cols {
                    if self.cells.gd(polarity)[[r, c]] > 0 {
                        let cycles = rd.cycles(polarity)[[r, c]];
                        let scale = rd.calc_g0_scaling_factor(reads, cycles);
                        self.cells.degrade_cell(polarity, r, c, scale);
                    }
                }
            }
        }
    }

    /// Degrades every set cell by its own consecutive-read counter.
    pub fn rd_update_conductance_per_cell(&mut self, rd: &ReadDisturb) {
        for &polarity in self.polarities() {
            let (rows, cols) = self.cells.gd(polarity).dim();
            for r in 0..rows {
                for c in 0..cols {
                    if self.cells.gd(polarity)[[r, c]] > 0 {
                        let reads = rd.consecutive_reads(polarity)[[r, c]];
                        let cycles = rd.cycles(polarity)[[r, c]];
                        let scale = rd.calc_g0_scaling_factor(reads, cycles);
                        self.cells.degrade_cell(polarity, r, c, scale);
                    }
                }
            }
        }
    }

    /// Reprograms the set cells that lost more than `tolerance` of their conductance.
    ///
    /// # Returns
    ///
    /// The number of refreshed cells.
    pub fn rd_cell_based_refresh(&mut self, rd: &mut ReadDisturb, tolerance: f64) -> u64 {
        let threshold = 1.0 - tolerance;
        let mut refreshed = 0;
        for &polarity in self.polarities() {
            let (rows, cols) = self.cells.gd(polarity).dim();
            for r in 0..rows {
                for c in 0..cols {
                    if self.cells.gd(polarity)[[r, c]] == 0 {
                        continue;
                    }
                    let reads = rd.consecutive_reads(polarity)[[r, c]];
                    let cycles = rd.cycles(polarity)[[r, c]];
                    if rd.calc_g0_scaling_factor(reads, cycles) < threshold {
                        rd.refresh_cell(polarity, r, c);
                        self.cells.restore_cell(polarity, r, c);
                        refreshed += 1;
                    }
                }
            }
        }
        refreshed
    }

    /// Masks of the set cells, `gd_m` empty when the mode has no minus array.
    pub fn set_masks(&self) -> (Array2<bool>, Array2<bool>) {
        let plus = self.cells.set_mask(Polarity::Plus);
        let minus = if self.has_minus_array() {
            self.cells.set_mask(Polarity::Minus)
        } else {
            Array2::from_elem(plus.dim(), false)
        };
        (plus, minus)
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(XbarError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

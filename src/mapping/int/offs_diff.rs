use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::int::{bit_plane, convert_diff_plane, signed_range};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Offset inputs on differential weights.
///
/// Inputs are shifted into the unsigned range by adding `2^(I_BIT-1)`; the
/// surplus `2^(I_BIT-1) · Σ_n w(m, n)` is removed digitally from the row sums
/// of the stored weights.
pub struct OffsDiffKernel {
    w_bit: u32,
    i_bit: u32,
    shifted: Vec<u32>,
    plane: Vec<i32>,
}

impl OffsDiffKernel {
    pub fn new(config: &Config) -> Self {
        let n = config.xbar.n;
        Self {
            w_bit: config.w_bit(),
            i_bit: config.xbar.i_bit,
            shifted: vec![0; n],
            plane: vec![0; n],
        }
    }

    fn offset(&self) -> i32 {
        1 << (self.i_bit - 1)
    }

    fn shift_input(&mut self, vector: &[i32]) {
        let offset = self.offset();
        for (dst, &v) in self.shifted.iter_mut().zip(vector) {
            *dst = (v + offset) as u32;
        }
    }

    fn row_sum(&self, cells: &CellArrays, m: usize) -> i32 {
        (0..cells.cols()).map(|n| self.weight_at(cells, m, n)).sum()
    }
}

impl MappingKernel for OffsDiffKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::IOffsWDiff
    }

    fn weight_range(&self) -> (i32, i32) {
        signed_range(self.w_bit)
    }

    fn input_range(&self) -> (i32, i32) {
        signed_range(self.i_bit)
    }

    fn digital_write(&self, cells: &mut CellArrays, matrix: &[i32]) {
        cells.write_magnitude(matrix);
    }

    fn weight_at(&self, cells: &CellArrays, m: usize, n: usize) -> i32 {
        cells.sliced_value(Polarity::Plus, m, n) - cells.sliced_value(Polarity::Minus, m, n)
    }

    fn digital_mvm(&mut self, cells: &CellArrays, result: &mut [i32], vector: &[i32]) {
        self.shift_input(vector);
        for (dst, &v) in self.plane.iter_mut().zip(&self.shifted) {
            *dst = v as i32;
        }
        let offset = self.offset();
        for (m, out) in result.iter_mut().enumerate() {
            *out += cells.signed_dot(m, &self.plane) as i32 - offset * self.row_sum(cells, m);
        }
    }

    fn analog_mvm(
        &mut self,
        cells: &CellArrays,
        adc: &dyn Adc,
        result: &mut [i32],
        vector: &[i32],
    ) {
        self.shift_input(vector);
        for bit in 0..self.i_bit {
            bit_plane(&self.shifted, bit, &mut self.plane);
            convert_diff_plane(cells, adc, &self.plane, bit, 1, result);
        }
        let offset = self.offset();
        for (m, out) in result.iter_mut().enumerate() {
            *out -= offset * self.row_sum(cells, m);
        }
    }
}

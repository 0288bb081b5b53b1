use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::int::{bit_plane, convert_diff_plane, signed_range};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Two's complement inputs on differential weights.
///
/// Every input bit is applied as is; the plane of the sign bit carries the
/// weight `-2^(I_BIT-1)` and is subtracted.
pub struct TcDiffKernel {
    w_bit: u32,
    i_bit: u32,
    raw: Vec<u32>,
    plane: Vec<i32>,
}

impl TcDiffKernel {
    pub fn new(config: &Config) -> Self {
        let n = config.xbar.n;
        Self {
            w_bit: config.w_bit(),
            i_bit: config.xbar.i_bit,
            raw: vec![0; n],
            plane: vec![0; n],
        }
    }

    fn encode_input(&mut self, vector: &[i32]) {
        let mask = ((1u64 << self.i_bit) - 1) as u32;
        for (dst, &v) in self.raw.iter_mut().zip(vector) {
            *dst = (v as u32) & mask;
        }
    }
}

impl MappingKernel for TcDiffKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::ITcWDiff
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
        self.encode_input(vector);
        let sign_bit = self.i_bit - 1;
        let low_mask = (1u32 << sign_bit) - 1;

        for (dst, &v) in self.plane.iter_mut().zip(&self.raw) {
            *dst = (v & low_mask) as i32;
        }
        for (m, out) in result.iter_mut().enumerate() {
            *out += cells.signed_dot(m, &self.plane) as i32;
        }

        bit_plane(&self.raw, sign_bit, &mut self.plane);
        for (m, out) in result.iter_mut().enumerate() {
            *out -= (cells.signed_dot(m, &self.plane) << sign_bit) as i32;
        }
    }

    fn analog_mvm(
        &mut self,
        cells: &CellArrays,
        adc: &dyn Adc,
        result: &mut [i32],
        vector: &[i32],
    ) {
        self.encode_input(vector);
        for bit in 0..self.i_bit {
            bit_plane(&self.raw, bit, &mut self.plane);
            let sign = if bit == self.i_bit - 1 { -1 } else { 1 };
            convert_diff_plane(cells, adc, &self.plane, bit, sign, result);
        }
    }
}

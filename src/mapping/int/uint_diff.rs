use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::int::{bit_plane, convert_diff_plane, signed_range, unsigned_range};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Unsigned inputs on differential weights.
pub struct UintDiffKernel {
    w_bit: u32,
    i_bit: u32,
    raw: Vec<u32>,
    plane: Vec<i32>,
}

impl UintDiffKernel {
    pub fn new(config: &Config) -> Self {
        let n = config.xbar.n;
        Self {
            w_bit: config.w_bit(),
            i_bit: config.xbar.i_bit,
            raw: vec![0; n],
            plane: vec![0; n],
        }
    }
}

impl MappingKernel for UintDiffKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::IUintWDiff
    }

    fn weight_range(&self) -> (i32, i32) {
        signed_range(self.w_bit)
    }

    fn input_range(&self) -> (i32, i32) {
        unsigned_range(self.i_bit)
    }

    fn digital_write(&self, cells: &mut CellArrays, matrix: &[i32]) {
        cells.write_magnitude(matrix);
    }

    fn weight_at(&self, cells: &CellArrays, m: usize, n: usize) -> i32 {
        cells.sliced_value(Polarity::Plus, m, n) - cells.sliced_value(Polarity::Minus, m, n)
    }

    fn digital_mvm(&mut self, cells: &CellArrays, result: &mut [i32], vector: &[i32]) {
        for (m, out) in result.iter_mut().enumerate() {
            *out += cells.signed_dot(m, vector) as i32;
        }
    }

    fn analog_mvm(
        &mut self,
        cells: &CellArrays,
        adc: &dyn Adc,
        result: &mut [i32],
        vector: &[i32],
    ) {
        for (dst, &v) in self.raw.iter_mut().zip(vector) {
            *dst = v as u32;
        }
        for bit in 0..self.i_bit {
            bit_plane(&self.raw, bit, &mut self.plane);
            convert_diff_plane(cells, adc, &self.plane, bit, 1, result);
        }
    }
}

use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::tnn::{convert_code_planes, selectors, TERNARY_RANGE};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

const SLICE_SIGNS: [f32; 2] = [1.0, 1.0];

/// Ternary weights as the two-bit offset code `w + 1` in `gd_p`.
///
/// The code overstates every product by `v`, so `Σ v` is subtracted after the
/// analog bias correction.
pub struct TnnOffsKernel {
    sel_p: Vec<i32>,
    sel_m: Vec<i32>,
}

impl TnnOffsKernel {
    pub fn new(config: &Config) -> Self {
        let n = config.xbar.n;
        Self {
            sel_p: vec![0; n],
            sel_m: vec![0; n],
        }
    }
}

impl MappingKernel for TnnOffsKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::TnnIDiffWOffs
    }

    fn has_minus_array(&self) -> bool {
        false
    }

    fn weight_range(&self) -> (i32, i32) {
        TERNARY_RANGE
    }

    fn input_range(&self) -> (i32, i32) {
        TERNARY_RANGE
    }

    fn digital_write(&self, cells: &mut CellArrays, matrix: &[i32]) {
        cells.write_code(matrix, |w| (w + 1) as u32);
    }

    fn weight_at(&self, cells: &CellArrays, m: usize, n: usize) -> i32 {
        cells.sliced_value(Polarity::Plus, m, n) - 1
    }

    fn digital_mvm(&mut self, cells: &CellArrays, result: &mut [i32], vector: &[i32]) {
        let input_sum: i64 = vector.iter().map(|&v| v as i64).sum();
        for (m, out) in result.iter_mut().enumerate() {
            *out += (cells.plus_dot(m, vector) - input_sum) as i32;
        }
    }

    fn analog_mvm(
        &mut self,
        cells: &CellArrays,
        adc: &dyn Adc,
        result: &mut [i32],
        vector: &[i32],
    ) {
        selectors(vector, &mut self.sel_p, &mut self.sel_m);
        convert_code_planes(cells, adc, &self.sel_p, &self.sel_m, &SLICE_SIGNS, result);
        let input_sum: i32 = vector.iter().sum();
        for out in result.iter_mut() {
            *out -= input_sum;
        }
    }
}

use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::tnn::{convert_code_planes, selectors, TERNARY_RANGE};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Slice 0 holds the sign bit of the two-bit code.
const SLICE_SIGNS: [f32; 2] = [-1.0, 1.0];

/// Ternary weights as a two-bit two's complement code in `gd_p`.
///
/// `-1` is stored as `0b11`, `0` as `0b00` and `+1` as `0b01`.
pub struct TnnTcKernel {
    sel_p: Vec<i32>,
    sel_m: Vec<i32>,
}

impl TnnTcKernel {
    pub fn new(config: &Config) -> Self {
        let n = config.xbar.n;
        Self {
            sel_p: vec![0; n],
            sel_m: vec![0; n],
        }
    }
}

impl MappingKernel for TnnTcKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::TnnIDiffWTc
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
        cells.write_code(matrix, |w| (w as u32) & 0b11);
    }

    fn weight_at(&self, cells: &CellArrays, m: usize, n: usize) -> i32 {
        let gd = cells.gd(Polarity::Plus);
        -2 * gd[[cells.row(m, 0), n]] + gd[[cells.row(m, 1), n]]
    }

    fn digital_mvm(&mut self, cells: &CellArrays, result: &mut [i32], vector: &[i32]) {
        for (m, out) in result.iter_mut().enumerate() {
            *out += vector
                .iter()
                .enumerate()
                .map(|(n, &v)| self.weight_at(cells, m, n) * v)
                .sum::<i32>();
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
    }
}

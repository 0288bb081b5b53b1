use crate::adc::Adc;
use crate::config::MappingMode;
use crate::mapping::int::convert_diff_plane;
use crate::mapping::tnn::TERNARY_RANGE;
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Ternary weights as a differential pair: `+1` sets `gd_p`, `-1` sets `gd_m`.
///
/// Since `v⁺ - v⁻ = v`, the input drives the pair directly and a single
/// conversion per row yields `Σ w · v` in units of `LRS - HRS`.
#[derive(Debug, Default)]
pub struct TnnDiffKernel;

impl MappingKernel for TnnDiffKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::TnnIDiffWDiff
    }

    fn weight_range(&self) -> (i32, i32) {
        TERNARY_RANGE
    }

    fn input_range(&self) -> (i32, i32) {
        TERNARY_RANGE
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
        convert_diff_plane(cells, adc, vector, 0, 1, result);
    }
}

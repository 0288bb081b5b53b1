use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::int::{bit_plane, convert_diff_plane, signed_range};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Differential inputs on differential weights.
///
/// A signed input is split into a positive magnitude `v⁺` and a negative
/// magnitude `v⁻`. With a single crossbar both planes of every bit are
/// converted one after the other and subtracted in the digital domain. The
/// two-crossbar variant drives both planes at once against a second array
/// holding the swapped conductance pair, so a single conversion per bit sees
/// `Σ (ia_p - ia_m)(b⁺ - b⁻)`.
pub struct DiffKernel {
    two_xbar: bool,
    w_bit: u32,
    i_bit: u32,
    mag_p: Vec<u32>,
    mag_m: Vec<u32>,
    plane_p: Vec<i32>,
    plane_m: Vec<i32>,
    part: Vec<i32>,
}

impl DiffKernel {
    /// Creates a new DiffKernel.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulator configuration.
    /// * `two_xbar` - Use the two-crossbar layout (`I_DIFF_W_DIFF_2XB`).
    pub fn new(config: &Config, two_xbar: bool) -> Self {
        let n = config.xbar.n;
        Self {
            two_xbar,
            w_bit: config.w_bit(),
            i_bit: config.xbar.i_bit,
            mag_p: vec![0; n],
            mag_m: vec![0; n],
            plane_p: vec![0; n],
            plane_m: vec![0; n],
            part: vec![0; n],
        }
    }

    fn split_input(&mut self, vector: &[i32]) {
        for (n, &v) in vector.iter().enumerate() {
            self.mag_p[n] = v.max(0) as u32;
            self.mag_m[n] = (-v).max(0) as u32;
        }
    }
}

impl MappingKernel for DiffKernel {
    fn mode(&self) -> MappingMode {
        if self.two_xbar {
            MappingMode::IDiffWDiff2xb
        } else {
            MappingMode::IDiffWDiff1xb
        }
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
        self.split_input(vector);
        for (dst, &v) in self.part.iter_mut().zip(&self.mag_p) {
            *dst = v as i32;
        }
        for (m, out) in result.iter_mut().enumerate() {
            *out += cells.signed_dot(m, &self.part) as i32;
        }
        for (dst, &v) in self.part.iter_mut().zip(&self.mag_m) {
            *dst = v as i32;
        }
        for (m, out) in result.iter_mut().enumerate() {
            *out -= cells.signed_dot(m, &self.part) as i32;
        }
    }

    fn analog_mvm(
        &mut self,
        cells: &CellArrays,
        adc: &dyn Adc,
        result: &mut [i32],
        vector: &[i32],
    ) {
        self.split_input(vector);
        for bit in 0..self.i_bit {
            bit_plane(&self.mag_p, bit, &mut self.plane_p);
            bit_plane(&self.mag_m, bit, &mut self.plane_m);
            if self.two_xbar {
                for (p, &q) in self.plane_p.iter_mut().zip(&self.plane_m) {
                    *p -= q;
                }
                convert_diff_plane(cells, adc, &self.plane_p, bit, 1, result);
            } else {
                convert_diff_plane(cells, adc, &self.plane_p, bit, 1, result);
                convert_diff_plane(cells, adc, &self.plane_m, bit, -1, result);
            }
        }
    }
}

use crate::adc::Adc;
use crate::config::{Config, MappingMode};
use crate::mapping::int::{bit_plane, signed_range, unsigned_range};
use crate::mapping::{CellArrays, MappingKernel, Polarity};

/// Unsigned inputs on offset weights in a single array.
///
/// A weight `w` is stored as `w + 2^(W-1)` in `gd_p`. Every driven cell adds
/// at least HRS to the column current, so `HRS · popcount(plane)` is removed
/// before rescaling; the weight offset is removed digitally as
/// `2^(W-1) · Σ_n v(n)`.
pub struct UintOffsKernel {
    w_bit: u32,
    i_bit: u32,
    raw: Vec<u32>,
    plane: Vec<i32>,
}

impl UintOffsKernel {
    pub fn new(config: &Config) -> Self {
        let n = config.xbar.n;
        Self {
            w_bit: config.w_bit(),
            i_bit: config.xbar.i_bit,
            raw: vec![0; n],
            plane: vec![0; n],
        }
    }

    fn offset(&self) -> i32 {
        1 << (self.w_bit - 1)
    }
}

impl MappingKernel for UintOffsKernel {
    fn mode(&self) -> MappingMode {
        MappingMode::IUintWOffs
    }

    fn has_minus_array(&self) -> bool {
        false
    }

    fn weight_range(&self) -> (i32, i32) {
        signed_range(self.w_bit)
    }

    fn input_range(&self) -> (i32, i32) {
        unsigned_range(self.i_bit)
    }

    fn digital_write(&self, cells: &mut CellArrays, matrix: &[i32]) {
        let offset = self.offset();
        cells.write_code(matrix, |w| (w + offset) as u32);
    }

    fn weight_at(&self, cells: &CellArrays, m: usize, n: usize) -> i32 {
        cells.sliced_value(Polarity::Plus, m, n) - self.offset()
    }

    fn digital_mvm(&mut self, cells: &CellArrays, result: &mut [i32], vector: &[i32]) {
        let correction = self.offset() as i64 * vector.iter().map(|&v| v as i64).sum::<i64>();
        for (m, out) in result.iter_mut().enumerate() {
            *out += (cells.plus_dot(m, vector) - correction) as i32;
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
        let ia_p = cells.ia_p();
        let hrs = cells.hrs();

        for bit in 0..self.i_bit {
            bit_plane(&self.raw, bit, &mut self.plane);
            let driven = self.plane.iter().sum::<i32>();
            for (m, out) in result.iter_mut().enumerate() {
                for s in 0..cells.slices() {
                    let r = cells.row(m, s);
                    let mut current = 0.0f32;
                    for (n, &x) in self.plane.iter().enumerate() {
                        current += ia_p[[r, n]] * x as f32;
                    }
                    let current = adc.convert(current) - hrs * driven as f32;
                    let scale = (1u64 << (cells.shift(s) + bit)) as f32;
                    *out += (current / cells.i_step(s) * scale).round() as i32;
                }
            }
        }

        let correction = self.offset() * vector.iter().sum::<i32>();
        for out in result.iter_mut() {
            *out -= correction;
        }
    }
}

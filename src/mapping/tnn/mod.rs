//! Ternary Mapping Kernels.
//!
//! Weights and inputs of a ternary network take values in `{-1, 0, +1}`. An
//! input drives two selector vectors: `v⁺` marks the `+1` entries and `v⁻`
//! the `-1` entries.
//!
//! The two-bit encodings keep the whole code in `gd_p` and read both slices
//! with both selectors. Since every driven cell conducts at least HRS, the
//! rescaled sum carries a bias of `Σ_s sign_s 2^shift_s · Σv · HRS / (LRS - HRS)`
//! that is removed before rounding.

/// Differential ternary weights.
pub mod diff;
/// Offset-coded ternary weights.
pub mod offs;
/// Two's complement ternary weights.
pub mod tc;

pub use diff::TnnDiffKernel;
pub use offs::TnnOffsKernel;
pub use tc::TnnTcKernel;

use crate::adc::Adc;
use crate::mapping::CellArrays;

pub(crate) const TERNARY_RANGE: (i32, i32) = (-1, 1);

/// Splits a ternary input into the `v⁺` and `v⁻` selectors.
pub(crate) fn selectors(vector: &[i32], sel_p: &mut [i32], sel_m: &mut [i32]) {
    for (n, &v) in vector.iter().enumerate() {
        sel_p[n] = (v == 1) as i32;
        sel_m[n] = (v == -1) as i32;
    }
}

/// Reads a two-slice code in `gd_p` with both selectors.
///
/// Four conversions per row: each slice is read once with `v⁺` and once
/// with `v⁻`. The slice with a negative `slice_signs` entry contributes with
/// the opposite sign. The rescaled sum is bias-corrected and rounded once.
pub(crate) fn convert_code_planes(
    cells: &CellArrays,
    adc: &dyn Adc,
    sel_p: &[i32],
    sel_m: &[i32],
    slice_signs: &[f32],
    result: &mut [i32],
) {
    let ia_p = cells.ia_p();
    let input_sum: i32 = sel_p.iter().zip(sel_m).map(|(p, m)| p - m).sum();
    let bias_weight: f32 = slice_signs
        .iter()
        .enumerate()
        .map(|(s, sign)| sign * (1u32 << cells.shift(s)) as f32)
        .sum();

    for (m, out) in result.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (s, &slice_sign) in slice_signs.iter().enumerate() {
            let r = cells.row(m, s);
            let scale = (1u32 << cells.shift(s)) as f32 / cells.i_step(s);
            for (selector, plane_sign) in [(sel_p, 1.0f32), (sel_m, -1.0f32)] {
                let mut current = 0.0f32;
                for (n, &x) in selector.iter().enumerate() {
                    current += ia_p[[r, n]] * x as f32;
                }
                acc += slice_sign * plane_sign * adc.convert(current) * scale;
            }
        }
        let correction = bias_weight * input_sum as f32 * cells.hrs() / cells.i_step(0);
        *out += (acc - correction).round() as i32;
    }
}

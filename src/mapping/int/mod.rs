//! Integer Mapping Kernels.
//!
//! Kernels for signed `W`-bit weights and `I_BIT`-bit inputs. Inputs are fed
//! bit-serially: each bit plane is applied to the word lines, every slice row
//! is converted by the ADC, and the converted current is rescaled by the slice
//! step size and `2^(shift + bit)` before it is rounded into the result.

/// Differential weights with differential inputs (one or two crossbars).
pub mod diff;
/// Differential weights with offset inputs.
pub mod offs_diff;
/// Differential weights with two's complement inputs.
pub mod tc_diff;
/// Differential weights with unsigned inputs.
pub mod uint_diff;
/// Offset weights with unsigned inputs.
pub mod uint_offs;

pub use diff::DiffKernel;
pub use offs_diff::OffsDiffKernel;
pub use tc_diff::TcDiffKernel;
pub use uint_diff::UintDiffKernel;
pub use uint_offs::UintOffsKernel;

use crate::adc::Adc;
use crate::mapping::CellArrays;

/// Legal range of a signed `bits`-wide value.
pub(crate) fn signed_range(bits: u32) -> (i32, i32) {
    let half = 1i32 << (bits - 1);
    (-half, half - 1)
}

/// Legal range of an unsigned `bits`-wide value.
pub(crate) fn unsigned_range(bits: u32) -> (i32, i32) {
    (0, ((1u64 << bits) - 1) as i32)
}

/// Extracts bit `bit` of every entry into `plane`.
pub(crate) fn bit_plane(values: &[u32], bit: u32, plane: &mut [i32]) {
    for (dst, &v) in plane.iter_mut().zip(values) {
        *dst = ((v >> bit) & 1) as i32;
    }
}

/// Converts one input plane against the differential pair.
///
/// For every logical row and slice the column current
/// `Σ_n (ia_p - ia_m)(r, n) · plane(n)` goes through the ADC and the rescaled,
/// rounded value is added to (`sign = 1`) or subtracted from (`sign = -1`)
/// the result.
pub(crate) fn convert_diff_plane(
    cells: &CellArrays,
    adc: &dyn Adc,
    plane: &[i32],
    bit: u32,
    sign: i32,
    result: &mut [i32],
) {
    let ia_p = cells.ia_p();
    let ia_m = cells.ia_m();
    for (m, out) in result.iter_mut().enumerate() {
        for s in 0..cells.slices() {
            let r = cells.row(m, s);
            let mut current = 0.0f32;
            for (n, &x) in plane.iter().enumerate() {
                current += (ia_p[[r, n]] - ia_m[[r, n]]) * x as f32;
            }
            let scale = (1u64 << (cells.shift(s) + bit)) as f32;
            let value = (adc.convert(current) / cells.i_step(s) * scale).round() as i32;
            *out += sign * value;
        }
    }
}

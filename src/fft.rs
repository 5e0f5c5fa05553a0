//! In-place fixed-point complex FFT.
//!
//! A Stockham auto-sort radix-2 transform over Q31 twiddles. Every butterfly
//! stage halves its outputs (rounded to nearest), so a length-`m` transform
//! returns `DFT(x) / m` in the scale of its input and never grows past the
//! input's peak magnitude. Intermediate sums are formed in 64 bits and
//! saturated back to 32.

use crate::error::{check_len, StftError};
use crate::fixed::{shift_right, Rounding};
use crate::num::ComplexI32;

/// Direction of a complex transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `e^{-2πi·jk/m}` kernel.
    Forward,
    /// `e^{+2πi·jk/m}` kernel.
    Inverse,
}

#[inline(always)]
fn halve(a: i64, b: i64) -> i32 {
    crate::fixed::saturate(shift_right(a + b, 1, Rounding::Nearest))
}

/// Scaled complex FFT of `data` using `scratch` as the ping-pong buffer.
///
/// `twiddles[k]` must hold `e^{-2πi·k/(2m)}` in Q31 for `k < m`, where
/// `m = data.len()`; this is the table a length-`2m` real transform keeps, so
/// the complex stage reads every second entry. The result is `DFT(data) / m`
/// (or the unnormalised inverse DFT divided by `m` for
/// [`Direction::Inverse`]), written back into `data`.
pub fn fft_q31_inplace(
    data: &mut [ComplexI32],
    scratch: &mut [ComplexI32],
    twiddles: &[ComplexI32],
    direction: Direction,
) -> Result<(), StftError> {
    let m = data.len();
    if m == 0 {
        return Err(StftError::MismatchedLengths {
            expected: 1,
            actual: 0,
        });
    }
    if !m.is_power_of_two() {
        return Err(StftError::UnsupportedSize(m));
    }
    if m == 1 {
        return Ok(());
    }
    if scratch.len() < m {
        return Err(StftError::MismatchedLengths {
            expected: m,
            actual: scratch.len(),
        });
    }
    check_len(m, twiddles.len())?;

    let data_ptr = data.as_ptr();
    let mut src: &mut [ComplexI32] = data;
    let mut dst: &mut [ComplexI32] = &mut scratch[..m];

    // n1 = number of groups, n2 = size of each group in this pass.
    let mut n1 = 1usize;
    let mut n2 = m;
    while n1 < m {
        n2 >>= 1;
        for k in 0..n1 {
            // exp(-2πi * k / (2*n1)) = table[2 * k * n2]
            let w = match direction {
                Direction::Forward => twiddles[2 * k * n2],
                Direction::Inverse => twiddles[2 * k * n2].conj(),
            };
            let base0 = 2 * k * n2;
            let base1 = base0 + n2;
            let out0 = k * n2;
            let out1 = (k + n1) * n2;
            for j in 0..n2 {
                let u = src[base0 + j];
                let (v_re, v_im) = src[base1 + j].mul_q31(w);
                let (u_re, u_im) = (u.re as i64, u.im as i64);
                dst[out0 + j] = ComplexI32::new(halve(u_re, v_re), halve(u_im, v_im));
                dst[out1 + j] = ComplexI32::new(halve(u_re, -v_re), halve(u_im, -v_im));
            }
        }
        core::mem::swap(&mut src, &mut dst);
        n1 <<= 1;
    }

    // After an odd number of passes the result sits in scratch.
    if src.as_ptr() != data_ptr {
        dst.copy_from_slice(src);
    }
    Ok(())
}

//! Fixed-point complex numbers used by the transform and the spectrum.

use crate::fixed::{saturate, shift_right, to_q31, Rounding};

/// Complex value with 32-bit real and imaginary parts at a shared Q scale.
///
/// `#[repr(C)]` keeps a slice of bins laid out as interleaved `re, im` pairs,
/// which is the packing exchanged with the feature/NN stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComplexI32 {
    pub re: i32,
    pub im: i32,
}

impl ComplexI32 {
    pub const ZERO: Self = Self { re: 0, im: 0 };

    #[inline]
    pub const fn new(re: i32, im: i32) -> Self {
        Self { re, im }
    }

    #[inline]
    pub const fn conj(self) -> Self {
        Self {
            re: self.re,
            im: self.im.wrapping_neg(),
        }
    }

    /// Unit phasor `e^{i·theta}` with Q31 components.
    ///
    /// Components are kept within `±i32::MAX` so `conj` is exact.
    pub fn from_angle(theta: f64) -> Self {
        let q31 = |x: f64| to_q31(x).max(-i32::MAX);
        Self::new(q31(libm::cos(theta)), q31(libm::sin(theta)))
    }

    /// Product with a Q31 twiddle, rounded back to the scale of `self`.
    ///
    /// Returned widened so callers can combine it with other terms before
    /// saturating. `w` has unit magnitude, so each widened component stays
    /// below `2^63`.
    #[inline]
    pub fn mul_q31(self, w: ComplexI32) -> (i64, i64) {
        let (a, b) = (self.re as i64, self.im as i64);
        let (c, d) = (w.re as i64, w.im as i64);
        (
            shift_right(a * c - b * d, 31, Rounding::Nearest),
            shift_right(a * d + b * c, 31, Rounding::Nearest),
        )
    }

    /// Build from 64-bit parts, saturating each to `i32`.
    #[inline]
    pub fn saturating_from(re: i64, im: i64) -> Self {
        Self::new(saturate(re), saturate(im))
    }

    /// `re² + im²` without overflow.
    #[inline]
    pub fn norm_sqr(self) -> u64 {
        let re = self.re.unsigned_abs() as u64;
        let im = self.im.unsigned_abs() as u64;
        re * re + im * im
    }
}

/// View a slice of bins as interleaved `re, im` words.
pub fn as_interleaved(bins: &[ComplexI32]) -> &[i32] {
    // SAFETY: `ComplexI32` is `repr(C)` with two `i32` fields, so it has the
    // size and alignment of `[i32; 2]` and no padding.
    unsafe { core::slice::from_raw_parts(bins.as_ptr() as *const i32, bins.len() * 2) }
}

/// Mutable interleaved view of a slice of bins.
pub fn as_interleaved_mut(bins: &mut [ComplexI32]) -> &mut [i32] {
    // SAFETY: see `as_interleaved`; the borrow is exclusive.
    unsafe { core::slice::from_raw_parts_mut(bins.as_mut_ptr() as *mut i32, bins.len() * 2) }
}

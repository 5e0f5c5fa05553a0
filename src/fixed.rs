//! Q-format primitives: explicit scales, rounding shifts and saturation.
//!
//! Every integer buffer in this crate carries an implicit number of fractional
//! bits. [`Q`] makes that number a value so it can be passed around and checked,
//! and [`rescale`] is the single place where a value moves between scales.

use crate::error::StftError;

/// Number of fractional bits attached to a fixed-point value.
///
/// `Q::new(15)` describes values scaled by `2^15`, i.e. Q15 audio samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Q(u8);

impl Q {
    /// Largest supported number of fractional bits.
    pub const MAX_BITS: u32 = 62;

    pub const Q15: Q = Q(15);
    pub const Q20: Q = Q(20);
    pub const Q21: Q = Q(21);
    pub const Q30: Q = Q(30);
    pub const Q31: Q = Q(31);

    /// Build a format with `bits` fractional bits.
    pub const fn new(bits: u32) -> Result<Self, StftError> {
        if bits > Self::MAX_BITS {
            return Err(StftError::InvalidQFormat(bits));
        }
        Ok(Q(bits as u8))
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0 as u32
    }

    /// Format obtained by dropping `shift` fractional bits, if any remain.
    pub const fn checked_sub(self, shift: u32) -> Option<Q> {
        if shift > self.0 as u32 {
            None
        } else {
            Some(Q(self.0 - shift as u8))
        }
    }
}

impl core::fmt::Display for Q {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// How bits shifted out of a value are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Arithmetic shift, rounds toward negative infinity.
    Truncate,
    /// Round to nearest, ties toward positive infinity.
    #[default]
    Nearest,
}

/// Arithmetic right shift of `value` by `shift` bits under `rounding`.
///
/// Shifts of 64 bits or more behave like a shift of 63.
#[inline]
pub fn shift_right(value: i64, shift: u32, rounding: Rounding) -> i64 {
    if shift == 0 {
        return value;
    }
    let shift = shift.min(63);
    match rounding {
        Rounding::Truncate => value >> shift,
        // (v + 2^(s-1)) >> s, written so the addition cannot overflow.
        Rounding::Nearest => (value >> shift) + ((value >> (shift - 1)) & 1),
    }
}

/// Clamp a 64-bit intermediate into the `i32` range.
#[inline]
pub fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Clamp a 32-bit accumulator value into the Q15 sample range.
#[inline]
pub fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// `a + b`, clamped to `[i32::MIN, i32::MAX]` instead of wrapping.
#[inline]
pub fn saturating_add(a: i32, b: i32) -> i32 {
    a.saturating_add(b)
}

/// Add a 64-bit term to a 32-bit accumulator, saturating the sum.
#[inline]
pub fn saturating_add_wide(acc: i32, term: i64) -> i32 {
    saturate((acc as i64).saturating_add(term))
}

/// Move `value` from scale `from` to scale `to`, saturating to `i32`.
///
/// Narrowing (`to < from`) shifts right under `rounding`; widening shifts
/// left and clamps on overflow.
#[inline]
pub fn rescale(value: i64, from: Q, to: Q, rounding: Rounding) -> i32 {
    if to.bits() <= from.bits() {
        saturate(shift_right(value, from.bits() - to.bits(), rounding))
    } else {
        let widened = (value as i128) << (to.bits() - from.bits());
        widened.clamp(i32::MIN as i128, i32::MAX as i128) as i32
    }
}

/// Convert a real number in `[-1, 1)` to Q15, rounding and saturating.
pub fn to_q15(x: f32) -> i16 {
    let scaled = libm::roundf(x * 32768.0);
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Convert a real number to Q31, rounding and saturating.
pub fn to_q31(x: f64) -> i32 {
    let scaled = libm::round(x * 2147483648.0);
    scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

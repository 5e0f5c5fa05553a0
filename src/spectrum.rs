//! One frame of STFT bins and the operations the feature/NN stage applies to
//! it: rescaling, per-bin gains and the power spectrum.

use alloc::{vec, vec::Vec};

use crate::error::{check_len, StftError};
use crate::fixed::{rescale, saturate, shift_right, Rounding, Q};
use crate::num::{as_interleaved, as_interleaved_mut, ComplexI32};

/// `fft_size / 2 + 1` complex bins sharing one Q format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spectrum {
    bins: Vec<ComplexI32>,
    q: Q,
}

impl Spectrum {
    /// `len` zero bins at scale `q`.
    pub fn zeroed(len: usize, q: Q) -> Self {
        Self {
            bins: vec![ComplexI32::ZERO; len],
            q,
        }
    }

    /// Wrap existing bins whose scale is `q`.
    pub fn from_bins(bins: Vec<ComplexI32>, q: Q) -> Self {
        Self { bins, q }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Scale of every bin.
    #[inline]
    pub fn q(&self) -> Q {
        self.q
    }

    #[inline]
    pub fn bins(&self) -> &[ComplexI32] {
        &self.bins
    }

    /// Mutable bins. Values written here are read at [`Spectrum::q`].
    #[inline]
    pub fn bins_mut(&mut self) -> &mut [ComplexI32] {
        &mut self.bins
    }

    /// Bins as interleaved `re, im` words, the layout the NN stage consumes.
    pub fn as_interleaved(&self) -> &[i32] {
        as_interleaved(&self.bins)
    }

    pub fn as_interleaved_mut(&mut self) -> &mut [i32] {
        as_interleaved_mut(&mut self.bins)
    }

    /// Relabel the bins as scale `q` without touching their values.
    pub(crate) fn set_q(&mut self, q: Q) {
        self.q = q;
    }

    /// Convert every bin to scale `q`, saturating.
    pub fn rescale_to(&mut self, q: Q, rounding: Rounding) {
        if q == self.q {
            return;
        }
        let from = self.q;
        for v in as_interleaved_mut(&mut self.bins) {
            *v = rescale(*v as i64, from, q, rounding);
        }
        self.q = q;
    }

    /// Multiply each bin by a Q15 gain (a time-frequency mask), keeping the
    /// spectrum's scale.
    pub fn apply_gain_q15(&mut self, gains: &[i16], rounding: Rounding) -> Result<(), StftError> {
        check_len(self.bins.len(), gains.len())?;
        for (bin, &g) in self.bins.iter_mut().zip(gains) {
            let g = g as i64;
            bin.re = saturate(shift_right(bin.re as i64 * g, 15, rounding));
            bin.im = saturate(shift_right(bin.im as i64 * g, 15, rounding));
        }
        Ok(())
    }

    /// Power spectrum of this frame at scale `output_q`; see [`power_spectrum`].
    pub fn power_into(&self, output_q: Q, out: &mut [i32]) -> Result<(), StftError> {
        power_spectrum(&self.bins, self.q, output_q, out)
    }
}

/// `re² + im²` of every bin, moved from scale `2·input_q` to `output_q` and
/// saturated to `[0, i32::MAX]`.
///
/// ```
/// use qstft::{spectrum::power_spectrum, ComplexI32, Q};
///
/// // 0.5 + 0.5i in Q15 has power 0.5
/// let bins = [ComplexI32::new(16384, 16384)];
/// let mut out = [0i32; 1];
/// power_spectrum(&bins, Q::Q15, Q::Q15, &mut out).unwrap();
/// assert_eq!(out, [16384]);
/// ```
pub fn power_spectrum(
    bins: &[ComplexI32],
    input_q: Q,
    output_q: Q,
    out: &mut [i32],
) -> Result<(), StftError> {
    check_len(bins.len(), out.len())?;
    let from = 2 * input_q.bits();
    let to = output_q.bits();
    for (o, bin) in out.iter_mut().zip(bins) {
        let p = bin.norm_sqr();
        let scaled = if to <= from {
            shift_right_u64(p, from - to)
        } else {
            (p as u128) << (to - from)
        };
        *o = scaled.min(i32::MAX as u128) as i32;
    }
    Ok(())
}

/// Round-to-nearest right shift of a non-negative power value.
#[inline]
fn shift_right_u64(value: u64, shift: u32) -> u128 {
    match shift {
        0 => value as u128,
        s if s > 64 => 0,
        s => (value as u128 >> s) + ((value as u128 >> (s - 1)) & 1),
    }
}

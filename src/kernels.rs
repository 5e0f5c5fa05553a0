//! Windowing kernels used by the analyzer and synthesizer.
//!
//! The per-sample work of an STFT frame is three loops: multiply the sample
//! history by the window, multiply an inverse-FFT frame by the window and add
//! it into the overlap-add accumulator, and clamp accumulator values to Q15.
//! [`WindowKernels`] names those loops; [`ScalarKernels`] is the reference
//! implementation and [`SimdBackend`] dispatches to a vectorized version for
//! the running CPU. Every backend produces bit-identical results.

use crate::fixed::{saturate_i16, saturating_add_wide, shift_right, Rounding};

#[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
use core::arch::x86_64::*;

#[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
use core::arch::aarch64::*;

/// Vectorizable inner loops of the STFT.
///
/// All slices passed to one call must have the same length.
pub trait WindowKernels {
    /// `out[i] = samples[i] * window[i]`, a Q15×Q15 → Q30 product.
    fn window_q30(&self, samples: &[i16], window: &[i16], out: &mut [i32]);

    /// `acc[i] = sat32(acc[i] + ((window[i] * frame[i]) >> shift))`.
    ///
    /// The product is formed in 64 bits and shifted under `rounding` before the
    /// saturating add. `shift` must be at most 62.
    fn window_accumulate(
        &self,
        window: &[i16],
        frame: &[i32],
        shift: u32,
        rounding: Rounding,
        acc: &mut [i32],
    );

    /// `out[i] = clamp(input[i], i16::MIN, i16::MAX)`.
    fn saturate_i16(&self, input: &[i32], out: &mut [i16]);
}

/// Portable reference kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalarKernels;

impl WindowKernels for ScalarKernels {
    fn window_q30(&self, samples: &[i16], window: &[i16], out: &mut [i32]) {
        debug_assert_eq!(samples.len(), window.len());
        debug_assert_eq!(samples.len(), out.len());
        for ((o, &s), &w) in out.iter_mut().zip(samples).zip(window) {
            *o = s as i32 * w as i32;
        }
    }

    fn window_accumulate(
        &self,
        window: &[i16],
        frame: &[i32],
        shift: u32,
        rounding: Rounding,
        acc: &mut [i32],
    ) {
        debug_assert_eq!(window.len(), frame.len());
        debug_assert_eq!(window.len(), acc.len());
        for ((a, &w), &x) in acc.iter_mut().zip(window).zip(frame) {
            let term = shift_right(w as i64 * x as i64, shift, rounding);
            *a = saturating_add_wide(*a, term);
        }
    }

    fn saturate_i16(&self, input: &[i32], out: &mut [i16]) {
        debug_assert_eq!(input.len(), out.len());
        for (o, &x) in out.iter_mut().zip(input) {
            *o = saturate_i16(x);
        }
    }
}

/// Kernel backends, selected at runtime based on CPU features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdBackend {
    /// Scalar fallback, works on all platforms.
    Scalar,
    /// x86_64 AVX2 windowing with SSE2 saturation.
    #[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
    Avx2,
    /// aarch64 NEON for all three kernels.
    #[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
    Neon,
}

impl Default for SimdBackend {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
#[inline]
fn avx2_available() -> bool {
    #[cfg(feature = "std")]
    {
        std::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(feature = "std"))]
    {
        cfg!(target_feature = "avx2")
    }
}

impl SimdBackend {
    /// Best backend supported by the running CPU.
    pub fn detect() -> Self {
        #[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
        {
            Self::Neon
        }
        #[cfg(not(all(target_arch = "aarch64", feature = "aarch64")))]
        {
            #[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
            {
                if avx2_available() {
                    return Self::Avx2;
                }
            }
            Self::Scalar
        }
    }

    /// Returns the name of this backend.
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            #[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
            Self::Avx2 => "avx2",
            #[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
            Self::Neon => "neon",
        }
    }
}

impl WindowKernels for SimdBackend {
    fn window_q30(&self, samples: &[i16], window: &[i16], out: &mut [i32]) {
        debug_assert_eq!(samples.len(), window.len());
        debug_assert_eq!(samples.len(), out.len());
        match self {
            Self::Scalar => ScalarKernels.window_q30(samples, window, out),
            #[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
            Self::Avx2 => {
                if avx2_available() {
                    // SAFETY: AVX2 support was confirmed just above.
                    unsafe { x86::window_q30_avx2(samples, window, out) }
                } else {
                    ScalarKernels.window_q30(samples, window, out)
                }
            }
            #[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
            // SAFETY: NEON is always available on aarch64.
            Self::Neon => unsafe { neon::window_q30(samples, window, out) },
        }
    }

    fn window_accumulate(
        &self,
        window: &[i16],
        frame: &[i32],
        shift: u32,
        rounding: Rounding,
        acc: &mut [i32],
    ) {
        match self {
            // AVX2 has no 64-bit arithmetic right shift, so x86 stays scalar here.
            Self::Scalar => ScalarKernels.window_accumulate(window, frame, shift, rounding, acc),
            #[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
            Self::Avx2 => ScalarKernels.window_accumulate(window, frame, shift, rounding, acc),
            #[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
            // SAFETY: NEON is always available on aarch64.
            Self::Neon => unsafe { neon::window_accumulate(window, frame, shift, rounding, acc) },
        }
    }

    fn saturate_i16(&self, input: &[i32], out: &mut [i16]) {
        debug_assert_eq!(input.len(), out.len());
        match self {
            Self::Scalar => ScalarKernels.saturate_i16(input, out),
            #[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
            // SAFETY: SSE2 is part of the x86_64 baseline.
            Self::Avx2 => unsafe { x86::saturate_i16_sse2(input, out) },
            #[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
            // SAFETY: NEON is always available on aarch64.
            Self::Neon => unsafe { neon::saturate_i16(input, out) },
        }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "x86_64"))]
mod x86 {
    use super::*;

    /// Sign-extend 8 Q15 values of each input to 32 bits and multiply.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn window_q30_avx2(samples: &[i16], window: &[i16], out: &mut [i32]) {
        let len = samples.len().min(window.len()).min(out.len());
        let chunks = len / 8;
        let s_ptr = samples.as_ptr();
        let w_ptr = window.as_ptr();
        let o_ptr = out.as_mut_ptr();
        for i in 0..chunks {
            let offset = i * 8;
            let s = _mm256_cvtepi16_epi32(_mm_loadu_si128(s_ptr.add(offset) as *const __m128i));
            let w = _mm256_cvtepi16_epi32(_mm_loadu_si128(w_ptr.add(offset) as *const __m128i));
            _mm256_storeu_si256(o_ptr.add(offset) as *mut __m256i, _mm256_mullo_epi32(s, w));
        }
        let tail = chunks * 8;
        ScalarKernels.window_q30(&samples[tail..len], &window[tail..len], &mut out[tail..len]);
    }

    /// Pack 8 i32 values to i16 with signed saturation.
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn saturate_i16_sse2(input: &[i32], out: &mut [i16]) {
        let len = input.len().min(out.len());
        let chunks = len / 8;
        let i_ptr = input.as_ptr();
        let o_ptr = out.as_mut_ptr();
        for i in 0..chunks {
            let offset = i * 8;
            let lo = _mm_loadu_si128(i_ptr.add(offset) as *const __m128i);
            let hi = _mm_loadu_si128(i_ptr.add(offset + 4) as *const __m128i);
            _mm_storeu_si128(o_ptr.add(offset) as *mut __m128i, _mm_packs_epi32(lo, hi));
        }
        let tail = chunks * 8;
        ScalarKernels.saturate_i16(&input[tail..len], &mut out[tail..len]);
    }
}

#[cfg(all(target_arch = "aarch64", feature = "aarch64"))]
mod neon {
    use super::*;

    /// # Safety
    /// Caller must ensure NEON is available (always true on aarch64).
    #[inline]
    pub(super) unsafe fn window_q30(samples: &[i16], window: &[i16], out: &mut [i32]) {
        let len = samples.len().min(window.len()).min(out.len());
        let chunks = len / 4;
        for i in 0..chunks {
            let offset = i * 4;
            let s = vld1_s16(samples.as_ptr().add(offset));
            let w = vld1_s16(window.as_ptr().add(offset));
            vst1q_s32(out.as_mut_ptr().add(offset), vmull_s16(s, w));
        }
        let tail = chunks * 4;
        ScalarKernels.window_q30(&samples[tail..len], &window[tail..len], &mut out[tail..len]);
    }

    /// Widening multiply, rounding (`vrshl`) or plain (`vshl`) shift by a
    /// negative amount, 64-bit add and saturating narrow back to i32.
    ///
    /// # Safety
    /// Caller must ensure NEON is available.
    #[inline]
    pub(super) unsafe fn window_accumulate(
        window: &[i16],
        frame: &[i32],
        shift: u32,
        rounding: Rounding,
        acc: &mut [i32],
    ) {
        let len = window.len().min(frame.len()).min(acc.len());
        let chunks = len / 4;
        let neg_shift = vdupq_n_s64(-(shift.min(63) as i64));
        for i in 0..chunks {
            let offset = i * 4;
            let w = vmovl_s16(vld1_s16(window.as_ptr().add(offset)));
            let x = vld1q_s32(frame.as_ptr().add(offset));
            let a = vld1q_s32(acc.as_ptr().add(offset));
            let mut p_lo = vmull_s32(vget_low_s32(w), vget_low_s32(x));
            let mut p_hi = vmull_high_s32(w, x);
            match rounding {
                Rounding::Nearest => {
                    p_lo = vrshlq_s64(p_lo, neg_shift);
                    p_hi = vrshlq_s64(p_hi, neg_shift);
                }
                Rounding::Truncate => {
                    p_lo = vshlq_s64(p_lo, neg_shift);
                    p_hi = vshlq_s64(p_hi, neg_shift);
                }
            }
            let sum_lo = vaddq_s64(vmovl_s32(vget_low_s32(a)), p_lo);
            let sum_hi = vaddq_s64(vmovl_high_s32(a), p_hi);
            let packed = vcombine_s32(vqmovn_s64(sum_lo), vqmovn_s64(sum_hi));
            vst1q_s32(acc.as_mut_ptr().add(offset), packed);
        }
        let tail = chunks * 4;
        ScalarKernels.window_accumulate(
            &window[tail..len],
            &frame[tail..len],
            shift,
            rounding,
            &mut acc[tail..len],
        );
    }

    /// # Safety
    /// Caller must ensure NEON is available.
    #[inline]
    pub(super) unsafe fn saturate_i16(input: &[i32], out: &mut [i16]) {
        let len = input.len().min(out.len());
        let chunks = len / 4;
        for i in 0..chunks {
            let offset = i * 4;
            let x = vld1q_s32(input.as_ptr().add(offset));
            vst1_s16(out.as_mut_ptr().add(offset), vqmovn_s32(x));
        }
        let tail = chunks * 4;
        ScalarKernels.saturate_i16(&input[tail..len], &mut out[tail..len]);
    }
}

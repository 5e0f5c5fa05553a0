//! Q15 window tables for STFT analysis and synthesis.
//!
//! The same table is used on both sides of the transform, so a window is only
//! suitable for resynthesis when its square overlap-adds to a constant at the
//! configured hop. [`cola_deviation`] measures how far a table is from that.

use alloc::vec::Vec;
use core::f64::consts::PI;

use libm::{cos, sqrt};

use crate::error::ConfigError;
use crate::fixed::to_q15;

/// Quantize real coefficients in `[-1, 1]` to Q15, rounding and saturating.
pub fn quantize_q15(coeffs: &[f32]) -> Vec<i16> {
    coeffs.iter().map(|&c| to_q15(c)).collect()
}

fn hann_value(n: usize, len: usize) -> f64 {
    0.5 - 0.5 * cos(2.0 * PI * n as f64 / len as f64)
}

/// Periodic Hann window of length `len`, in Q15.
pub fn hann_q15(len: usize) -> Vec<i16> {
    (0..len).map(|n| to_q15(hann_value(n, len) as f32)).collect()
}

/// Square root of the periodic Hann window, in Q15.
pub fn sqrt_hann_q15(len: usize) -> Vec<i16> {
    (0..len)
        .map(|n| to_q15(sqrt(hann_value(n, len)) as f32))
        .collect()
}

/// Square-root Hann window scaled so that its square overlap-adds to one at
/// the given hop.
///
/// Used as both analysis and synthesis window, this makes an untouched
/// spectrum reconstruct its input at unit gain. For 480/160 the scale is
/// `sqrt(2/3)`.
pub fn cola_sqrt_hann_q15(len: usize, hop: usize) -> Result<Vec<i16>, ConfigError> {
    if len == 0 {
        return Err(ConfigError::ZeroWindowLength);
    }
    if hop == 0 {
        return Err(ConfigError::ZeroHopSize);
    }
    if hop > len {
        return Err(ConfigError::HopExceedsWindow { hop, window: len });
    }
    // Σ_k hann[n + k·hop] averaged over one hop.
    let total: f64 = (0..len).map(|n| hann_value(n, len)).sum();
    let overlap_sum = total / hop as f64;
    let scale = if overlap_sum > 0.0 {
        1.0 / sqrt(overlap_sum)
    } else {
        1.0
    };
    Ok((0..len)
        .map(|n| to_q15((scale * sqrt(hann_value(n, len))) as f32))
        .collect())
}

/// Relative deviation of the squared-window overlap-add from a constant.
///
/// Computes `S[n] = Σ_k window[n + k·hop]²` for `n < hop` and returns
/// `(max S - min S) / max S`. A window that never overlaps to anything
/// (all zeros, or a hop of zero or beyond the window) yields infinity.
pub fn cola_deviation(window: &[i16], hop: usize) -> f32 {
    if hop == 0 || hop > window.len() {
        return f32::INFINITY;
    }
    let mut min = u64::MAX;
    let mut max = 0u64;
    for n in 0..hop {
        let s: u64 = window[n..]
            .iter()
            .step_by(hop)
            .map(|&w| (w as i64 * w as i64) as u64)
            .sum();
        min = min.min(s);
        max = max.max(s);
    }
    if max == 0 {
        return f32::INFINITY;
    }
    ((max - min) as f64 / max as f64) as f32
}

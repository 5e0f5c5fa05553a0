//! Fixed-point real FFT engine.
//!
//! A length-`N` real transform is computed by packing even/odd samples into a
//! length-`N/2` complex sequence, running the scaled complex FFT from
//! [`crate::fft`] and splitting the result with the usual real-FFT
//! post-processing. The forward transform returns `DFT(x) / N`, so a Q30 frame
//! comes out at `Q(30 - log2 N)`; the inverse is the normalised inverse DFT and
//! keeps the scale of its input.
//!
//! Twiddle tables are Q31 and shared through [`RfftPlanner`].

use alloc::{collections::VecDeque, sync::Arc, vec, vec::Vec};

use hashbrown::HashMap;

use crate::error::{check_len, ConfigError, StftError};
use crate::fft::{fft_q31_inplace, Direction};
use crate::fixed::{saturate, shift_right, Rounding, Q};
use crate::num::ComplexI32;

/// Number of real samples that make up a complex pair.
pub const STRIDE: usize = 2;

/// Smallest supported transform length.
pub const MIN_FFT_SIZE: usize = 16;

/// Largest supported transform length.
pub const MAX_FFT_SIZE: usize = 4096;

/// Maximum number of cached twiddle tables to retain in the planner.
pub const MAX_CACHE_ENTRIES: usize = 8;

/// Scale of a windowed Q15×Q15 frame entering the forward transform.
const WINDOWED_Q: Q = Q::Q30;

/// Whether `n` is a transform length [`FixedRfft`] accepts.
#[inline]
pub fn is_supported_size(n: usize) -> bool {
    n.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&n)
}

fn check_size(n: usize) -> Result<(), StftError> {
    if !n.is_power_of_two() {
        return Err(ConfigError::NonPowerOfTwo(n).into());
    }
    if !is_supported_size(n) {
        return Err(StftError::UnsupportedSize(n));
    }
    Ok(())
}

/// Output scale of the forward transform of a windowed (Q30) frame.
///
/// ```
/// use qstft::{rfft::native_q, Q};
/// assert_eq!(native_q(512).unwrap(), Q::Q21);
/// assert_eq!(native_q(1024).unwrap(), Q::Q20);
/// ```
pub fn native_q(fft_size: usize) -> Result<Q, StftError> {
    check_size(fft_size)?;
    WINDOWED_Q
        .checked_sub(fft_size.trailing_zeros())
        .ok_or(StftError::UnsupportedSize(fft_size))
}

/// Build the Q31 table `e^{-2πi·k/n}` for `k < n/2`.
fn build_twiddle_table(n: usize) -> Result<Vec<ComplexI32>, StftError> {
    check_size(n)?;
    let step = -2.0 * core::f64::consts::PI / n as f64;
    Ok((0..n / STRIDE)
        .map(|k| ComplexI32::from_angle(step * k as f64))
        .collect())
}

/// Planner that caches twiddle tables by transform length.
///
/// Tables are handed out as `Arc<[ComplexI32]>` so every engine of the same
/// size shares one read-only copy. Cached tables are evicted in
/// least-recently-used order once more than [`MAX_CACHE_ENTRIES`] sizes have
/// been requested.
#[derive(Debug, Default)]
pub struct RfftPlanner {
    cache: HashMap<usize, Arc<[ComplexI32]>>,
    /// LRU order, most recent at the back.
    cache_order: VecDeque<usize>,
}

impl RfftPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve or build the twiddle table for an `n`-point real transform.
    pub fn get_twiddles(&mut self, n: usize) -> Result<Arc<[ComplexI32]>, StftError> {
        let table = match self.cache.get(&n) {
            Some(table) => Arc::clone(table),
            None => {
                let table: Arc<[ComplexI32]> = Arc::from(build_twiddle_table(n)?);
                if self.cache.len() == MAX_CACHE_ENTRIES {
                    if let Some(old) = self.cache_order.pop_front() {
                        self.cache.remove(&old);
                    }
                }
                self.cache.insert(n, Arc::clone(&table));
                table
            }
        };
        self.cache_order.retain(|&x| x != n);
        self.cache_order.push_back(n);
        Ok(table)
    }

    /// Number of entries currently stored in the twiddle cache.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Real-valued FFT collaborator used by the analyzer and synthesizer.
///
/// Implementations must be deterministic and bit-exact: the same input always
/// yields the same output.
pub trait RealFftImpl {
    /// Transform length `N` in real samples.
    fn len(&self) -> usize;

    /// Number of complex bins exchanged with the transform, `N/2 + 1`.
    fn bins(&self) -> usize {
        self.len() / STRIDE + 1
    }

    /// Scale of the forward output for input at scale `input_q`.
    fn output_q(&self, input_q: Q) -> Result<Q, StftError>;

    /// Forward transform of `N` real samples into `N/2 + 1` bins.
    fn forward(&mut self, input: &[i32], output: &mut [ComplexI32]) -> Result<(), StftError>;

    /// Inverse transform of `N/2 + 1` bins into `N` real samples.
    ///
    /// The imaginary parts of the DC and Nyquist bins are ignored.
    fn inverse(&mut self, input: &[ComplexI32], output: &mut [i32]) -> Result<(), StftError>;
}

#[inline(always)]
fn half_sum(a: i64, b: i64) -> i64 {
    shift_right(a + b, 1, Rounding::Nearest)
}

/// Default fixed-point real FFT.
///
/// Owns its complex work buffers, so an instance performs no allocation after
/// construction and never shares mutable state with another instance.
#[derive(Debug, Clone)]
pub struct FixedRfft {
    n: usize,
    twiddles: Arc<[ComplexI32]>,
    work: Vec<ComplexI32>,
    scratch: Vec<ComplexI32>,
}

impl FixedRfft {
    /// Engine for `n`-point transforms with a private twiddle table.
    pub fn new(n: usize) -> Result<Self, StftError> {
        let twiddles = Arc::from(build_twiddle_table(n)?);
        Self::with_twiddles(n, twiddles)
    }

    /// Engine whose twiddle table comes from (and stays cached in) `planner`.
    pub fn with_planner(n: usize, planner: &mut RfftPlanner) -> Result<Self, StftError> {
        let twiddles = planner.get_twiddles(n)?;
        Self::with_twiddles(n, twiddles)
    }

    /// Engine reusing an existing table built for `n`.
    pub fn with_twiddles(n: usize, twiddles: Arc<[ComplexI32]>) -> Result<Self, StftError> {
        check_size(n)?;
        let m = n / STRIDE;
        check_len(m, twiddles.len())?;
        log::debug!("fixed rfft: n={n}, native output {}", native_q(n)?);
        Ok(Self {
            n,
            twiddles,
            work: vec![ComplexI32::ZERO; m],
            scratch: vec![ComplexI32::ZERO; m],
        })
    }

    /// The shared twiddle table.
    pub fn twiddles(&self) -> &Arc<[ComplexI32]> {
        &self.twiddles
    }
}

impl RealFftImpl for FixedRfft {
    fn len(&self) -> usize {
        self.n
    }

    fn output_q(&self, input_q: Q) -> Result<Q, StftError> {
        input_q
            .checked_sub(self.n.trailing_zeros())
            .ok_or(StftError::InvalidQFormat(input_q.bits()))
    }

    fn forward(&mut self, input: &[i32], output: &mut [ComplexI32]) -> Result<(), StftError> {
        let m = self.n / STRIDE;
        check_len(self.n, input.len())?;
        check_len(m + 1, output.len())?;

        for (z, pair) in self.work.iter_mut().zip(input.chunks_exact(STRIDE)) {
            *z = ComplexI32::new(pair[0], pair[1]);
        }
        fft_q31_inplace(
            &mut self.work,
            &mut self.scratch,
            &self.twiddles,
            Direction::Forward,
        )?;

        let z = &self.work;
        let (z0_re, z0_im) = (z[0].re as i64, z[0].im as i64);
        output[0] = ComplexI32::new(saturate(half_sum(z0_re, z0_im)), 0);
        output[m] = ComplexI32::new(saturate(half_sum(z0_re, -z0_im)), 0);
        for k in 1..m {
            let (a_re, a_im) = (z[k].re as i64, z[k].im as i64);
            // b = conj(Z[m - k])
            let (b_re, b_im) = (z[m - k].re as i64, -(z[m - k].im as i64));
            let (s_re, s_im) = (half_sum(a_re, b_re), half_sum(a_im, b_im));
            let diff = ComplexI32::saturating_from(half_sum(a_re, -b_re), half_sum(a_im, -b_im));
            let (t_re, t_im) = diff.mul_q31(self.twiddles[k]);
            output[k] = ComplexI32::saturating_from(half_sum(s_re, t_im), half_sum(s_im, -t_re));
        }
        Ok(())
    }

    fn inverse(&mut self, input: &[ComplexI32], output: &mut [i32]) -> Result<(), StftError> {
        let m = self.n / STRIDE;
        check_len(m + 1, input.len())?;
        check_len(self.n, output.len())?;

        let (x0, xm) = (input[0].re as i64, input[m].re as i64);
        self.work[0] = ComplexI32::saturating_from(half_sum(x0, xm), half_sum(x0, -xm));
        for k in 1..m {
            let (a_re, a_im) = (input[k].re as i64, input[k].im as i64);
            let (b_re, b_im) = (input[m - k].re as i64, -(input[m - k].im as i64));
            let (s_re, s_im) = (half_sum(a_re, b_re), half_sum(a_im, b_im));
            let diff = ComplexI32::saturating_from(half_sum(a_re, -b_re), half_sum(a_im, -b_im));
            let (t_re, t_im) = diff.mul_q31(self.twiddles[k].conj());
            self.work[k] = ComplexI32::saturating_from(s_re - t_im, s_im + t_re);
        }
        fft_q31_inplace(
            &mut self.work,
            &mut self.scratch,
            &self.twiddles,
            Direction::Inverse,
        )?;

        for (pair, z) in output.chunks_exact_mut(STRIDE).zip(self.work.iter()) {
            pair[0] = z.re;
            pair[1] = z.im;
        }
        Ok(())
    }
}

//! Construction parameters shared by an analyzer and a synthesizer.

use alloc::sync::Arc;

use crate::error::{ConfigError, StftError};
use crate::fixed::{Rounding, Q};
use crate::rfft::{is_supported_size, native_q, STRIDE};
use crate::window::{cola_deviation, cola_sqrt_hann_q15};

/// Default maximum relative COLA deviation accepted by the synthesizer (1 %).
pub const DEFAULT_COLA_TOLERANCE: f32 = 0.01;

/// Immutable STFT geometry and window table.
///
/// All validation happens in [`StftConfig::new`]; a config that exists is
/// usable by every processing object in this crate. Cloning is cheap: the
/// window table is shared.
///
/// ```
/// use qstft::{window::cola_sqrt_hann_q15, StftConfig};
///
/// let window = cola_sqrt_hann_q15(256, 128).unwrap();
/// let config = StftConfig::new(256, 128, 256, window).unwrap();
/// assert_eq!(config.bins(), 129);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StftConfig {
    window_length: usize,
    hop_size: usize,
    fft_size: usize,
    window: Arc<[i16]>,
    native_q: Q,
    rounding: Rounding,
    cola_tolerance: f32,
}

impl StftConfig {
    /// Validate and build a configuration.
    ///
    /// Checks, in order: non-zero window and hop, `hop_size <= window_length`,
    /// a window table of `window_length` coefficients, a power-of-two
    /// `fft_size` no shorter than the window, and an FFT size the engine
    /// supports.
    pub fn new(
        window_length: usize,
        hop_size: usize,
        fft_size: usize,
        window: impl Into<Arc<[i16]>>,
    ) -> Result<Self, StftError> {
        let window = window.into();
        if window_length == 0 {
            return Err(ConfigError::ZeroWindowLength.into());
        }
        if hop_size == 0 {
            return Err(ConfigError::ZeroHopSize.into());
        }
        if hop_size > window_length {
            return Err(ConfigError::HopExceedsWindow {
                hop: hop_size,
                window: window_length,
            }
            .into());
        }
        if window.len() != window_length {
            return Err(ConfigError::WindowTableLength {
                expected: window_length,
                actual: window.len(),
            }
            .into());
        }
        if !fft_size.is_power_of_two() {
            return Err(ConfigError::NonPowerOfTwo(fft_size).into());
        }
        if fft_size < window_length {
            return Err(ConfigError::FftShorterThanWindow {
                fft: fft_size,
                window: window_length,
            }
            .into());
        }
        if !is_supported_size(fft_size) {
            return Err(StftError::UnsupportedSize(fft_size));
        }
        Ok(Self {
            window_length,
            hop_size,
            fft_size,
            window,
            native_q: native_q(fft_size)?,
            rounding: Rounding::default(),
            cola_tolerance: DEFAULT_COLA_TOLERANCE,
        })
    }

    /// 30 ms frames every 10 ms at 16 kHz: 480-sample window, 160-sample
    /// hop, 512-point FFT and a unit-gain sqrt-Hann table.
    pub fn speech_16k() -> Result<Self, StftError> {
        let window = cola_sqrt_hann_q15(480, 160)?;
        Self::new(480, 160, 512, window)
    }

    /// Rounding applied when bins are rescaled and when synthesis shifts.
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Maximum relative COLA deviation the synthesizer accepts, in `[0, 1]`.
    pub fn with_cola_tolerance(mut self, tolerance: f32) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() || !(0.0..=1.0).contains(&tolerance) {
            return Err(ConfigError::InvalidColaTolerance);
        }
        self.cola_tolerance = tolerance;
        Ok(self)
    }

    #[inline]
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of complex bins per frame, `fft_size / 2 + 1`.
    #[inline]
    pub fn bins(&self) -> usize {
        self.fft_size / STRIDE + 1
    }

    /// Q15 window coefficients.
    #[inline]
    pub fn window(&self) -> &[i16] {
        &self.window
    }

    /// Shared handle to the window table.
    pub fn window_table(&self) -> &Arc<[i16]> {
        &self.window
    }

    /// Scale of the forward transform output for this FFT size.
    #[inline]
    pub fn native_q(&self) -> Q {
        self.native_q
    }

    #[inline]
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    #[inline]
    pub fn cola_tolerance(&self) -> f32 {
        self.cola_tolerance
    }

    /// Relative deviation of the squared window from constant overlap-add.
    pub fn cola_deviation(&self) -> f32 {
        cola_deviation(&self.window, self.hop_size)
    }

    /// Fail with [`ConfigError::NotColaCompliant`] unless the window
    /// overlap-adds to a constant within the configured tolerance.
    pub fn check_cola(&self) -> Result<(), ConfigError> {
        let deviation = self.cola_deviation();
        if deviation <= self.cola_tolerance {
            return Ok(());
        }
        let deviation_ppm = if deviation.is_finite() {
            libm::roundf(deviation * 1e6).min(u32::MAX as f32) as u32
        } else {
            u32::MAX
        };
        log::warn!(
            "window of {} samples is not COLA at hop {}: deviation {deviation_ppm} ppm exceeds {} ppm",
            self.window_length,
            self.hop_size,
            libm::roundf(self.cola_tolerance * 1e6) as u32,
        );
        Err(ConfigError::NotColaCompliant { deviation_ppm })
    }
}

//! Streaming fixed-point STFT analysis and overlap-add synthesis.
//!
//! An [`StftAnalyzer`] turns each hop of Q15 input into one [`Spectrum`]; an
//! [`StftSynthesizer`] turns each spectrum back into one hop of Q15 output.
//! With a COLA-normalised window (see
//! [`cola_sqrt_hann_q15`](crate::window::cola_sqrt_hann_q15)) an untouched
//! spectrum reconstructs the input delayed by `window_length - hop_size`
//! samples. [`StftPipeline`] wires the two together around a caller closure.
//!
//! # Scale chain
//!
//! | stage                         | scale                         |
//! |-------------------------------|-------------------------------|
//! | input samples, window         | Q15                           |
//! | windowed frame                | Q30                           |
//! | forward FFT output            | `Q(30 - log2 fft_size)`       |
//! | spectrum                      | caller-chosen                 |
//! | inverse FFT output            | same as the spectrum          |
//! | window × frame >> spectrum Q  | Q15, accumulated in `i32`     |
//!
//! # Example
//! ```
//! use qstft::{StftAnalyzer, StftConfig, StftSynthesizer, Q};
//!
//! let config = StftConfig::speech_16k().unwrap();
//! let mut analyzer = StftAnalyzer::new(config.clone()).unwrap();
//! let mut synthesizer = StftSynthesizer::new(config).unwrap();
//!
//! let hop = [0i16; 160];
//! let mut out = [0i16; 160];
//! let spectrum = analyzer.analyze(&hop, Q::Q20).unwrap();
//! assert_eq!(spectrum.len(), 257);
//! synthesizer.synthesize(spectrum, &mut out).unwrap();
//! assert_eq!(out, [0i16; 160]);
//! ```

use alloc::{vec, vec::Vec};

use crate::buffer::WindowedFrameBuffer;
use crate::config::StftConfig;
use crate::error::{check_len, StftError};
use crate::fixed::Q;
use crate::kernels::{SimdBackend, WindowKernels};
use crate::num::ComplexI32;
use crate::rfft::{FixedRfft, RealFftImpl, RfftPlanner};
use crate::spectrum::Spectrum;

fn check_engine<F: RealFftImpl>(config: &StftConfig, fft: &F) -> Result<(), StftError> {
    check_len(config.fft_size(), fft.len())
}

/// Streaming STFT analysis: one hop in, one spectrum out.
#[derive(Debug)]
pub struct StftAnalyzer<F = FixedRfft> {
    config: StftConfig,
    buffer: WindowedFrameBuffer,
    fft: F,
    backend: SimdBackend,
    /// Windowed frame, zero-padded to the FFT size.
    frame: Vec<i32>,
    spectrum: Spectrum,
    native_q: Q,
    #[cfg(feature = "verbose-logging")]
    frames: u64,
}

impl StftAnalyzer<FixedRfft> {
    /// Analyzer with its own default FFT engine.
    pub fn new(config: StftConfig) -> Result<Self, StftError> {
        let fft = FixedRfft::new(config.fft_size())?;
        Self::with_fft(config, fft)
    }

    /// Analyzer whose FFT engine takes its twiddle table from `planner`.
    pub fn with_planner(config: StftConfig, planner: &mut RfftPlanner) -> Result<Self, StftError> {
        let fft = FixedRfft::with_planner(config.fft_size(), planner)?;
        Self::with_fft(config, fft)
    }
}

impl<F: RealFftImpl> StftAnalyzer<F> {
    /// Analyzer driving a caller-supplied FFT engine of length `fft_size`.
    pub fn with_fft(config: StftConfig, fft: F) -> Result<Self, StftError> {
        check_engine(&config, &fft)?;
        let native_q = fft.output_q(Q::Q30)?;
        let buffer = WindowedFrameBuffer::new(config.window_length(), config.hop_size())?;
        let backend = SimdBackend::detect();
        log::debug!(
            "stft analyzer: window={}, hop={}, fft={}, native {native_q}, backend {}",
            config.window_length(),
            config.hop_size(),
            config.fft_size(),
            backend.name()
        );
        Ok(Self {
            frame: vec![0; config.fft_size()],
            spectrum: Spectrum::zeroed(config.bins(), native_q),
            buffer,
            fft,
            backend,
            native_q,
            config,
            #[cfg(feature = "verbose-logging")]
            frames: 0,
        })
    }

    /// Use `backend` for the windowing kernels instead of the detected one.
    pub fn with_backend(mut self, backend: SimdBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Forget all past input.
    pub fn reset(&mut self) {
        log::debug!("stft analyzer reset");
        self.buffer.reset();
        self.frame.fill(0);
        #[cfg(feature = "verbose-logging")]
        {
            self.frames = 0;
        }
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    pub fn backend(&self) -> SimdBackend {
        self.backend
    }

    /// Scale of the FFT output before it is moved to the requested scale.
    pub fn native_q(&self) -> Q {
        self.native_q
    }

    /// The sample history the next frame will be computed from.
    pub fn history(&self) -> &[i16] {
        self.buffer.samples()
    }

    /// Consume one hop of Q15 samples and return the spectrum of the current
    /// window at scale `output_q`.
    ///
    /// The returned spectrum lives until the next call; use
    /// [`spectrum_mut`](Self::spectrum_mut) to modify it in place.
    pub fn analyze(&mut self, new_samples: &[i16], output_q: Q) -> Result<&Spectrum, StftError> {
        self.buffer.append(new_samples)?;
        let len = self.config.window_length();
        self.backend
            .window_q30(self.buffer.samples(), self.config.window(), &mut self.frame[..len]);
        self.fft.forward(&self.frame, self.spectrum.bins_mut())?;
        self.spectrum.set_q(self.native_q);
        self.spectrum.rescale_to(output_q, self.config.rounding());
        #[cfg(feature = "verbose-logging")]
        {
            self.frames += 1;
            log::trace!(
                "analysis frame {}: {} -> {output_q}",
                self.frames,
                self.native_q
            );
        }
        Ok(&self.spectrum)
    }

    /// The most recent spectrum.
    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn spectrum_mut(&mut self) -> &mut Spectrum {
        &mut self.spectrum
    }
}

/// Streaming inverse STFT with overlap-add: one spectrum in, one hop out.
#[derive(Debug)]
pub struct StftSynthesizer<F = FixedRfft> {
    config: StftConfig,
    fft: F,
    backend: SimdBackend,
    /// Inverse FFT output, `fft_size` samples.
    frame: Vec<i32>,
    /// Running overlap-add sum at Q15, `window_length` samples.
    accumulator: Vec<i32>,
    #[cfg(feature = "verbose-logging")]
    frames: u64,
}

impl StftSynthesizer<FixedRfft> {
    /// Synthesizer with its own default FFT engine.
    ///
    /// Fails with [`ConfigError::NotColaCompliant`](crate::ConfigError) when
    /// the window does not overlap-add to a constant at the configured hop.
    pub fn new(config: StftConfig) -> Result<Self, StftError> {
        let fft = FixedRfft::new(config.fft_size())?;
        Self::with_fft(config, fft)
    }

    /// Synthesizer whose FFT engine takes its twiddle table from `planner`.
    pub fn with_planner(config: StftConfig, planner: &mut RfftPlanner) -> Result<Self, StftError> {
        let fft = FixedRfft::with_planner(config.fft_size(), planner)?;
        Self::with_fft(config, fft)
    }
}

impl<F: RealFftImpl> StftSynthesizer<F> {
    /// Synthesizer driving a caller-supplied inverse FFT engine.
    pub fn with_fft(config: StftConfig, fft: F) -> Result<Self, StftError> {
        check_engine(&config, &fft)?;
        config.check_cola()?;
        let backend = SimdBackend::detect();
        log::debug!(
            "stft synthesizer: window={}, hop={}, fft={}, cola deviation {:.2e}, backend {}",
            config.window_length(),
            config.hop_size(),
            config.fft_size(),
            config.cola_deviation(),
            backend.name()
        );
        Ok(Self {
            frame: vec![0; config.fft_size()],
            accumulator: vec![0; config.window_length()],
            fft,
            backend,
            config,
            #[cfg(feature = "verbose-logging")]
            frames: 0,
        })
    }

    /// Use `backend` for the windowing kernels instead of the detected one.
    pub fn with_backend(mut self, backend: SimdBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Clear the overlap-add accumulator.
    pub fn reset(&mut self) {
        log::debug!("stft synthesizer reset");
        self.accumulator.fill(0);
        #[cfg(feature = "verbose-logging")]
        {
            self.frames = 0;
        }
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    pub fn backend(&self) -> SimdBackend {
        self.backend
    }

    /// Current overlap-add state. The first `hop_size` values are what the
    /// next call will emit before its own frame is added.
    pub fn accumulator(&self) -> &[i32] {
        &self.accumulator
    }

    /// Inverse-transform `spectrum`, overlap-add it and write one hop of Q15
    /// samples to `output`.
    ///
    /// The synthesis shift equals the spectrum's scale, so the window product
    /// lands back at Q15.
    pub fn synthesize(&mut self, spectrum: &Spectrum, output: &mut [i16]) -> Result<(), StftError> {
        self.synthesize_with_shift(spectrum.bins(), spectrum.q().bits(), output)
    }

    /// Like [`synthesize`](Self::synthesize) with an explicit right shift
    /// applied to each `window × frame` product before accumulation.
    ///
    /// `right_shift` must be at most [`Q::MAX_BITS`]. Nothing is modified when
    /// an argument is rejected.
    pub fn synthesize_with_shift(
        &mut self,
        bins: &[ComplexI32],
        right_shift: u32,
        output: &mut [i16],
    ) -> Result<(), StftError> {
        if right_shift > Q::MAX_BITS {
            return Err(StftError::InvalidShift(right_shift));
        }
        check_len(self.config.bins(), bins.len())?;
        let hop = self.config.hop_size();
        check_len(hop, output.len())?;

        self.fft.inverse(bins, &mut self.frame)?;
        let len = self.config.window_length();
        self.backend.window_accumulate(
            self.config.window(),
            &self.frame[..len],
            right_shift,
            self.config.rounding(),
            &mut self.accumulator,
        );
        self.backend.saturate_i16(&self.accumulator[..hop], output);

        #[cfg(feature = "verbose-logging")]
        {
            self.frames += 1;
            let clipped = self.accumulator[..hop]
                .iter()
                .filter(|&&v| v > i16::MAX as i32 || v < i16::MIN as i32)
                .count();
            log::trace!(
                "synthesis frame {}: shift {right_shift}, {clipped} samples clipped",
                self.frames
            );
        }

        self.accumulator.copy_within(hop.., 0);
        self.accumulator[len - hop..].fill(0);
        Ok(())
    }
}

/// One analyzer and one synthesizer sharing a config and a twiddle table.
///
/// ```
/// use qstft::{StftConfig, StftPipeline, Q};
///
/// let mut pipeline = StftPipeline::new(StftConfig::speech_16k().unwrap()).unwrap();
/// let input = [100i16; 160];
/// let mut output = [0i16; 160];
/// // halve every bin, as a noise-suppression mask would
/// pipeline
///     .process(&input, &mut output, Q::Q21, |spectrum| {
///         let gains = vec![16384i16; spectrum.len()];
///         spectrum.apply_gain_q15(&gains, Default::default())
///     })
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct StftPipeline<F = FixedRfft> {
    analyzer: StftAnalyzer<F>,
    synthesizer: StftSynthesizer<F>,
}

impl StftPipeline<FixedRfft> {
    pub fn new(config: StftConfig) -> Result<Self, StftError> {
        let mut planner = RfftPlanner::new();
        let analyzer = StftAnalyzer::with_planner(config.clone(), &mut planner)?;
        let synthesizer = StftSynthesizer::with_planner(config, &mut planner)?;
        log::debug!(
            "stft pipeline: latency {} samples",
            analyzer.config().window_length() - analyzer.config().hop_size()
        );
        Ok(Self {
            analyzer,
            synthesizer,
        })
    }
}

impl<F: RealFftImpl> StftPipeline<F> {
    /// Pair an existing analyzer and synthesizer built from the same config.
    pub fn from_parts(
        analyzer: StftAnalyzer<F>,
        synthesizer: StftSynthesizer<F>,
    ) -> Result<Self, StftError> {
        let (a, s) = (analyzer.config(), synthesizer.config());
        check_len(a.window_length(), s.window_length())?;
        check_len(a.hop_size(), s.hop_size())?;
        check_len(a.fft_size(), s.fft_size())?;
        Ok(Self {
            analyzer,
            synthesizer,
        })
    }

    /// Use `backend` on both halves.
    pub fn with_backend(self, backend: SimdBackend) -> Self {
        Self {
            analyzer: self.analyzer.with_backend(backend),
            synthesizer: self.synthesizer.with_backend(backend),
        }
    }

    pub fn reset(&mut self) {
        self.analyzer.reset();
        self.synthesizer.reset();
    }

    /// Delay between a sample entering and leaving the pipeline.
    pub fn latency(&self) -> usize {
        let config = self.analyzer.config();
        config.window_length() - config.hop_size()
    }

    pub fn analyzer(&self) -> &StftAnalyzer<F> {
        &self.analyzer
    }

    pub fn synthesizer(&self) -> &StftSynthesizer<F> {
        &self.synthesizer
    }

    /// Analyze one hop at `spectral_q`, let `f` modify the spectrum, then
    /// synthesize one hop into `output`.
    ///
    /// An error from `f` aborts the frame before synthesis.
    pub fn process<G>(
        &mut self,
        input: &[i16],
        output: &mut [i16],
        spectral_q: Q,
        f: G,
    ) -> Result<(), StftError>
    where
        G: FnOnce(&mut Spectrum) -> Result<(), StftError>,
    {
        check_len(self.analyzer.config().hop_size(), output.len())?;
        self.analyzer.analyze(input, spectral_q)?;
        f(self.analyzer.spectrum_mut())?;
        self.synthesizer.synthesize(self.analyzer.spectrum(), output)
    }
}

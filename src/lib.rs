//! # qstft - fixed-point streaming STFT for microcontroller audio
//!
//! Windowed FFT analysis and overlap-add synthesis on Q15 audio, computed
//! entirely in integer arithmetic with explicit Q-format scales. Built as the
//! shared front end of small speech models (voice activity detection, speaker
//! identification, speech enhancement) running one frame every 10 ms.
//!
//! ## Features
//!
//! - **Explicit scales**: every spectrum carries its [`Q`] format; rescaling
//!   goes through one saturating primitive with a chosen [`Rounding`].
//! - **Per-instance state**: analyzers, synthesizers and FFT engines own
//!   their buffers and allocate nothing after construction.
//! - **Fail-fast configuration**: [`StftConfig`] rejects bad geometry, and a
//!   synthesizer rejects windows that do not overlap-add to a constant.
//! - **SIMD windowing** (x86_64 AVX2/SSE2, AArch64 NEON) that is bit-exact
//!   with the scalar path.
//!
//! ## Cargo Features
//!
//! - `std` (default): runtime CPU feature detection
//! - `x86_64`: AVX2/SSE2 kernels on x86_64
//! - `aarch64`: NEON kernels on AArch64
//! - `verbose-logging`: per-frame `trace!` output from the hot path
//!
//! ## Example
//!
//! ```
//! use qstft::{StftConfig, StftPipeline, Q};
//!
//! let mut pipeline = StftPipeline::new(StftConfig::speech_16k()?)?;
//! let mut out = [0i16; 160];
//! for _ in 0..4 {
//!     pipeline.process(&[1000; 160], &mut out, Q::Q21, |_spectrum| Ok(()))?;
//! }
//! // 320 samples of latency: the fourth hop emits input from the second
//! assert!(out.iter().all(|&s| (s - 1000).abs() <= 2));
//! # Ok::<(), qstft::StftError>(())
//! ```

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Error taxonomy for configuration and per-frame calls.
pub mod error;

/// Q-format scales, rounding shifts and saturation.
pub mod fixed;

/// Fixed-point complex numbers.
pub mod num;

/// Scaled in-place complex FFT over Q31 twiddles.
pub mod fft;

/// Real FFT engine, twiddle planner and the transform trait.
pub mod rfft;

/// Windowing kernels and SIMD backends.
pub mod kernels;

/// Q15 window tables and the COLA check.
pub mod window;

/// Sliding sample history.
pub mod buffer;

/// Validated STFT configuration.
pub mod config;

/// Spectrum frames, masking and power spectra.
pub mod spectrum;

/// Streaming analysis, synthesis and the full-duplex pipeline.
pub mod stft;

pub use buffer::WindowedFrameBuffer;
pub use config::StftConfig;
pub use error::{ConfigError, StftError};
pub use fixed::{Rounding, Q};
pub use kernels::{ScalarKernels, SimdBackend, WindowKernels};
pub use num::ComplexI32;
pub use rfft::{FixedRfft, RealFftImpl, RfftPlanner};
pub use spectrum::Spectrum;
pub use stft::{StftAnalyzer, StftPipeline, StftSynthesizer};

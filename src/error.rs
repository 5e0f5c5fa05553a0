//! Error taxonomy for configuration and per-frame processing.
//!
//! Configuration problems are reported once, when a [`crate::config::StftConfig`]
//! or a processing object is built. Per-frame calls only fail on caller
//! mistakes such as passing a slice of the wrong length.

use thiserror::Error;

/// Invalid construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window length must be non-zero")]
    ZeroWindowLength,
    #[error("hop size must be non-zero")]
    ZeroHopSize,
    #[error("hop size {hop} exceeds window length {window}")]
    HopExceedsWindow { hop: usize, window: usize },
    #[error("fft size {fft} is shorter than window length {window}")]
    FftShorterThanWindow { fft: usize, window: usize },
    #[error("fft size {0} is not a power of two")]
    NonPowerOfTwo(usize),
    #[error("window table has {actual} coefficients, expected {expected}")]
    WindowTableLength { expected: usize, actual: usize },
    #[error("window does not overlap-add to a constant (deviation {deviation_ppm} ppm)")]
    NotColaCompliant { deviation_ppm: u32 },
    #[error("COLA tolerance must be a finite value in [0, 1]")]
    InvalidColaTolerance,
}

/// Errors returned by the STFT engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StftError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("fft size {0} is not supported by the transform engine")]
    UnsupportedSize(usize),
    #[error("expected {expected} elements, got {actual}")]
    MismatchedLengths { expected: usize, actual: usize },
    #[error("right shift {0} is out of range")]
    InvalidShift(u32),
    #[error("Q format with {0} fractional bits is out of range")]
    InvalidQFormat(u32),
}

/// Return [`StftError::MismatchedLengths`] unless `actual == expected`.
#[inline]
pub(crate) fn check_len(expected: usize, actual: usize) -> Result<(), StftError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StftError::MismatchedLengths { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn config_error_converts_and_displays() {
        let err: StftError = ConfigError::HopExceedsWindow { hop: 8, window: 4 }.into();
        assert_eq!(
            err,
            StftError::Config(ConfigError::HopExceedsWindow { hop: 8, window: 4 })
        );
        assert_eq!(err.to_string(), "hop size 8 exceeds window length 4");
    }

    #[test]
    fn check_len_reports_both_sides() {
        assert!(check_len(3, 3).is_ok());
        assert_eq!(
            check_len(3, 2),
            Err(StftError::MismatchedLengths {
                expected: 3,
                actual: 2
            })
        );
    }
}

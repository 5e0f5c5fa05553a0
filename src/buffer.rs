//! Sliding sample history for STFT analysis.

use alloc::{vec, vec::Vec};

use crate::error::{check_len, ConfigError, StftError};

/// The most recent `window_length` samples, oldest first.
///
/// Each [`append`](Self::append) drops the oldest `hop_size` samples with a
/// linear move and writes the new hop into the freed tail. The buffer never
/// reallocates after construction.
///
/// # Example
/// ```
/// use qstft::buffer::WindowedFrameBuffer;
///
/// let mut buf = WindowedFrameBuffer::new(4, 2).unwrap();
/// buf.append(&[1, 2]).unwrap();
/// buf.append(&[3, 4]).unwrap();
/// buf.append(&[5, 6]).unwrap();
/// assert_eq!(buf.samples(), &[3, 4, 5, 6]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedFrameBuffer {
    samples: Vec<i16>,
    hop_size: usize,
}

impl WindowedFrameBuffer {
    /// Create a zero-filled buffer of `window_length` samples.
    pub fn new(window_length: usize, hop_size: usize) -> Result<Self, ConfigError> {
        if window_length == 0 {
            return Err(ConfigError::ZeroWindowLength);
        }
        if hop_size == 0 {
            return Err(ConfigError::ZeroHopSize);
        }
        if hop_size > window_length {
            return Err(ConfigError::HopExceedsWindow {
                hop: hop_size,
                window: window_length,
            });
        }
        Ok(Self {
            samples: vec![0; window_length],
            hop_size,
        })
    }

    /// Zero the whole history.
    pub fn reset(&mut self) {
        self.samples.fill(0);
    }

    /// Slide in one hop of new samples.
    ///
    /// `new_samples` must hold exactly `hop_size` samples.
    pub fn append(&mut self, new_samples: &[i16]) -> Result<(), StftError> {
        check_len(self.hop_size, new_samples.len())?;
        let keep = self.samples.len() - self.hop_size;
        self.samples.copy_within(self.hop_size.., 0);
        self.samples[keep..].copy_from_slice(new_samples);
        Ok(())
    }

    /// Current window contents, oldest sample first.
    #[inline]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    #[inline]
    pub fn window_length(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(
            WindowedFrameBuffer::new(4, 5),
            Err(ConfigError::HopExceedsWindow { hop: 5, window: 4 })
        );
        assert_eq!(
            WindowedFrameBuffer::new(0, 0),
            Err(ConfigError::ZeroWindowLength)
        );
        assert_eq!(WindowedFrameBuffer::new(4, 0), Err(ConfigError::ZeroHopSize));
    }

    #[test]
    fn hop_equal_to_window_replaces_everything() {
        let mut buf = WindowedFrameBuffer::new(3, 3).unwrap();
        buf.append(&[1, 2, 3]).unwrap();
        buf.append(&[4, 5, 6]).unwrap();
        assert_eq!(buf.samples(), &[4, 5, 6]);
    }

    #[test]
    fn wrong_hop_length_leaves_buffer_untouched() {
        let mut buf = WindowedFrameBuffer::new(4, 2).unwrap();
        buf.append(&[7, 8]).unwrap();
        assert_eq!(
            buf.append(&[1, 2, 3]),
            Err(StftError::MismatchedLengths {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(buf.samples(), &[0, 0, 7, 8]);
    }

    #[test]
    fn reset_zero_fills() {
        let mut buf = WindowedFrameBuffer::new(4, 1).unwrap();
        buf.append(&[9]).unwrap();
        buf.reset();
        assert_eq!(buf.samples(), &[0; 4]);
    }
}

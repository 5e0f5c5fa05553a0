use proptest::prelude::*;
use qstft::{ConfigError, WindowedFrameBuffer};

/// Feeding a counting sequence, the buffer always holds the latest
/// `window_length` samples in order, with zeros before the stream starts.
#[test]
fn counting_sequence_slides_in_order() {
    let (win, hop) = (480, 160);
    let mut buf = WindowedFrameBuffer::new(win, hop).unwrap();
    let mut next = 0i32;
    for _ in 0..10 {
        let hop_samples: Vec<i16> = (0..hop as i32).map(|i| (next + i) as i16).collect();
        next += hop as i32;
        buf.append(&hop_samples).unwrap();
        let expected: Vec<i16> = (next - win as i32..next)
            .map(|t| if t < 0 { 0 } else { t as i16 })
            .collect();
        assert_eq!(buf.samples(), expected.as_slice());
    }
}

#[test]
fn geometry_errors() {
    assert_eq!(
        WindowedFrameBuffer::new(160, 480),
        Err(ConfigError::HopExceedsWindow {
            hop: 480,
            window: 160
        })
    );
    let buf = WindowedFrameBuffer::new(256, 64).unwrap();
    assert_eq!(buf.window_length(), 256);
    assert_eq!(buf.hop_size(), 64);
}

proptest! {
    #[test]
    fn prop_buffer_holds_latest_window(win in 1usize..64, hop_frac in 1usize..=64, calls in 1usize..20) {
        let hop = 1 + (hop_frac - 1) % win;
        let mut buf = WindowedFrameBuffer::new(win, hop).unwrap();
        let mut history: Vec<i16> = vec![0; win];
        for c in 0..calls {
            let samples: Vec<i16> = (0..hop).map(|i| (c * hop + i + 1) as i16).collect();
            buf.append(&samples).unwrap();
            history.extend_from_slice(&samples);
        }
        prop_assert_eq!(buf.samples(), &history[history.len() - win..]);
    }
}

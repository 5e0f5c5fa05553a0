use std::f64::consts::PI;

use qstft::rfft::{native_q, FixedRfft, RealFftImpl, RfftPlanner};
use qstft::{ComplexI32, StftError, Q};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `DFT(x) / N` in f64, for the bins a real transform returns.
fn reference_scaled_dft(x: &[i32]) -> Vec<(f64, f64)> {
    let n = x.len();
    (0..=n / 2)
        .map(|k| {
            let (mut re, mut im) = (0.0, 0.0);
            for (t, &v) in x.iter().enumerate() {
                let theta = -2.0 * PI * (k * t % n) as f64 / n as f64;
                re += v as f64 * theta.cos();
                im += v as f64 * theta.sin();
            }
            (re / n as f64, im / n as f64)
        })
        .collect()
}

/// Normalised inverse DFT of a Hermitian half spectrum.
fn reference_idft(bins: &[ComplexI32], n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let mut acc = 0.0;
            for (k, b) in bins.iter().enumerate() {
                let theta = 2.0 * PI * (k * t % n) as f64 / n as f64;
                let term = b.re as f64 * theta.cos() - b.im as f64 * theta.sin();
                // interior bins stand for themselves and their mirror
                acc += if k == 0 || k == n / 2 { term } else { 2.0 * term };
            }
            acc / n as f64
        })
        .collect()
}

fn random_frame(rng: &mut StdRng, n: usize, amplitude: i32) -> Vec<i32> {
    (0..n).map(|_| rng.gen_range(-amplitude..=amplitude)).collect()
}

/// Forward output matches `DFT / N` within a few LSB at every supported size
/// the STFT presets use.
#[test]
fn forward_matches_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in [16, 64, 128, 256, 512] {
        let mut fft = FixedRfft::new(n).unwrap();
        let input = random_frame(&mut rng, n, 1 << 29);
        let mut out = vec![ComplexI32::ZERO; n / 2 + 1];
        fft.forward(&input, &mut out).unwrap();
        let expected = reference_scaled_dft(&input);
        for (k, (got, want)) in out.iter().zip(expected.iter()).enumerate() {
            assert!(
                (got.re as f64 - want.0).abs() <= 8.0 && (got.im as f64 - want.1).abs() <= 8.0,
                "n={n} bin {k}: got {got:?}, want {want:?}"
            );
        }
        assert_eq!(out[0].im, 0);
        assert_eq!(out[n / 2].im, 0);
    }
}

/// The inverse transform is the normalised inverse DFT.
#[test]
fn inverse_matches_reference() {
    let mut rng = StdRng::seed_from_u64(11);
    let n = 256;
    let mut fft = FixedRfft::new(n).unwrap();
    let mut bins: Vec<ComplexI32> = (0..=n / 2)
        .map(|_| {
            ComplexI32::new(
                rng.gen_range(-(1 << 24)..(1 << 24)),
                rng.gen_range(-(1 << 24)..(1 << 24)),
            )
        })
        .collect();
    // imaginary parts of DC and Nyquist are ignored
    bins[0].im = 12345;
    bins[n / 2].im = -999;
    let mut out = vec![0i32; n];
    fft.inverse(&bins, &mut out).unwrap();

    bins[0].im = 0;
    bins[n / 2].im = 0;
    let expected = reference_idft(&bins, n);
    for (t, (&got, want)) in out.iter().zip(expected.iter()).enumerate() {
        assert!((got as f64 - want).abs() <= 8.0, "t={t}: {got} vs {want}");
    }
}

/// Forward then inverse returns the frame divided by `N`.
#[test]
fn forward_inverse_scales_by_length() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 512;
    let mut fft = FixedRfft::new(n).unwrap();
    let input = random_frame(&mut rng, n, 1 << 30);
    let mut bins = vec![ComplexI32::ZERO; n / 2 + 1];
    let mut back = vec![0i32; n];
    fft.forward(&input, &mut bins).unwrap();
    fft.inverse(&bins, &mut back).unwrap();
    for (&x, &y) in input.iter().zip(back.iter()) {
        assert!((x as f64 / n as f64 - y as f64).abs() <= 4.0, "{x} -> {y}");
    }
}

/// Full-scale inputs stay within `i32` through every stage.
#[test]
fn extreme_inputs_saturate_instead_of_wrapping() {
    let n = 128;
    let mut fft = FixedRfft::new(n).unwrap();
    let input: Vec<i32> = (0..n)
        .map(|i| if i % 2 == 0 { 1 << 30 } else { -(1 << 30) })
        .collect();
    let mut out = vec![ComplexI32::ZERO; n / 2 + 1];
    fft.forward(&input, &mut out).unwrap();
    // all energy sits at Nyquist
    assert_eq!(out[n / 2].re, 1 << 30);
    assert!(out[..n / 2].iter().all(|b| b.re.abs() <= 2 && b.im.abs() <= 2));

    let loud = vec![ComplexI32::new(i32::MAX, i32::MIN); n / 2 + 1];
    let mut back = vec![0i32; n];
    fft.inverse(&loud, &mut back).unwrap();
}

#[test]
fn output_scale_follows_length() {
    for (n, bits) in [(128, 23), (256, 22), (512, 21), (1024, 20)] {
        let fft = FixedRfft::new(n).unwrap();
        assert_eq!(fft.output_q(Q::Q30).unwrap().bits(), bits);
        assert_eq!(native_q(n).unwrap().bits(), bits);
        assert_eq!(fft.bins(), n / 2 + 1);
    }
    let fft = FixedRfft::new(4096).unwrap();
    assert_eq!(fft.output_q(Q::Q15).unwrap().bits(), 3);
    assert_eq!(
        FixedRfft::new(4096).unwrap().output_q(Q::new(11).unwrap()),
        Err(StftError::InvalidQFormat(11))
    );
}

/// Engines built from one planner produce identical results to private ones.
#[test]
fn planner_tables_match_private_tables() {
    let mut planner = RfftPlanner::new();
    let mut shared = FixedRfft::with_planner(256, &mut planner).unwrap();
    let mut private = FixedRfft::new(256).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let input = random_frame(&mut rng, 256, 1 << 28);
    let mut a = vec![ComplexI32::ZERO; 129];
    let mut b = vec![ComplexI32::ZERO; 129];
    shared.forward(&input, &mut a).unwrap();
    private.forward(&input, &mut b).unwrap();
    assert_eq!(a, b);
}

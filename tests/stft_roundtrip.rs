use qstft::window::cola_sqrt_hann_q15;
use qstft::{Rounding, StftAnalyzer, StftConfig, StftPipeline, StftSynthesizer, Q};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn config(win: usize, hop: usize, fft: usize) -> StftConfig {
    StftConfig::new(win, hop, fft, cola_sqrt_hann_q15(win, hop).unwrap()).unwrap()
}

/// Run `signal` through a pass-through pipeline and return the output.
fn roundtrip(config: StftConfig, signal: &[i16], spectral_q: Q) -> Vec<i16> {
    let hop = config.hop_size();
    let mut pipeline = StftPipeline::new(config).unwrap();
    let mut out = vec![0i16; signal.len()];
    for (input, output) in signal.chunks_exact(hop).zip(out.chunks_exact_mut(hop)) {
        pipeline
            .process(input, output, spectral_q, |_| Ok(()))
            .unwrap();
    }
    out
}

/// Largest difference between `out` and `signal` delayed by `delay`.
fn max_error(signal: &[i16], out: &[i16], delay: usize) -> i32 {
    out.iter()
        .enumerate()
        .map(|(t, &y)| {
            let x = if t >= delay { signal[t - delay] } else { 0 };
            (y as i32 - x as i32).abs()
        })
        .max()
        .unwrap_or(0)
}

fn noise(seed: u64, len: usize, amplitude: i16) -> Vec<i16> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-amplitude..=amplitude)).collect()
}

/// Quiet noise comes back delayed by `window - hop` within two LSB, at
/// 33 %, 50 % and 75 % overlap.
#[test]
fn quiet_noise_roundtrip() {
    for (seed, (win, hop, fft)) in [(480, 160, 512), (256, 128, 256), (256, 64, 256)]
        .into_iter()
        .enumerate()
    {
        let config = config(win, hop, fft);
        let q = config.native_q();
        let signal = noise(seed as u64, hop * 30, 1000);
        let out = roundtrip(config, &signal, q);
        let err = max_error(&signal, &out, win - hop);
        assert!(err <= 2, "{win}/{hop}/{fft}: max error {err}");
    }
}

/// A spectral scale below the native one only costs precision in the bins.
#[test]
fn roundtrip_through_q20_spectrum() {
    let signal = noise(42, 160 * 25, 1000);
    let out = roundtrip(StftConfig::speech_16k().unwrap(), &signal, Q::Q20);
    assert!(max_error(&signal, &out, 320) <= 2);
}

#[test]
fn loud_sine_roundtrip() {
    let signal: Vec<i16> = (0..160 * 30)
        .map(|t| (20000.0 * (2.0 * std::f64::consts::PI * 440.0 * t as f64 / 16000.0).sin()) as i16)
        .collect();
    let out = roundtrip(StftConfig::speech_16k().unwrap(), &signal, Q::Q21);
    let err = max_error(&signal, &out, 320);
    assert!(err <= 4, "max error {err}");
}

/// Truncating shifts bias the result downward but stay close.
#[test]
fn truncating_roundtrip_stays_close() {
    let config = StftConfig::speech_16k()
        .unwrap()
        .with_rounding(Rounding::Truncate);
    let signal = noise(9, 160 * 20, 1000);
    let out = roundtrip(config, &signal, Q::Q21);
    assert!(max_error(&signal, &out, 320) <= 4);
}

/// An impulse re-emerges exactly `window - hop` samples later.
#[test]
fn impulse_latency() {
    let config = StftConfig::speech_16k().unwrap();
    let mut signal = vec![0i16; 160 * 8];
    signal[37] = 8000;
    let out = roundtrip(config, &signal, Q::Q21);
    let peak = out
        .iter()
        .enumerate()
        .max_by_key(|&(_, v)| *v)
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, 37 + 320);
    assert!((out[peak] - 8000).abs() <= 2);
}

/// Driving the halves by hand gives the same output as the pipeline, and a
/// reset returns both to their initial state.
#[test]
fn manual_wiring_and_reset() {
    let config = StftConfig::speech_16k().unwrap();
    let mut analyzer = StftAnalyzer::new(config.clone()).unwrap();
    let mut synthesizer = StftSynthesizer::new(config.clone()).unwrap();
    let mut pipeline = StftPipeline::new(config).unwrap();
    let signal = noise(1, 160 * 6, 3000);

    let mut first = Vec::new();
    for hop in signal.chunks_exact(160) {
        let mut a = [0i16; 160];
        let mut b = [0i16; 160];
        let spectrum = analyzer.analyze(hop, Q::Q21).unwrap();
        synthesizer.synthesize(spectrum, &mut a).unwrap();
        pipeline.process(hop, &mut b, Q::Q21, |_| Ok(())).unwrap();
        assert_eq!(a, b);
        first.extend_from_slice(&a);
    }

    pipeline.reset();
    let mut again = Vec::new();
    for hop in signal.chunks_exact(160) {
        let mut b = [0i16; 160];
        pipeline.process(hop, &mut b, Q::Q21, |_| Ok(())).unwrap();
        again.extend_from_slice(&b);
    }
    assert_eq!(first, again);
}

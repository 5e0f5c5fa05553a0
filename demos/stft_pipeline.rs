//! Streaming STFT pipeline example for qstft
//!
//! Feeds a noisy 16 kHz tone through analysis, a spectral gate and
//! overlap-add synthesis, one 10 ms hop at a time.

use std::f64::consts::PI;

use qstft::spectrum::power_spectrum;
use qstft::{Rounding, StftConfig, StftError, StftPipeline, Q};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLE_RATE: f64 = 16000.0;
const HOPS: usize = 50;

fn main() -> Result<(), StftError> {
    env_logger::init();
    println!("=== qstft streaming pipeline ===\n");

    let config = StftConfig::speech_16k()?;
    let hop = config.hop_size();
    println!(
        "window {} / hop {} / fft {} -> {} bins, native {}",
        config.window_length(),
        hop,
        config.fft_size(),
        config.bins(),
        config.native_q()
    );
    println!("COLA deviation: {:.2e}", config.cola_deviation());

    let mut rng = StdRng::seed_from_u64(2024);
    let input: Vec<i16> = (0..hop * HOPS)
        .map(|t| {
            let tone = 6000.0 * (2.0 * PI * 1000.0 * t as f64 / SAMPLE_RATE).sin();
            (tone as i32 + rng.gen_range(-600..=600)) as i16
        })
        .collect();

    let mut pipeline = StftPipeline::new(config)?;
    println!("latency: {} samples\n", pipeline.latency());

    let mut output = vec![0i16; input.len()];
    let mut power = Vec::new();
    let mut gains = Vec::new();
    for (i, (src, dst)) in input
        .chunks_exact(hop)
        .zip(output.chunks_exact_mut(hop))
        .enumerate()
    {
        pipeline.process(src, dst, Q::Q21, |spectrum| {
            power.resize(spectrum.len(), 0);
            power_spectrum(spectrum.bins(), spectrum.q(), Q::Q15, &mut power)?;
            // keep bins within 20 dB of the loudest one
            let peak = power.iter().copied().max().unwrap_or(0);
            gains.clear();
            gains.extend(
                power
                    .iter()
                    .map(|&p| if p as i64 * 100 >= peak as i64 { i16::MAX } else { 0 }),
            );
            if i % 10 == 0 {
                let kept = gains.iter().filter(|&&g| g != 0).count();
                println!("hop {i:2}: peak power {peak}, {kept} bins kept");
            }
            spectrum.apply_gain_q15(&gains, Rounding::Nearest)
        })?;
    }

    let energy = |s: &[i16]| s.iter().map(|&v| (v as f64).powi(2)).sum::<f64>() / s.len() as f64;
    let tail = hop * 10;
    println!(
        "\ninput RMS {:.1}, gated output RMS {:.1}",
        energy(&input[tail..]).sqrt(),
        energy(&output[tail..]).sqrt()
    );
    Ok(())
}

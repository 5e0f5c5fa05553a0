//! Per-frame trace output from the analysis and synthesis hot path.
//!
//! Run with `RUST_LOG=trace cargo run --example verbose_logging --features verbose-logging`.

use qstft::{StftConfig, StftError, StftPipeline, Q};

fn main() -> Result<(), StftError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();

    let mut pipeline = StftPipeline::new(StftConfig::speech_16k()?)?;
    let mut out = [0i16; 160];
    for i in 0..5i16 {
        let input = [i * 5000; 160];
        pipeline.process(&input, &mut out, Q::Q20, |_| Ok(()))?;
    }
    pipeline.reset();
    Ok(())
}

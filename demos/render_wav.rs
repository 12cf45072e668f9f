//! Renders a short chord progression offline and writes it to a WAV file.
//!
//! ```text
//! cargo run --example render_wav -- out.wav
//! ```
//!
//! The output is 32-bit float stereo at 48 kHz. Rendering is deterministic:
//! the same build always produces the same file.

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use murmur::envelope::EnvelopeConfig;
use murmur::filters::{LadderConfig, SvfConfig, SvfMode};
use murmur::modulation::LfoConfig;
use murmur::{
    Engine, EngineConfig, ModDest, ModRoute, ModSource, ParamFormat, ParamId, Waveform,
};
use tracing::info;

const SAMPLE_RATE: u32 = 48_000;
const CHANNELS: u16 = 2;
/// Frames handed to the engine per call, like a host audio period.
const PERIOD: usize = 256;

/// (notes, beats) per chord.
const PROGRESSION: [([u8; 4], usize); 4] = [
    ([48, 55, 60, 64], 4),
    ([45, 52, 57, 60], 4),
    ([41, 48, 53, 57], 4),
    ([43, 50, 55, 59], 4),
];
const BEAT_SECONDS: f64 = 0.5;
const TAIL_SECONDS: f64 = 1.5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "murmur.wav".to_string());

    let config = EngineConfig::new(SAMPLE_RATE as f64)
        .with_amp_env(EnvelopeConfig::new(20.0, 400.0, 0.6, 600.0))
        .with_filter_env(EnvelopeConfig::new(5.0, 700.0, 0.2, 500.0))
        .with_svf(SvfConfig {
            enabled: true,
            mode: SvfMode::LowPass,
            cutoff: 600.0,
            resonance: 0.4,
            env_amount: 1.0,
        })
        .with_ladder(LadderConfig {
            enabled: true,
            cutoff: 3000.0,
            resonance: 0.2,
            drive: 2.0,
            ..LadderConfig::default()
        })
        .with_lfos([
            LfoConfig::new(Waveform::Sine, 5.0),
            LfoConfig::new(Waveform::Triangle, 0.25),
            LfoConfig::new(Waveform::Square, 2.0),
        ])
        .with_route(ModRoute::new(ModSource::FilterEnv, ModDest::SvfCutoff, 3.0))
        .with_route(ModRoute::new(ModSource::Lfo1, ModDest::Osc1Pitch, 0.1))
        .with_route(ModRoute::new(ModSource::Lfo2, ModDest::LadderCutoff, 0.5))
        .with_master_gain(1.2);

    let (mut engine, mut handle) = Engine::new(config);

    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    let mut buffer = vec![0.0f32; PERIOD * CHANNELS as usize];

    let mut render_seconds = |engine: &mut Engine, seconds: f64| -> Result<()> {
        let mut frames = (seconds * SAMPLE_RATE as f64) as usize;
        while frames > 0 {
            let len = frames.min(PERIOD);
            let period = &mut buffer[..len * CHANNELS as usize];
            engine.render_interleaved(period, CHANNELS as usize);
            for &sample in period.iter() {
                writer.write_sample(sample)?;
            }
            frames -= len;
        }
        Ok(())
    };

    for (i, (chord, beats)) in PROGRESSION.iter().enumerate() {
        // Brighten the ladder a little on each chord
        handle.set_param(
            ParamId::LadderCutoff,
            0.5 + 0.1 * i as f64,
            ParamFormat::Normalized,
        );
        for &note in chord {
            handle.note_on(note, 96);
        }
        render_seconds(&mut engine, *beats as f64 * BEAT_SECONDS)?;
        for &note in chord {
            handle.note_off(note);
        }
    }
    render_seconds(&mut engine, TAIL_SECONDS)?;

    writer.finalize()?;
    info!(path = %path, "wrote wav file");
    Ok(())
}

//! Free-running LFOs and the noise source.
//!
//! LFOs are global rather than per voice: every voice sees the same LFO
//! value in a given block. They advance once per engine block and use the
//! naive waveform shapes, since hard edges are the point of a square LFO.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dsp::Waveform;

/// Number of LFOs.
pub const LFO_COUNT: usize = 3;

/// Rate range in Hz.
pub const RATE_RANGE: (f64, f64) = (0.0, 50.0);

/// Settings for one LFO.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LfoConfig {
    /// Shape
    pub waveform: Waveform,
    /// Frequency in Hz, 0 to 50
    pub rate: f64,
}

impl LfoConfig {
    pub fn new(waveform: Waveform, rate: f64) -> Self {
        Self {
            waveform,
            rate: rate.clamp(RATE_RANGE.0, RATE_RANGE.1),
        }
    }
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self::new(Waveform::Sine, 1.0)
    }
}

/// The three LFOs.
///
/// # Examples
///
/// ```
/// use murmur::dsp::Waveform;
/// use murmur::modulation::{LfoBank, LfoConfig};
///
/// let mut lfos = LfoBank::new([LfoConfig::new(Waveform::Square, 1.0); 3], 48000.0);
/// assert_eq!(lfos.value(0), 1.0);
///
/// // Half a cycle later the square has flipped
/// lfos.advance(24000);
/// assert_eq!(lfos.value(0), -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct LfoBank {
    /// Per-LFO settings
    pub configs: [LfoConfig; LFO_COUNT],
    phases: [f64; LFO_COUNT],
    sample_rate: f64,
}

impl LfoBank {
    pub fn new(configs: [LfoConfig; LFO_COUNT], sample_rate: f64) -> Self {
        Self {
            configs,
            phases: [0.0; LFO_COUNT],
            sample_rate,
        }
    }

    /// Moves every LFO forward by `samples`.
    pub fn advance(&mut self, samples: usize) {
        if self.sample_rate <= 0.0 {
            return;
        }
        for (phase, config) in self.phases.iter_mut().zip(self.configs.iter()) {
            let rate = config.rate.clamp(RATE_RANGE.0, RATE_RANGE.1);
            let next = *phase + rate * samples as f64 / self.sample_rate;
            *phase = next.rem_euclid(1.0);
        }
    }

    /// Current output of LFO `index` (0-2), -1.0 to 1.0. Out-of-range
    /// indices read as 0.0.
    pub fn value(&self, index: usize) -> f64 {
        match (self.configs.get(index), self.phases.get(index)) {
            (Some(config), Some(&phase)) => config.waveform.sample_naive(phase),
            _ => 0.0,
        }
    }

    /// Current phase of LFO `index`.
    pub fn phase(&self, index: usize) -> f64 {
        self.phases.get(index).copied().unwrap_or(0.0)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }
}

/// Seeded white-noise generator.
///
/// Seeding makes renders reproducible, which the offline renderer and the
/// tests rely on.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: StdRng,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next uniform sample in [-1.0, 1.0).
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        self.rng.gen_range(-1.0..1.0)
    }
}

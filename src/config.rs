//! Engine construction settings.
//!
//! [`EngineConfig`] gathers the initial state of every component. It is only
//! read when the engine is built; afterwards settings change through
//! parameter and route events. With the `serde` feature enabled it can be
//! loaded from any serde format, missing fields taking their defaults.

use crate::envelope::EnvelopeConfig;
use crate::filters::{DEFAULT_MOD_EPSILON, LadderConfig, SvfConfig};
use crate::modulation::{LFO_COUNT, LfoConfig, ModRoute};
use crate::oscillator::OscConfig;
use crate::dsp::Waveform;

/// Sample rate used when none is given.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// Initial engine settings.
///
/// # Examples
///
/// ```
/// use murmur::config::EngineConfig;
/// use murmur::envelope::EnvelopeConfig;
/// use murmur::filters::SvfConfig;
///
/// let config = EngineConfig::new(44100.0)
///     .with_amp_env(EnvelopeConfig::new(5.0, 200.0, 0.6, 400.0))
///     .with_svf(SvfConfig {
///         enabled: true,
///         cutoff: 2000.0,
///         ..SvfConfig::default()
///     })
///     .with_master_gain(0.8);
///
/// assert_eq!(config.sample_rate, 44100.0);
/// assert!(config.svf.enabled);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Main oscillators
    pub osc1: OscConfig,
    pub osc2: OscConfig,
    pub osc3: OscConfig,
    /// Sub oscillator
    pub sub_osc: OscConfig,
    /// Amplitude envelope
    pub amp_env: EnvelopeConfig,
    /// Filter envelope
    pub filter_env: EnvelopeConfig,
    /// General-purpose modulation envelope
    pub mod_env: EnvelopeConfig,
    /// State-variable filter
    pub svf: SvfConfig,
    /// Ladder filter
    pub ladder: LadderConfig,
    /// LFOs
    pub lfos: [LfoConfig; LFO_COUNT],
    /// Output gain, 0.0 to 2.0
    pub master_gain: f64,
    /// Threshold, in octaves, above which cutoff modulation recomputes
    /// filter coefficients
    pub filter_mod_epsilon: f64,
    /// Routes installed at startup (at most 16 are kept)
    pub routes: Vec<ModRoute>,
    /// Seed for the noise modulation source
    pub noise_seed: u64,
}

impl EngineConfig {
    /// Default settings at `sample_rate`.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets all four oscillators, in osc1, osc2, osc3, sub order.
    pub fn with_oscillators(mut self, oscillators: [OscConfig; 4]) -> Self {
        let [osc1, osc2, osc3, sub_osc] = oscillators;
        self.osc1 = osc1;
        self.osc2 = osc2;
        self.osc3 = osc3;
        self.sub_osc = sub_osc;
        self
    }

    pub fn with_amp_env(mut self, env: EnvelopeConfig) -> Self {
        self.amp_env = env;
        self
    }

    pub fn with_filter_env(mut self, env: EnvelopeConfig) -> Self {
        self.filter_env = env;
        self
    }

    pub fn with_mod_env(mut self, env: EnvelopeConfig) -> Self {
        self.mod_env = env;
        self
    }

    pub fn with_svf(mut self, svf: SvfConfig) -> Self {
        self.svf = svf;
        self
    }

    pub fn with_ladder(mut self, ladder: LadderConfig) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_lfos(mut self, lfos: [LfoConfig; LFO_COUNT]) -> Self {
        self.lfos = lfos;
        self
    }

    /// Sets the master gain, clamped to 0.0-2.0.
    pub fn with_master_gain(mut self, gain: f64) -> Self {
        self.master_gain = gain.clamp(0.0, 2.0);
        self
    }

    pub fn with_filter_mod_epsilon(mut self, epsilon: f64) -> Self {
        self.filter_mod_epsilon = epsilon.abs();
        self
    }

    /// Adds a route to install at startup.
    pub fn with_route(mut self, route: ModRoute) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }

    /// Oscillator configs in slot order.
    pub fn oscillators(&self) -> [OscConfig; 4] {
        [self.osc1, self.osc2, self.osc3, self.sub_osc]
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            osc1: OscConfig::new(Waveform::Saw),
            osc2: OscConfig::new(Waveform::Saw).with_detune(7.0),
            osc3: OscConfig::new(Waveform::Square)
                .with_octave(-1)
                .with_enabled(false),
            sub_osc: OscConfig::SUB,
            amp_env: EnvelopeConfig::default(),
            filter_env: EnvelopeConfig::new(5.0, 300.0, 0.3, 300.0),
            mod_env: EnvelopeConfig::default(),
            svf: SvfConfig::default(),
            ladder: LadderConfig::default(),
            lfos: [
                LfoConfig::new(Waveform::Sine, 5.0),
                LfoConfig::new(Waveform::Triangle, 0.5),
                LfoConfig::new(Waveform::Square, 2.0),
            ],
            master_gain: 1.0,
            filter_mod_epsilon: DEFAULT_MOD_EPSILON,
            routes: Vec::new(),
            noise_seed: 0x5eed,
        }
    }
}

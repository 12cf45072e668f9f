//! Per-voice oscillator bank.
//!
//! One [`Oscillator`] represents an oscillator *slot* (osc1, osc2, osc3 or
//! the sub oscillator). Its configuration is shared by every voice; each
//! voice owns only a phase and a base phase increment, stored as
//! structure-of-arrays indexed by voice slot.

use crate::MAX_VOICES;
use crate::dsp::{Waveform, midi_to_freq, semitones_to_ratio};

/// Mix level range (linear gain, values above 1.0 boost).
pub const MIX_LEVEL_RANGE: (f64, f64) = (0.0, 4.0);
/// Detune range in cents.
pub const DETUNE_RANGE: (f64, f64) = (-100.0, 100.0);
/// Octave offset range.
pub const OCTAVE_RANGE: (i8, i8) = (-2, 2);

/// Highest phase increment an oscillator will run at (Nyquist).
const MAX_INCREMENT: f64 = 0.5;

/// Configuration shared by every voice of one oscillator slot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OscConfig {
    /// Waveform shape
    pub waveform: Waveform,
    /// Linear output gain, 0.0 to 4.0
    pub mix_level: f64,
    /// Octave offset, -2 to +2
    pub octave: i8,
    /// Fine tuning in cents, -100 to +100
    pub detune: f64,
    /// Disabled oscillators output silence
    pub enabled: bool,
}

impl OscConfig {
    /// Default configuration for the sub oscillator: a sine two octaves down
    /// at half level.
    pub const SUB: OscConfig = OscConfig {
        waveform: Waveform::Sine,
        mix_level: 0.5,
        octave: -2,
        detune: 0.0,
        enabled: true,
    };

    /// Creates an enabled oscillator config with the given waveform at unity
    /// gain.
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            ..Self::default()
        }
    }

    /// Sets the mix level, clamped to 0.0-4.0.
    pub fn with_mix_level(mut self, mix_level: f64) -> Self {
        self.mix_level = mix_level.clamp(MIX_LEVEL_RANGE.0, MIX_LEVEL_RANGE.1);
        self
    }

    /// Sets the octave offset, clamped to -2..=2.
    pub fn with_octave(mut self, octave: i8) -> Self {
        self.octave = octave.clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1);
        self
    }

    /// Sets the detune in cents, clamped to +/-100.
    pub fn with_detune(mut self, cents: f64) -> Self {
        self.detune = cents.clamp(DETUNE_RANGE.0, DETUNE_RANGE.1);
        self
    }

    /// Enables or disables the oscillator.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Frequency this slot plays for `midi_note`, including octave and detune.
    pub fn frequency(&self, midi_note: u8) -> f64 {
        let octave = self.octave.clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1);
        midi_to_freq(midi_note) * 2.0_f64.powi(octave as i32) * (self.detune / 1200.0).exp2()
    }
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            mix_level: 1.0,
            octave: 0,
            detune: 0.0,
            enabled: true,
        }
    }
}

/// One oscillator slot with per-voice phase state.
///
/// # Examples
///
/// ```
/// use murmur::oscillator::{OscConfig, Oscillator};
/// use murmur::dsp::Waveform;
///
/// let mut osc = Oscillator::new(OscConfig::new(Waveform::Saw));
/// osc.init(0, 69, 48000.0);
///
/// let first = osc.process(0, None);
/// assert!(first.abs() <= 1.0);
/// assert!((osc.increment(0) - 440.0 / 48000.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Slot configuration. Changes apply to voices started afterwards.
    pub config: OscConfig,
    phases: [f64; MAX_VOICES],
    increments: [f64; MAX_VOICES],
}

impl Oscillator {
    /// Creates an oscillator slot with every voice at phase zero.
    pub fn new(config: OscConfig) -> Self {
        Self {
            config,
            phases: [0.0; MAX_VOICES],
            increments: [0.0; MAX_VOICES],
        }
    }

    /// Starts `voice` on `midi_note`: computes its base increment from the
    /// current config and resets its phase.
    pub fn init(&mut self, voice: usize, midi_note: u8, sample_rate: f64) {
        let increment = if sample_rate > 0.0 {
            self.config.frequency(midi_note) / sample_rate
        } else {
            0.0
        };
        self.increments[voice] = increment.clamp(0.0, MAX_INCREMENT);
        self.phases[voice] = 0.0;
    }

    /// Renders one sample for `voice` and advances its phase.
    ///
    /// `increment_override` replaces the stored base increment for this
    /// sample only, which is how pitch modulation is applied without
    /// retuning the voice.
    #[inline]
    pub fn process(&mut self, voice: usize, increment_override: Option<f64>) -> f64 {
        self.process_with_mix(voice, increment_override, 0.0)
    }

    /// Like [`process`](Self::process), with `mix_offset` added to the slot
    /// mix level (the sum is clamped to 0.0-4.0).
    #[inline]
    pub fn process_with_mix(
        &mut self,
        voice: usize,
        increment_override: Option<f64>,
        mix_offset: f64,
    ) -> f64 {
        if !self.config.enabled {
            return 0.0;
        }

        let increment = increment_override
            .unwrap_or(self.increments[voice])
            .clamp(0.0, MAX_INCREMENT);
        let phase = self.phases[voice];
        let mix = (self.config.mix_level + mix_offset).clamp(MIX_LEVEL_RANGE.0, MIX_LEVEL_RANGE.1);

        let sample = self.config.waveform.sample(phase, increment) * mix;

        let mut next = phase + increment;
        if next >= 1.0 {
            next -= 1.0;
        }
        self.phases[voice] = next;

        sample
    }

    /// Base increment of `voice` scaled by a pitch offset in semitones.
    #[inline]
    pub fn modulated_increment(&self, voice: usize, semitones: f64) -> f64 {
        self.increments[voice] * semitones_to_ratio(semitones)
    }

    /// Current phase of `voice`, in [0.0, 1.0).
    pub fn phase(&self, voice: usize) -> f64 {
        self.phases[voice]
    }

    /// Base phase increment of `voice` (frequency / sample rate).
    pub fn increment(&self, voice: usize) -> f64 {
        self.increments[voice]
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(OscConfig::default())
    }
}

//! Topology-preserving-transform state-variable filter.
//!
//! Two trapezoidal integrators per voice. One update produces lowpass,
//! bandpass and highpass together; notch is lowpass plus highpass. The
//! structure stays stable and well-behaved right up to the cutoff clamp, which
//! the older Chamberlin form does not.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::{
    DEFAULT_MOD_EPSILON, ENV_AMOUNT_RANGE, clamp_cutoff, clamp_cutoff_setting, exceeds_epsilon,
    modulated_cutoff,
};
use crate::MAX_VOICES;
use crate::error::ParseError;

/// Which output tap the filter returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum SvfMode {
    /// Lowpass
    #[default]
    LowPass = 0,
    /// Highpass
    HighPass = 1,
    /// Bandpass
    BandPass = 2,
    /// Band-reject, lowpass + highpass
    Notch = 3,
}

impl SvfMode {
    /// Number of modes.
    pub const COUNT: usize = 4;

    /// Returns the mode for a numeric index, or `None` if out of range.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(SvfMode::LowPass),
            1 => Some(SvfMode::HighPass),
            2 => Some(SvfMode::BandPass),
            3 => Some(SvfMode::Notch),
            _ => None,
        }
    }

    /// Returns the numeric index of this mode.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Short name of this mode.
    pub fn name(self) -> &'static str {
        match self {
            SvfMode::LowPass => "lp",
            SvfMode::HighPass => "hp",
            SvfMode::BandPass => "bp",
            SvfMode::Notch => "notch",
        }
    }
}

impl fmt::Display for SvfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SvfMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        match s.to_ascii_lowercase().as_str() {
            "lp" | "lowpass" => Ok(SvfMode::LowPass),
            "hp" | "highpass" => Ok(SvfMode::HighPass),
            "bp" | "bandpass" => Ok(SvfMode::BandPass),
            "notch" | "br" | "bandreject" => Ok(SvfMode::Notch),
            _ => Err(ParseError::InvalidFilterMode(s.to_string())),
        }
    }
}

/// Settings shared by every voice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SvfConfig {
    /// A disabled filter passes its input through
    pub enabled: bool,
    /// Output tap
    pub mode: SvfMode,
    /// Cutoff in Hz, 20 to 20000
    pub cutoff: f64,
    /// Resonance, 0.0 to 1.0 (Q = 0.5 + 20 * resonance)
    pub resonance: f64,
    /// Cutoff modulation depth in octaves per unit of modulation
    pub env_amount: f64,
}

impl Default for SvfConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: SvfMode::LowPass,
            cutoff: 1000.0,
            resonance: 0.5,
            env_amount: 1.0,
        }
    }
}

/// Cached filter coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SvfCoeffs {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    /// Damping, 1 / Q
    pub k: f64,
}

impl SvfCoeffs {
    /// Derives coefficients for a cutoff (clamped to the stable range) and a
    /// 0.0-1.0 resonance.
    pub fn compute(cutoff: f64, resonance: f64, sample_rate: f64) -> Self {
        let cutoff = clamp_cutoff(cutoff, sample_rate);
        let q = 0.5 + resonance.clamp(0.0, 1.0) * 20.0;

        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / q;
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;

        Self { a1, a2, a3, k }
    }
}

/// The three taps produced by one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvfOutputs {
    pub lp: f64,
    pub bp: f64,
    pub hp: f64,
}

impl SvfOutputs {
    /// Selects the tap for `mode`.
    pub fn tap(&self, mode: SvfMode) -> f64 {
        match mode {
            SvfMode::LowPass => self.lp,
            SvfMode::HighPass => self.hp,
            SvfMode::BandPass => self.bp,
            SvfMode::Notch => self.lp + self.hp,
        }
    }
}

/// Integrator registers for one voice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SvfState {
    pub ic1: f64,
    pub ic2: f64,
}

impl SvfState {
    /// Runs one sample through the filter.
    #[inline]
    pub fn tick(&mut self, input: f64, c: &SvfCoeffs) -> SvfOutputs {
        let v3 = input - self.ic2;
        let v1 = c.a1 * self.ic1 + c.a2 * v3;
        let v2 = self.ic2 + c.a2 * self.ic1 + c.a3 * v3;

        self.ic1 = 2.0 * v1 - self.ic1;
        self.ic2 = 2.0 * v2 - self.ic2;

        SvfOutputs {
            lp: v2,
            bp: v1,
            hp: input - c.k * v1 - v2,
        }
    }
}

/// State-variable filter slot with per-voice state.
///
/// # Examples
///
/// ```
/// use murmur::filters::{SvfConfig, SvfFilter, SvfMode};
///
/// let mut svf = SvfFilter::new(SvfConfig::default(), 48000.0);
/// svf.set_enabled(true);
/// svf.config.mode = SvfMode::HighPass;
///
/// // A highpass blocks DC
/// let mut out = 0.0;
/// for _ in 0..48000 {
///     out = svf.process(0, 1.0, 0.0);
/// }
/// assert!(out.abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct SvfFilter {
    /// Filter settings. Call [`update_coefficients`](Self::update_coefficients)
    /// after changing cutoff or resonance, and use
    /// [`set_enabled`](Self::set_enabled) to toggle the filter.
    pub config: SvfConfig,
    /// Modulation below this many octaves reuses the cached coefficients
    pub mod_epsilon: f64,
    coeffs: SvfCoeffs,
    sample_rate: f64,
    states: [SvfState; MAX_VOICES],
}

impl SvfFilter {
    /// Creates a filter and derives its coefficients.
    pub fn new(config: SvfConfig, sample_rate: f64) -> Self {
        let mut filter = Self {
            config,
            mod_epsilon: DEFAULT_MOD_EPSILON,
            coeffs: SvfCoeffs::default(),
            sample_rate,
            states: [SvfState::default(); MAX_VOICES],
        };
        filter.update_coefficients();
        filter
    }

    /// Sets the modulation threshold, in octaves.
    pub fn with_mod_epsilon(mut self, epsilon: f64) -> Self {
        self.mod_epsilon = epsilon.abs();
        self
    }

    /// Enables or disables the filter. Enabling a disabled filter clears
    /// every voice's state so stale energy is not replayed.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.config.enabled {
            self.states = [SvfState::default(); MAX_VOICES];
        }
        self.config.enabled = enabled;
    }

    /// Clamps the settings into range and recomputes the cached
    /// coefficients.
    pub fn update_coefficients(&mut self) {
        self.config.cutoff = clamp_cutoff_setting(self.config.cutoff);
        self.config.resonance = self.config.resonance.clamp(0.0, 1.0);
        self.config.env_amount = self
            .config
            .env_amount
            .clamp(ENV_AMOUNT_RANGE.0, ENV_AMOUNT_RANGE.1);
        self.coeffs = SvfCoeffs::compute(self.config.cutoff, self.config.resonance, self.sample_rate);
    }

    /// Changes the sample rate and recomputes the coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    /// Clears `voice`'s integrators. Called when a voice is allocated.
    pub fn init_state(&mut self, voice: usize) {
        self.states[voice] = SvfState::default();
    }

    /// Filters one sample for `voice` with `cutoff_mod` units of cutoff
    /// modulation.
    #[inline]
    pub fn process(&mut self, voice: usize, input: f64, cutoff_mod: f64) -> f64 {
        self.process_with_resonance(voice, input, cutoff_mod, 0.0)
    }

    /// Like [`process`](Self::process), with `resonance_mod` added to the
    /// base resonance (the sum is clamped to 0.0-1.0).
    #[inline]
    pub fn process_with_resonance(
        &mut self,
        voice: usize,
        input: f64,
        cutoff_mod: f64,
        resonance_mod: f64,
    ) -> f64 {
        if !self.config.enabled {
            return input;
        }

        let octaves = self.config.env_amount * cutoff_mod;
        let coeffs = if exceeds_epsilon(octaves, self.mod_epsilon) || resonance_mod != 0.0 {
            SvfCoeffs::compute(
                modulated_cutoff(self.config.cutoff, octaves),
                self.config.resonance + resonance_mod,
                self.sample_rate,
            )
        } else {
            self.coeffs
        };

        self.states[voice].tick(input, &coeffs).tap(self.config.mode)
    }

    /// Cached coefficients for the unmodulated cutoff.
    pub fn coeffs(&self) -> &SvfCoeffs {
        &self.coeffs
    }

    /// Integrator state of `voice`.
    pub fn state(&self, voice: usize) -> &SvfState {
        &self.states[voice]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 48000.0;

    fn enabled(mode: SvfMode) -> SvfFilter {
        let mut filter = SvfFilter::new(
            SvfConfig {
                mode,
                ..SvfConfig::default()
            },
            SAMPLE_RATE,
        );
        filter.set_enabled(true);
        filter
    }

    fn settle(filter: &mut SvfFilter, input: f64, samples: usize) -> f64 {
        let mut out = 0.0;
        for _ in 0..samples {
            out = filter.process(0, input, 0.0);
        }
        out
    }

    fn sine_rms(filter: &mut SvfFilter, freq: f64) -> f64 {
        let mut sum = 0.0;
        let n = 4800;
        // Let the transient die out first
        for i in 0..n * 2 {
            let x = (std::f64::consts::TAU * freq * i as f64 / SAMPLE_RATE).sin();
            let y = filter.process(0, x, 0.0);
            if i >= n {
                sum += y * y;
            }
        }
        (sum / n as f64).sqrt()
    }

    #[test]
    fn test_mode_parse_and_index() {
        assert_eq!("lp".parse::<SvfMode>().unwrap(), SvfMode::LowPass);
        assert_eq!("HighPass".parse::<SvfMode>().unwrap(), SvfMode::HighPass);
        assert_eq!("notch".parse::<SvfMode>().unwrap(), SvfMode::Notch);
        assert!(matches!(
            "comb".parse::<SvfMode>(),
            Err(ParseError::InvalidFilterMode(_))
        ));
        for i in 0..SvfMode::COUNT as u8 {
            assert_eq!(SvfMode::from_index(i).unwrap().index(), i);
        }
    }

    #[test]
    fn test_disabled_passes_through() {
        let mut filter = SvfFilter::new(SvfConfig::default(), SAMPLE_RATE);
        assert_eq!(filter.process(0, 0.75, 3.0), 0.75);
        assert_eq!(filter.state(0), &SvfState::default());
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = enabled(SvfMode::LowPass);
        let out = settle(&mut filter, 1.0, 48000);
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = enabled(SvfMode::HighPass);
        let out = settle(&mut filter, 1.0, 48000);
        assert!(out.abs() < 1e-6);
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let mut filter = enabled(SvfMode::LowPass);
        filter.config.resonance = 0.0;
        filter.update_coefficients();
        let low = sine_rms(&mut filter, 100.0);
        filter.init_state(0);
        let high = sine_rms(&mut filter, 10_000.0);
        assert!(low > 0.6, "passband rms {}", low);
        assert!(high < 0.05, "stopband rms {}", high);
    }

    #[test]
    fn test_notch_is_lowpass_plus_highpass() {
        let coeffs = SvfCoeffs::compute(1000.0, 0.3, SAMPLE_RATE);
        let mut state = SvfState::default();
        for i in 0..64 {
            let out = state.tick((i as f64 * 0.3).sin(), &coeffs);
            assert_eq!(out.tap(SvfMode::Notch), out.lp + out.hp);
        }
    }

    #[test]
    fn test_small_modulation_uses_cached_coefficients() {
        let mut filter = enabled(SvfMode::LowPass);
        let input: Vec<f64> = (0..128).map(|i| ((i * 7) % 13) as f64 / 13.0 - 0.5).collect();

        let mut reference = Vec::new();
        for &x in &input {
            reference.push(filter.process(0, x, 0.0));
        }
        for (i, &x) in input.iter().enumerate() {
            assert_eq!(filter.process(1, x, 0.0005), reference[i]);
        }
        for (i, &x) in input.iter().enumerate() {
            let y = filter.process(2, x, 1.0);
            if i > 0 {
                assert_ne!(y, reference[i]);
            }
        }
    }

    #[test]
    fn test_mod_epsilon_is_tunable() {
        let mut coarse = enabled(SvfMode::LowPass).with_mod_epsilon(0.5);
        let mut plain = enabled(SvfMode::LowPass);
        for i in 0..32 {
            let x = (i as f64 * 0.1).sin();
            assert_eq!(coarse.process(0, x, 0.25), plain.process(0, x, 0.0));
        }
    }

    #[test]
    fn test_reenable_resets_state() {
        let mut filter = enabled(SvfMode::LowPass);
        settle(&mut filter, 1.0, 100);
        assert_ne!(filter.state(0), &SvfState::default());

        filter.set_enabled(false);
        assert_ne!(filter.state(0), &SvfState::default());
        filter.set_enabled(true);
        assert_eq!(filter.state(0), &SvfState::default());
    }

    #[test]
    fn test_update_coefficients_clamps() {
        let mut filter = SvfFilter::new(SvfConfig::default(), SAMPLE_RATE);
        filter.config.cutoff = 50_000.0;
        filter.config.resonance = 3.0;
        filter.update_coefficients();
        assert_eq!(filter.config.cutoff, 20_000.0);
        assert_eq!(filter.config.resonance, 1.0);
        assert_eq!(filter.coeffs(), &SvfCoeffs::compute(20_000.0, 1.0, SAMPLE_RATE));
    }

    #[test]
    fn test_cutoff_setting_kept_across_sample_rates() {
        let mut filter = SvfFilter::new(SvfConfig::default(), 44_100.0);
        filter.config.cutoff = 20_000.0;
        filter.update_coefficients();
        assert_eq!(filter.config.cutoff, 20_000.0);
        assert_eq!(filter.coeffs(), &SvfCoeffs::compute(44_100.0 * 0.45, 0.5, 44_100.0));

        filter.set_sample_rate(22_050.0);
        filter.set_sample_rate(SAMPLE_RATE);
        assert_eq!(filter.config.cutoff, 20_000.0);
        assert_eq!(filter.coeffs(), &SvfCoeffs::compute(20_000.0, 0.5, SAMPLE_RATE));
    }

    #[test]
    fn test_extreme_modulation_stays_finite() {
        let mut filter = enabled(SvfMode::BandPass);
        filter.config.resonance = 1.0;
        filter.update_coefficients();
        for i in 0..4800 {
            let x = if i % 50 < 25 { 1.0 } else { -1.0 };
            let y = filter.process(0, x, if i % 2 == 0 { 4.0 } else { -4.0 });
            assert!(y.is_finite());
        }
    }
}

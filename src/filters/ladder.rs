//! Four-stage ladder lowpass with global feedback.
//!
//! Each stage is a one-pole smoother `s += f * (in - s)` with
//! `f = 1 - exp(-2 pi fc / fs)`, capped at [`MAX_STAGE_COEFF`]. Resonance
//! 0.0-1.0 maps to a feedback gain of 0-4 taken from the last stage. The
//! feedback reads the previous sample's output, and with that delay the
//! loop at full feedback stays stable only while `f` is below about 0.82.
//! With `drive` above 1.0 the nonlinear path is used: the feedback passes
//! through `tanh` and the driven input is saturated before the first stage,
//! which keeps the loop bounded at high resonance.

use std::f64::consts::PI;

use super::{
    DEFAULT_MOD_EPSILON, ENV_AMOUNT_RANGE, clamp_cutoff, clamp_cutoff_setting, exceeds_epsilon,
    modulated_cutoff,
};
use crate::MAX_VOICES;

/// Range of the input drive.
pub const DRIVE_RANGE: (f64, f64) = (1.0, 10.0);

/// Feedback gain at full resonance.
const MAX_FEEDBACK: f64 = 4.0;

/// Upper bound of the stage coefficient.
pub const MAX_STAGE_COEFF: f64 = 0.8;

/// Drive above this switches to the saturating path.
const NONLINEAR_THRESHOLD: f64 = 1.001;

/// Settings shared by every voice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LadderConfig {
    /// A disabled filter passes its input through
    pub enabled: bool,
    /// Cutoff in Hz, 20 to 20000
    pub cutoff: f64,
    /// Resonance, 0.0 to 1.0
    pub resonance: f64,
    /// Input drive, 1.0 (clean) to 10.0
    pub drive: f64,
    /// Cutoff modulation depth in octaves per unit of modulation
    pub env_amount: f64,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cutoff: 1000.0,
            resonance: 0.3,
            drive: 1.0,
            env_amount: 1.0,
        }
    }
}

/// Stage registers for one voice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LadderState {
    pub s: [f64; 4],
}

impl LadderState {
    #[inline]
    fn run_stages(&mut self, x: f64, f: f64) -> f64 {
        self.s[0] += f * (x - self.s[0]);
        self.s[1] += f * (self.s[0] - self.s[1]);
        self.s[2] += f * (self.s[1] - self.s[2]);
        self.s[3] += f * (self.s[2] - self.s[3]);
        self.s[3]
    }

    /// Linear ladder update. `feedback` is 0-4.
    #[inline]
    pub fn tick(&mut self, input: f64, f: f64, feedback: f64) -> f64 {
        let x = input - feedback * self.s[3];
        self.run_stages(x, f)
    }

    /// Saturating ladder update.
    #[inline]
    pub fn tick_nonlinear(&mut self, input: f64, f: f64, feedback: f64, drive: f64) -> f64 {
        let fb = feedback * self.s[3].tanh();
        let x = (drive * input - fb).tanh();
        self.run_stages(x, f)
    }
}

/// Stage coefficient for a cutoff. The cutoff is clamped to
/// [20 Hz, 0.45 * fs] and the result to [`MAX_STAGE_COEFF`].
pub fn ladder_coefficient(cutoff: f64, sample_rate: f64) -> f64 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    let cutoff = clamp_cutoff(cutoff, sample_rate);
    (1.0 - (-2.0 * PI * cutoff / sample_rate).exp()).min(MAX_STAGE_COEFF)
}

/// Ladder filter slot with per-voice state.
///
/// # Examples
///
/// ```
/// use murmur::filters::{LadderConfig, LadderFilter};
///
/// let mut ladder = LadderFilter::new(LadderConfig::default(), 48000.0);
/// ladder.set_enabled(true);
/// let out = ladder.process(0, 1.0, 0.0);
/// assert!(out > 0.0 && out < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct LadderFilter {
    /// Filter settings. Call [`update_coefficients`](Self::update_coefficients)
    /// after changing cutoff, resonance or drive, and use
    /// [`set_enabled`](Self::set_enabled) to toggle the filter.
    pub config: LadderConfig,
    /// Modulation below this many octaves reuses the cached coefficient
    pub mod_epsilon: f64,
    coeff: f64,
    sample_rate: f64,
    states: [LadderState; MAX_VOICES],
}

impl LadderFilter {
    /// Creates a filter and derives its coefficient.
    pub fn new(config: LadderConfig, sample_rate: f64) -> Self {
        let mut filter = Self {
            config,
            mod_epsilon: DEFAULT_MOD_EPSILON,
            coeff: 0.0,
            sample_rate,
            states: [LadderState::default(); MAX_VOICES],
        };
        filter.update_coefficients();
        filter
    }

    /// Sets the modulation threshold, in octaves.
    pub fn with_mod_epsilon(mut self, epsilon: f64) -> Self {
        self.mod_epsilon = epsilon.abs();
        self
    }

    /// Enables or disables the filter, clearing every voice's stages when it
    /// is switched back on.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.config.enabled {
            self.states = [LadderState::default(); MAX_VOICES];
        }
        self.config.enabled = enabled;
    }

    /// Clamps the settings into range and recomputes the cached coefficient.
    pub fn update_coefficients(&mut self) {
        self.config.cutoff = clamp_cutoff_setting(self.config.cutoff);
        self.config.resonance = self.config.resonance.clamp(0.0, 1.0);
        self.config.drive = self.config.drive.clamp(DRIVE_RANGE.0, DRIVE_RANGE.1);
        self.config.env_amount = self
            .config
            .env_amount
            .clamp(ENV_AMOUNT_RANGE.0, ENV_AMOUNT_RANGE.1);
        self.coeff = ladder_coefficient(self.config.cutoff, self.sample_rate);
    }

    /// Changes the sample rate and recomputes the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    /// Clears `voice`'s stages. Called when a voice is allocated.
    pub fn init_state(&mut self, voice: usize) {
        self.states[voice] = LadderState::default();
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
        let f = if exceeds_epsilon(octaves, self.mod_epsilon) {
            ladder_coefficient(
                modulated_cutoff(self.config.cutoff, octaves),
                self.sample_rate,
            )
        } else {
            self.coeff
        };

        let feedback = (self.config.resonance + resonance_mod).clamp(0.0, 1.0) * MAX_FEEDBACK;
        let state = &mut self.states[voice];

        if self.config.drive > NONLINEAR_THRESHOLD {
            state.tick_nonlinear(input, f, feedback, self.config.drive)
        } else {
            state.tick(input, f, feedback)
        }
    }

    /// Cached stage coefficient for the unmodulated cutoff.
    pub fn coefficient(&self) -> f64 {
        self.coeff
    }

    /// Stage registers of `voice`.
    pub fn state(&self, voice: usize) -> &LadderState {
        &self.states[voice]
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self, voice: usize) -> &mut LadderState {
        &mut self.states[voice]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 48000.0;

    fn enabled(config: LadderConfig) -> LadderFilter {
        let mut filter = LadderFilter::new(config, SAMPLE_RATE);
        filter.set_enabled(true);
        filter
    }

    #[test]
    fn test_coefficient_formula() {
        let filter = LadderFilter::new(LadderConfig::default(), SAMPLE_RATE);
        let expected = 1.0 - (-2.0 * PI * 1000.0 / SAMPLE_RATE).exp();
        assert!((filter.coefficient() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_coefficient_capped_near_nyquist() {
        assert_eq!(ladder_coefficient(20_000.0, SAMPLE_RATE), MAX_STAGE_COEFF);
        assert_eq!(ladder_coefficient(1e9, SAMPLE_RATE), MAX_STAGE_COEFF);
        assert!(ladder_coefficient(20.0, SAMPLE_RATE) > 0.0);
        assert_eq!(ladder_coefficient(1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_linear_path_stable_at_high_cutoff() {
        for resonance in [0.0, 0.3, 1.0] {
            let mut filter = enabled(LadderConfig {
                cutoff: 12_000.0,
                resonance,
                ..LadderConfig::default()
            });
            for i in 0..48000 {
                let x = 0.5 * (2.0 * PI * 440.0 * i as f64 / SAMPLE_RATE).sin();
                let y = filter.process(0, x, 0.0);
                assert!(
                    y.is_finite() && y.abs() < 10.0,
                    "resonance {}, sample {} = {}",
                    resonance,
                    i,
                    y
                );
            }
        }
    }

    #[test]
    fn test_linear_path_stable_under_full_modulation() {
        let mut filter = enabled(LadderConfig {
            cutoff: 5_000.0,
            resonance: 1.0,
            env_amount: 4.0,
            ..LadderConfig::default()
        });
        for i in 0..48000 {
            let x = if i % 64 < 32 { 1.0 } else { -1.0 };
            let y = filter.process(0, x, 1.0);
            assert!(y.is_finite() && y.abs() < 100.0, "sample {} = {}", i, y);
        }
    }

    #[test]
    fn test_disabled_passes_through() {
        let mut filter = LadderFilter::new(LadderConfig::default(), SAMPLE_RATE);
        assert_eq!(filter.process(0, -0.4, 1.0), -0.4);
    }

    #[test]
    fn test_dc_gain_without_resonance() {
        let mut filter = enabled(LadderConfig {
            resonance: 0.0,
            ..LadderConfig::default()
        });
        let mut out = 0.0;
        for _ in 0..48000 {
            out = filter.process(0, 1.0, 0.0);
        }
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resonance_lowers_dc_gain() {
        // Linear ladder settles at in / (1 + feedback)
        let mut filter = enabled(LadderConfig {
            resonance: 0.25,
            ..LadderConfig::default()
        });
        let mut out = 0.0;
        for _ in 0..48000 {
            out = filter.process(0, 1.0, 0.0);
        }
        assert!((out - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nonlinear_path_stays_bounded() {
        let mut filter = enabled(LadderConfig {
            resonance: 1.0,
            drive: 10.0,
            ..LadderConfig::default()
        });
        for i in 0..48000 {
            let x = if i % 100 < 50 { 1.0 } else { -1.0 };
            let y = filter.process(0, x, 0.0);
            assert!(y.is_finite());
            assert!(y.abs() <= 1.0, "sample {} = {}", i, y);
        }
    }

    #[test]
    fn test_cutoff_modulation_changes_response() {
        let mut filter = enabled(LadderConfig::default());
        let a = filter.process(0, 1.0, 0.0);
        let b = filter.process(1, 1.0, 2.0);
        assert!(b > a, "opening the filter should pass more signal");
    }

    #[test]
    fn test_init_state_and_reenable() {
        let mut filter = enabled(LadderConfig::default());
        for _ in 0..10 {
            filter.process(4, 1.0, 0.0);
        }
        assert_ne!(filter.state(4), &LadderState::default());
        filter.init_state(4);
        assert_eq!(filter.state(4), &LadderState::default());

        filter.process(5, 1.0, 0.0);
        filter.set_enabled(false);
        filter.set_enabled(true);
        assert_eq!(filter.state(5), &LadderState::default());
    }

    #[test]
    fn test_cutoff_setting_kept_across_sample_rates() {
        let mut filter = LadderFilter::new(
            LadderConfig {
                cutoff: 20_000.0,
                ..LadderConfig::default()
            },
            44_100.0,
        );
        assert_eq!(filter.config.cutoff, 20_000.0);

        filter.set_sample_rate(8_000.0);
        filter.set_sample_rate(SAMPLE_RATE);
        assert_eq!(filter.config.cutoff, 20_000.0);
        assert_eq!(filter.coefficient(), ladder_coefficient(20_000.0, SAMPLE_RATE));
    }

    #[test]
    fn test_update_coefficients_clamps_drive() {
        let mut filter = LadderFilter::new(LadderConfig::default(), SAMPLE_RATE);
        filter.config.drive = 50.0;
        filter.config.env_amount = -9.0;
        filter.update_coefficients();
        assert_eq!(filter.config.drive, 10.0);
        assert_eq!(filter.config.env_amount, -4.0);
    }
}

//! ADSR envelope state machine, one instance per envelope slot.
//!
//! Like the oscillators, an [`Envelope`] holds the slot's shared timing
//! configuration plus per-voice state arrays indexed by voice slot. Every
//! stage is a linear ramp driven by a per-sample progress increment that is
//! derived from the stage time and the sample rate.
//!
//! ```text
//! Idle -> Attack -> Decay -> Sustain -> Release -> Idle
//!           \________\__________\_______/
//!                 trigger_release
//! ```

use crate::MAX_VOICES;

/// Longest stage time in milliseconds.
pub const MAX_STAGE_MS: f64 = 10_000.0;

/// Absorbs floating-point drift when summing increments, so a stage of N
/// samples completes on exactly the Nth sample.
const STAGE_EPSILON: f64 = 1e-9;

/// Current stage of one voice's envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStatus {
    /// Not sounding; the only state in which a voice may be retired
    #[default]
    Idle,
    /// Ramping from 0.0 up to 1.0
    Attack,
    /// Ramping from 1.0 down to the sustain level
    Decay,
    /// Holding at the sustain level until released
    Sustain,
    /// Ramping from the level at release time down to 0.0
    Release,
}

/// Timing and level settings shared by every voice of an envelope slot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvelopeConfig {
    /// Attack time in milliseconds
    pub attack_ms: f64,
    /// Decay time in milliseconds
    pub decay_ms: f64,
    /// Sustain level, 0.0 to 1.0
    pub sustain: f64,
    /// Release time in milliseconds
    pub release_ms: f64,
}

impl EnvelopeConfig {
    /// Creates a config, clamping times to 0-10000 ms and sustain to 0.0-1.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use murmur::envelope::EnvelopeConfig;
    ///
    /// let pluck = EnvelopeConfig::new(1.0, 150.0, 0.0, 80.0);
    /// assert_eq!(pluck.sustain, 0.0);
    /// ```
    pub fn new(attack_ms: f64, decay_ms: f64, sustain: f64, release_ms: f64) -> Self {
        Self {
            attack_ms: attack_ms.clamp(0.0, MAX_STAGE_MS),
            decay_ms: decay_ms.clamp(0.0, MAX_STAGE_MS),
            sustain: sustain.clamp(0.0, 1.0),
            release_ms: release_ms.clamp(0.0, MAX_STAGE_MS),
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self::new(10.0, 100.0, 0.7, 200.0)
    }
}

/// Converts a stage time to a per-sample progress increment.
///
/// A zero-length stage completes on the first sample it is processed.
pub fn stage_increment(ms: f64, sample_rate: f64) -> f64 {
    let samples = ms * 0.001 * sample_rate;
    if samples <= 0.0 || !samples.is_finite() {
        1.0
    } else {
        1.0 / samples
    }
}

/// ADSR envelope slot with per-voice state.
///
/// After changing `config` times or sustain, call
/// [`update_increments`](Self::update_increments) so the derived increments
/// follow.
///
/// # Examples
///
/// ```
/// use murmur::envelope::{Envelope, EnvelopeConfig, EnvelopeStatus};
///
/// let mut env = Envelope::new(EnvelopeConfig::new(10.0, 50.0, 0.5, 20.0), 48000.0);
/// env.trigger(0);
///
/// for _ in 0..480 {
///     env.process(0);
/// }
/// assert_eq!(env.status(0), EnvelopeStatus::Decay);
///
/// env.trigger_release(0);
/// while env.status(0) != EnvelopeStatus::Idle {
///     env.process(0);
/// }
/// assert_eq!(env.level(0), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Stage times and sustain level
    pub config: EnvelopeConfig,
    sample_rate: f64,

    attack_increment: f64,
    decay_increment: f64,
    release_increment: f64,

    statuses: [EnvelopeStatus; MAX_VOICES],
    levels: [f64; MAX_VOICES],
    progress: [f64; MAX_VOICES],
    release_start_levels: [f64; MAX_VOICES],
}

impl Envelope {
    /// Creates an envelope slot with every voice idle.
    pub fn new(config: EnvelopeConfig, sample_rate: f64) -> Self {
        let mut env = Self {
            config,
            sample_rate,
            attack_increment: 1.0,
            decay_increment: 1.0,
            release_increment: 1.0,
            statuses: [EnvelopeStatus::Idle; MAX_VOICES],
            levels: [0.0; MAX_VOICES],
            progress: [0.0; MAX_VOICES],
            release_start_levels: [0.0; MAX_VOICES],
        };
        env.update_increments();
        env
    }

    /// Recomputes the per-sample increments from `config` and the sample
    /// rate, clamping the config into range first.
    pub fn update_increments(&mut self) {
        self.config = EnvelopeConfig::new(
            self.config.attack_ms,
            self.config.decay_ms,
            self.config.sustain,
            self.config.release_ms,
        );
        self.attack_increment = stage_increment(self.config.attack_ms, self.sample_rate);
        self.decay_increment = stage_increment(self.config.decay_ms, self.sample_rate);
        self.release_increment = stage_increment(self.config.release_ms, self.sample_rate);
    }

    /// Changes the sample rate and recomputes the increments.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_increments();
    }

    /// Starts `voice` from the beginning of the attack stage.
    pub fn trigger(&mut self, voice: usize) {
        self.statuses[voice] = EnvelopeStatus::Attack;
        self.levels[voice] = 0.0;
        self.progress[voice] = 0.0;
        self.release_start_levels[voice] = 0.0;
    }

    /// Moves `voice` into the release stage, ramping down from whatever
    /// level it has reached. Does nothing if the voice is idle.
    pub fn trigger_release(&mut self, voice: usize) {
        if self.statuses[voice] == EnvelopeStatus::Idle {
            return;
        }
        self.release_start_levels[voice] = self.levels[voice];
        self.statuses[voice] = EnvelopeStatus::Release;
        self.progress[voice] = 0.0;
    }

    /// Silences `voice` immediately.
    pub fn reset(&mut self, voice: usize) {
        self.statuses[voice] = EnvelopeStatus::Idle;
        self.levels[voice] = 0.0;
        self.progress[voice] = 0.0;
        self.release_start_levels[voice] = 0.0;
    }

    /// Advances `voice` by one sample and returns its new level.
    #[inline]
    pub fn process(&mut self, voice: usize) -> f64 {
        let sustain = self.config.sustain;
        let progress = &mut self.progress[voice];
        let level = &mut self.levels[voice];
        let status = &mut self.statuses[voice];

        match *status {
            EnvelopeStatus::Attack => {
                *progress += self.attack_increment;
                if *progress + STAGE_EPSILON >= 1.0 {
                    *status = EnvelopeStatus::Decay;
                    *progress = 0.0;
                    *level = 1.0;
                } else {
                    *level = *progress;
                }
            }
            EnvelopeStatus::Decay => {
                *progress += self.decay_increment;
                if *progress + STAGE_EPSILON >= 1.0 {
                    *status = EnvelopeStatus::Sustain;
                    *progress = 0.0;
                    *level = sustain;
                } else {
                    *level = 1.0 - *progress * (1.0 - sustain);
                }
            }
            EnvelopeStatus::Sustain => {
                *level = sustain;
            }
            EnvelopeStatus::Release => {
                *progress += self.release_increment;
                if *progress + STAGE_EPSILON >= 1.0 {
                    *status = EnvelopeStatus::Idle;
                    *progress = 0.0;
                    *level = 0.0;
                } else {
                    *level = self.release_start_levels[voice] * (1.0 - *progress);
                }
            }
            EnvelopeStatus::Idle => {
                *level = 0.0;
            }
        }

        *level
    }

    /// Current stage of `voice`.
    pub fn status(&self, voice: usize) -> EnvelopeStatus {
        self.statuses[voice]
    }

    /// Returns true if `voice` is idle.
    pub fn is_idle(&self, voice: usize) -> bool {
        self.statuses[voice] == EnvelopeStatus::Idle
    }

    /// Level of `voice` as of the last processed sample.
    pub fn level(&self, voice: usize) -> f64 {
        self.levels[voice]
    }

    /// Progress through the current stage of `voice`, in [0.0, 1.0).
    pub fn progress(&self, voice: usize) -> f64 {
        self.progress[voice]
    }

    pub fn attack_increment(&self) -> f64 {
        self.attack_increment
    }

    pub fn decay_increment(&self) -> f64 {
        self.decay_increment
    }

    pub fn release_increment(&self) -> f64 {
        self.release_increment
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 48000.0;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn run_until_idle(env: &mut Envelope, voice: usize, limit: usize) -> usize {
        let mut count = 0;
        while env.status(voice) != EnvelopeStatus::Idle && count < limit {
            env.process(voice);
            count += 1;
        }
        count
    }

    #[test]
    fn test_increment_from_time() {
        let env = Envelope::new(EnvelopeConfig::new(10.0, 100.0, 0.7, 200.0), SAMPLE_RATE);
        assert!(approx_eq(env.attack_increment(), 1.0 / 480.0, 1e-12));
        assert!(approx_eq(env.decay_increment(), 1.0 / 4800.0, 1e-12));
        assert!(approx_eq(env.release_increment(), 1.0 / 9600.0, 1e-12));
    }

    #[test]
    fn test_attack_completes_on_exact_sample() {
        let mut env = Envelope::new(EnvelopeConfig::new(10.0, 100.0, 0.7, 200.0), SAMPLE_RATE);
        env.trigger(0);

        for _ in 0..479 {
            env.process(0);
            assert_eq!(env.status(0), EnvelopeStatus::Attack);
        }

        let level = env.process(0);
        assert_eq!(env.status(0), EnvelopeStatus::Decay);
        assert_eq!(level, 1.0);
        assert_eq!(env.progress(0), 0.0);
    }

    #[test]
    fn test_full_cycle() {
        let mut env = Envelope::new(EnvelopeConfig::new(1.0, 1.0, 0.5, 1.0), SAMPLE_RATE);
        env.trigger(0);

        // 48 samples attack + 48 decay
        for _ in 0..96 {
            env.process(0);
        }
        assert_eq!(env.status(0), EnvelopeStatus::Sustain);
        assert_eq!(env.level(0), 0.5);

        for _ in 0..1000 {
            assert_eq!(env.process(0), 0.5);
        }

        env.trigger_release(0);
        let samples = run_until_idle(&mut env, 0, 1000);
        assert_eq!(samples, 48);
        assert_eq!(env.level(0), 0.0);
    }

    #[test]
    fn test_levels_stay_in_range() {
        let mut env = Envelope::new(EnvelopeConfig::new(3.0, 7.0, 0.3, 5.0), SAMPLE_RATE);
        env.trigger(0);
        for i in 0..2000 {
            if i == 800 {
                env.trigger_release(0);
            }
            let level = env.process(0);
            assert!((0.0..=1.0).contains(&level));
            assert!((0.0..1.0).contains(&env.progress(0)));
        }
    }

    #[test]
    fn test_release_during_attack_starts_below_peak() {
        let mut env = Envelope::new(EnvelopeConfig::new(10.0, 100.0, 0.7, 10.0), SAMPLE_RATE);
        env.trigger(0);
        for _ in 0..240 {
            env.process(0);
        }
        let captured = env.level(0);
        assert!(approx_eq(captured, 0.5, 1e-9));

        env.trigger_release(0);
        assert_eq!(env.status(0), EnvelopeStatus::Release);

        let first = env.process(0);
        assert!(first < captured);
        assert!(approx_eq(first, captured * (1.0 - 1.0 / 480.0), 1e-9));
    }

    #[test]
    fn test_release_from_idle_is_noop() {
        let mut env = Envelope::new(EnvelopeConfig::default(), SAMPLE_RATE);
        env.trigger_release(5);
        assert_eq!(env.status(5), EnvelopeStatus::Idle);
        assert_eq!(env.process(5), 0.0);
    }

    #[test]
    fn test_zero_length_stages_are_instant() {
        let mut env = Envelope::new(EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0), SAMPLE_RATE);
        env.trigger(0);
        assert_eq!(env.process(0), 1.0);
        assert_eq!(env.status(0), EnvelopeStatus::Decay);
        assert_eq!(env.process(0), 1.0);
        assert_eq!(env.status(0), EnvelopeStatus::Sustain);

        env.trigger_release(0);
        assert_eq!(env.process(0), 0.0);
        assert_eq!(env.status(0), EnvelopeStatus::Idle);
    }

    #[test]
    fn test_update_increments_after_config_change() {
        let mut env = Envelope::new(EnvelopeConfig::default(), SAMPLE_RATE);
        env.config.attack_ms = 20.0;
        env.update_increments();
        assert!(approx_eq(env.attack_increment(), 1.0 / 960.0, 1e-12));

        env.set_sample_rate(96000.0);
        assert!(approx_eq(env.attack_increment(), 1.0 / 1920.0, 1e-12));
    }

    #[test]
    fn test_config_is_clamped() {
        let config = EnvelopeConfig::new(-5.0, 20_000.0, 1.5, 50.0);
        assert_eq!(config.attack_ms, 0.0);
        assert_eq!(config.decay_ms, MAX_STAGE_MS);
        assert_eq!(config.sustain, 1.0);
    }

    #[test]
    fn test_retrigger_resets_voice() {
        let mut env = Envelope::new(EnvelopeConfig::default(), SAMPLE_RATE);
        env.trigger(2);
        for _ in 0..100 {
            env.process(2);
        }
        env.trigger(2);
        assert_eq!(env.level(2), 0.0);
        assert_eq!(env.progress(2), 0.0);
        assert_eq!(env.status(2), EnvelopeStatus::Attack);
        assert!(env.is_idle(3));
    }
}

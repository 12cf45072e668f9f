//! Per-voice filters: a TPT state-variable filter and a four-stage ladder.
//!
//! Both topologies share the same shape: a cold configuration (cutoff,
//! resonance, envelope amount, ...) with coefficients cached from it, and hot
//! per-voice state registers indexed by voice slot. Cutoff modulation arrives
//! as a bipolar value that is scaled by `env_amount` and applied in octaves:
//!
//! ```text
//! cutoff' = cutoff * 2^(env_amount * mod)
//! ```
//!
//! While the displacement stays within `mod_epsilon` octaves the cached
//! coefficients are reused; above it they are recomputed for that sample.

pub mod ladder;
pub mod svf;

pub use ladder::{LadderConfig, LadderFilter, LadderState};
pub use svf::{SvfCoeffs, SvfConfig, SvfFilter, SvfMode, SvfOutputs, SvfState};

use crate::dsp::fast_exp2;

/// Lowest cutoff frequency in Hz.
pub const MIN_CUTOFF: f64 = 20.0;
/// Highest settable cutoff frequency in Hz.
pub const MAX_CUTOFF: f64 = 20_000.0;
/// Cutoffs are kept below this fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f64 = 0.45;
/// Range of the cutoff modulation depth, in octaves per unit of modulation.
pub const ENV_AMOUNT_RANGE: (f64, f64) = (-4.0, 4.0);
/// Default threshold, in octaves, above which modulation forces a
/// coefficient recompute.
pub const DEFAULT_MOD_EPSILON: f64 = 0.001;

/// Clamps a cutoff into [20 Hz, 0.45 * sample_rate].
///
/// # Examples
///
/// ```
/// use murmur::filters::clamp_cutoff;
///
/// assert_eq!(clamp_cutoff(5.0, 48000.0), 20.0);
/// assert_eq!(clamp_cutoff(30000.0, 48000.0), 21600.0);
/// ```
pub fn clamp_cutoff(cutoff: f64, sample_rate: f64) -> f64 {
    let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF);
    if cutoff.is_nan() {
        return MIN_CUTOFF;
    }
    cutoff.clamp(MIN_CUTOFF, max)
}

/// Clamps a stored cutoff setting into [20 Hz, 20 kHz], independent of the
/// sample rate. The rate-dependent limit is applied only when coefficients
/// are derived, so a setting survives sample-rate changes.
///
/// ```
/// use murmur::filters::clamp_cutoff_setting;
///
/// assert_eq!(clamp_cutoff_setting(20000.0), 20000.0);
/// assert_eq!(clamp_cutoff_setting(f64::NAN), 20.0);
/// ```
pub fn clamp_cutoff_setting(cutoff: f64) -> f64 {
    if cutoff.is_nan() {
        return MIN_CUTOFF;
    }
    cutoff.clamp(MIN_CUTOFF, MAX_CUTOFF)
}

/// Applies an octave displacement to a base cutoff.
#[inline]
pub fn modulated_cutoff(cutoff: f64, octaves: f64) -> f64 {
    cutoff * fast_exp2(octaves)
}

/// Returns true if a displacement of `octaves` is large enough to need
/// fresh coefficients.
#[inline]
pub(crate) fn exceeds_epsilon(octaves: f64, epsilon: f64) -> bool {
    octaves.abs() > epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_cutoff() {
        assert_eq!(clamp_cutoff(1000.0, 48000.0), 1000.0);
        assert_eq!(clamp_cutoff(0.0, 48000.0), MIN_CUTOFF);
        assert_eq!(clamp_cutoff(f64::NAN, 48000.0), MIN_CUTOFF);
        assert_eq!(clamp_cutoff(f64::INFINITY, 44100.0), 44100.0 * 0.45);
    }

    #[test]
    fn test_clamp_cutoff_setting_ignores_sample_rate() {
        assert_eq!(clamp_cutoff_setting(20_000.0), MAX_CUTOFF);
        assert_eq!(clamp_cutoff_setting(90_000.0), MAX_CUTOFF);
        assert_eq!(clamp_cutoff_setting(5.0), MIN_CUTOFF);
        assert_eq!(clamp_cutoff_setting(440.0), 440.0);
    }

    #[test]
    fn test_modulated_cutoff_octaves() {
        assert_eq!(modulated_cutoff(1000.0, 0.0), 1000.0);
        assert_eq!(modulated_cutoff(1000.0, 1.0), 2000.0);
        assert_eq!(modulated_cutoff(1000.0, -2.0), 250.0);
    }

    #[test]
    fn test_epsilon_is_magnitude() {
        assert!(!exceeds_epsilon(0.0005, DEFAULT_MOD_EPSILON));
        assert!(exceeds_epsilon(0.01, DEFAULT_MOD_EPSILON));
        assert!(exceeds_epsilon(-0.01, DEFAULT_MOD_EPSILON));
    }
}

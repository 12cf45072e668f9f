//! Scalar DSP helpers shared by the engine components.
//!
//! Everything here is a pure function over `f64` with no state, so it can be
//! called from the render loop freely.

pub mod waveform;

pub use waveform::Waveform;

/// MIDI note number of the tuning reference (A4).
pub const ROOT_NOTE_MIDI: u8 = 69;

/// Frequency of the tuning reference in Hz.
pub const ROOT_NOTE_FREQ: f64 = 440.0;

/// Converts a MIDI note number to frequency in Hz using equal temperament.
///
/// Uses the formula: f = 440 * 2^((midi - 69) / 12)
///
/// # Examples
///
/// ```
/// use murmur::dsp::midi_to_freq;
///
/// assert!((midi_to_freq(69) - 440.0).abs() < 1e-9);
/// assert!((midi_to_freq(60) - 261.63).abs() < 0.01);
/// ```
pub fn midi_to_freq(midi_note: u8) -> f64 {
    ROOT_NOTE_FREQ * 2.0_f64.powf((midi_note as f64 - ROOT_NOTE_MIDI as f64) / 12.0)
}

/// Polynomial approximation of `2^x`.
///
/// Splits `x` into a nearest integer and a fraction in [-0.5, 0.5],
/// evaluates a 5th-order polynomial for the fraction and adds the integer
/// part straight into the exponent bits. Relative error is below 1e-5, which
/// is inaudible for pitch and cutoff modulation, and integer inputs are exact.
pub fn fast_exp2(x: f64) -> f64 {
    let x = x.clamp(-60.0, 60.0);
    let xi = x.round();
    let xf = x - xi;

    let p = 1.0
        + xf * (0.693_147_180_6
            + xf * (0.240_226_506_9
                + xf * (0.055_504_108_7 + xf * (0.009_618_129_1 + xf * 0.001_333_355_8))));

    let bits = (p.to_bits() as i64 + ((xi as i64) << 52)) as u64;
    f64::from_bits(bits)
}

/// Converts a pitch offset in semitones to a frequency ratio.
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    fast_exp2(semitones / 12.0)
}

/// Protective soft clip: a rational approximation of `tanh`.
///
/// `x(27 + x²) / (27 + 9x²)` matches `tanh` closely inside ±3 and reaches
/// exactly ±1 at ±3, so the input is clamped there first. Non-finite input
/// maps to silence. The output is always within [-1, 1].
///
/// # Examples
///
/// ```
/// use murmur::dsp::soft_clip;
///
/// assert_eq!(soft_clip(0.0), 0.0);
/// assert_eq!(soft_clip(100.0), 1.0);
/// assert_eq!(soft_clip(f64::NAN), 0.0);
/// ```
pub fn soft_clip(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    let x = x.clamp(-3.0, 3.0);
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq() {
        assert!((midi_to_freq(69) - 440.0).abs() < 1e-9);
        assert!((midi_to_freq(81) - 880.0).abs() < 1e-9);
        assert!((midi_to_freq(72) - 523.25).abs() < 0.01);
    }

    #[test]
    fn test_fast_exp2_accuracy() {
        for i in -80..=80 {
            let x = i as f64 * 0.05;
            let exact = x.exp2();
            let approx = fast_exp2(x);
            assert!(
                ((approx - exact) / exact).abs() < 1e-4,
                "2^{} = {} but got {}",
                x,
                exact,
                approx
            );
        }
    }

    #[test]
    fn test_fast_exp2_identity() {
        assert_eq!(fast_exp2(0.0), 1.0);
        assert_eq!(fast_exp2(1.0), 2.0);
        assert_eq!(fast_exp2(-1.0), 0.5);
        assert_eq!(fast_exp2(3.0), 8.0);
    }

    #[test]
    fn test_semitones_to_ratio() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-3);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-3);
        assert_eq!(semitones_to_ratio(0.0), 1.0);
    }

    #[test]
    fn test_soft_clip_bounds() {
        for i in -1000..=1000 {
            let y = soft_clip(i as f64 * 0.01);
            assert!((-1.0..=1.0).contains(&y));
        }
        assert_eq!(soft_clip(3.0), 1.0);
        assert_eq!(soft_clip(-3.0), -1.0);
        assert_eq!(soft_clip(f64::INFINITY), 1.0);
        assert_eq!(soft_clip(f64::NEG_INFINITY), -1.0);
    }

    #[test]
    fn test_soft_clip_tracks_tanh() {
        for i in -20..=20 {
            let x = i as f64 * 0.1;
            assert!((soft_clip(x) - x.tanh()).abs() < 0.03);
        }
    }
}

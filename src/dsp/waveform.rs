//! Waveform shapes with PolyBLEP anti-aliasing.
//!
//! All functions take a normalized phase in [0.0, 1.0). The band-limited
//! variants also take the phase increment (frequency / sample rate), which
//! sets the width of the polynomial correction applied around each
//! discontinuity.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The waveform an oscillator or LFO produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Waveform {
    /// Pure sine, band-limited as-is
    #[default]
    Sine = 0,
    /// Rising sawtooth from -1.0 to 1.0
    Saw = 1,
    /// 50% duty cycle square
    Square = 2,
    /// Symmetric triangle, starting at -1.0
    Triangle = 3,
}

impl Waveform {
    /// Number of waveform variants.
    pub const COUNT: usize = 4;

    /// Returns the waveform for a numeric index, or `None` if out of range.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Waveform::Sine),
            1 => Some(Waveform::Saw),
            2 => Some(Waveform::Square),
            3 => Some(Waveform::Triangle),
            _ => None,
        }
    }

    /// Returns the numeric index of this waveform.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Returns the lowercase name of this waveform.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
        }
    }

    /// Evaluates the band-limited waveform at `phase`.
    ///
    /// Saw and square get PolyBLEP edge correction sized by `increment`;
    /// sine and triangle are returned as-is.
    ///
    /// # Examples
    ///
    /// ```
    /// use murmur::dsp::Waveform;
    ///
    /// assert!(Waveform::Sine.sample(0.25, 0.01) > 0.999);
    /// assert!(Waveform::Saw.sample(0.5, 0.01).abs() < 1e-12);
    /// ```
    pub fn sample(self, phase: f64, increment: f64) -> f64 {
        match self {
            Waveform::Sine => sine(phase),
            Waveform::Saw => saw(phase, increment),
            Waveform::Square => square(phase, increment, 0.5),
            Waveform::Triangle => triangle(phase),
        }
    }

    /// Evaluates the naive (uncorrected) waveform at `phase`.
    ///
    /// Used for low-frequency modulation where aliasing is irrelevant and the
    /// hard edges are wanted.
    pub fn sample_naive(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => sine(phase),
            Waveform::Saw => saw_naive(phase),
            Waveform::Square => square_naive(phase, 0.5),
            Waveform::Triangle => triangle(phase),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        match s.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Waveform::Sine),
            "saw" | "sawtooth" => Ok(Waveform::Saw),
            "square" | "sqr" => Ok(Waveform::Square),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            _ => Err(ParseError::InvalidWaveform(s.to_string())),
        }
    }
}

/// Polynomial band-limited step residual.
///
/// Non-zero only within one `increment` either side of a discontinuity at
/// phase 0.0 (wrapping to 1.0). Adding it to a rising edge, or subtracting
/// it from a falling edge, rounds the step off over two samples.
pub fn poly_blep(phase: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return 0.0;
    }

    if phase < increment {
        // Just past the discontinuity
        let t = phase / increment;
        t + t - t * t - 1.0
    } else if phase > 1.0 - increment {
        // Approaching the discontinuity
        let t = (phase - 1.0) / increment;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

/// Sine wave.
pub fn sine(phase: f64) -> f64 {
    (phase * TAU).sin()
}

/// Naive sawtooth rising from -1.0 to 1.0.
pub fn saw_naive(phase: f64) -> f64 {
    2.0 * phase - 1.0
}

/// Sawtooth with PolyBLEP correction at the wrap.
pub fn saw(phase: f64, increment: f64) -> f64 {
    saw_naive(phase) - poly_blep(phase, increment)
}

/// Naive pulse: high while `phase < pulse_width`.
pub fn square_naive(phase: f64, pulse_width: f64) -> f64 {
    if phase < pulse_width { 1.0 } else { -1.0 }
}

/// Pulse with PolyBLEP correction on both the rising and falling edge.
pub fn square(phase: f64, increment: f64, pulse_width: f64) -> f64 {
    let mut value = square_naive(phase, pulse_width);

    // Rising edge at phase 0.0
    value += poly_blep(phase, increment);

    // Falling edge at pulse_width
    let mut falling = phase - pulse_width;
    if falling < 0.0 {
        falling += 1.0;
    }
    value -= poly_blep(falling, increment);

    value
}

/// Triangle, -1.0 at phase 0.0 and 1.0 at phase 0.5. Its slope discontinuity
/// is left uncorrected.
pub fn triangle(phase: f64) -> f64 {
    1.0 - 4.0 * (phase - 0.5).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_index_round_trip() {
        for i in 0..Waveform::COUNT as u8 {
            let waveform = Waveform::from_index(i).unwrap();
            assert_eq!(waveform.index(), i);
        }
        assert_eq!(Waveform::from_index(4), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("sine".parse::<Waveform>().unwrap(), Waveform::Sine);
        assert_eq!("SAW".parse::<Waveform>().unwrap(), Waveform::Saw);
        assert_eq!("tri".parse::<Waveform>().unwrap(), Waveform::Triangle);
        assert!(matches!("".parse::<Waveform>(), Err(ParseError::Empty)));
        assert!(matches!(
            "noise".parse::<Waveform>(),
            Err(ParseError::InvalidWaveform(_))
        ));
    }

    #[test]
    fn test_poly_blep_is_zero_away_from_edges() {
        assert_eq!(poly_blep(0.5, 0.01), 0.0);
        assert_eq!(poly_blep(0.2, 0.01), 0.0);
        assert_eq!(poly_blep(0.3, 0.0), 0.0);
    }

    #[test]
    fn test_poly_blep_edges() {
        // Right at the discontinuity the residual is a full half step
        assert!((poly_blep(0.0, 0.01) + 1.0).abs() < EPSILON);
        // And it fades to zero at the edge of the correction window
        assert!(poly_blep(0.0099999, 0.01).abs() < 1e-4);
        assert!(poly_blep(0.9900001, 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_saw_smooths_the_wrap() {
        let inc = 0.01;
        // The naive saw jumps from +1 to -1; the corrected one passes through 0
        assert!(saw(0.0, inc).abs() < EPSILON);
        assert!((saw(0.5, inc)).abs() < EPSILON);
    }

    #[test]
    fn test_saw_and_square_stay_bounded() {
        let inc = 440.0 / 48000.0;
        let mut phase = 0.0;
        for _ in 0..48000 {
            let s = saw(phase, inc);
            let q = square(phase, inc, 0.5);
            assert!(s.abs() <= 1.0 + EPSILON, "saw out of range: {}", s);
            assert!(q.abs() <= 1.0 + EPSILON, "square out of range: {}", q);
            phase += inc;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }
    }

    #[test]
    fn test_square_levels() {
        let inc = 0.001;
        assert!((square(0.25, inc, 0.5) - 1.0).abs() < EPSILON);
        assert!((square(0.75, inc, 0.5) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_triangle_shape() {
        assert!((triangle(0.0) + 1.0).abs() < EPSILON);
        assert!((triangle(0.25)).abs() < EPSILON);
        assert!((triangle(0.5) - 1.0).abs() < EPSILON);
        assert!((triangle(0.75)).abs() < EPSILON);
    }

    #[test]
    fn test_sine_quadrants() {
        assert!(sine(0.0).abs() < EPSILON);
        assert!((sine(0.25) - 1.0).abs() < EPSILON);
        assert!((sine(0.75) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_naive_shapes() {
        assert_eq!(Waveform::Square.sample_naive(0.1), 1.0);
        assert_eq!(Waveform::Square.sample_naive(0.6), -1.0);
        assert!((Waveform::Saw.sample_naive(0.0) + 1.0).abs() < EPSILON);
    }
}

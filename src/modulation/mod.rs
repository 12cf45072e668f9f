//! Modulation matrix: routes sources to destinations with per-route depth.
//!
//! The matrix runs in three passes around every engine block:
//!
//! 1. [`ModMatrix::clear_steps`] zeroes the interpolation steps.
//! 2. [`ModMatrix::evaluate`] (the pre-pass, once per active voice) sums
//!    `source * amount` over all routes into each destination and derives a
//!    per-sample step for the interpolated destinations.
//! 3. [`ModMatrix::post_pass`] keeps this block's values as the baseline for
//!    the next one.
//!
//! Inside the block, [`ModMatrix::value_at`] returns the ramped value for
//! interpolated destinations (pitch and cutoff) and the block value for the
//! rest (resonance and mix), so a block-rate source driving pitch glides
//! instead of stepping.

pub mod lfo;

pub use lfo::{LFO_COUNT, LfoBank, LfoConfig, NoiseSource};

use std::fmt;
use std::str::FromStr;

use crate::MAX_VOICES;
use crate::error::ParseError;

/// Maximum number of routes in the matrix.
pub const MAX_MOD_ROUTES: usize = 16;

/// Something that produces a modulation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ModSource {
    /// Amplitude envelope level, 0.0 to 1.0
    AmpEnv = 0,
    /// Filter envelope level, 0.0 to 1.0
    FilterEnv = 1,
    /// General-purpose envelope level, 0.0 to 1.0
    ModEnv = 2,
    /// First LFO, -1.0 to 1.0
    Lfo1 = 3,
    /// Second LFO, -1.0 to 1.0
    Lfo2 = 4,
    /// Third LFO, -1.0 to 1.0
    Lfo3 = 5,
    /// Note-on velocity, 0.0 to 1.0
    Velocity = 6,
    /// White noise, sampled once per block, -1.0 to 1.0
    Noise = 7,
}

impl ModSource {
    /// Number of sources.
    pub const COUNT: usize = 8;

    /// Every source, in index order.
    pub const ALL: [ModSource; Self::COUNT] = [
        ModSource::AmpEnv,
        ModSource::FilterEnv,
        ModSource::ModEnv,
        ModSource::Lfo1,
        ModSource::Lfo2,
        ModSource::Lfo3,
        ModSource::Velocity,
        ModSource::Noise,
    ];

    /// Returns the source for a numeric index, or `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this source in a source value array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used by control surfaces.
    pub fn name(self) -> &'static str {
        match self {
            ModSource::AmpEnv => "ampEnv",
            ModSource::FilterEnv => "filterEnv",
            ModSource::ModEnv => "modEnv",
            ModSource::Lfo1 => "lfo1",
            ModSource::Lfo2 => "lfo2",
            ModSource::Lfo3 => "lfo3",
            ModSource::Velocity => "velocity",
            ModSource::Noise => "noise",
        }
    }
}

impl fmt::Display for ModSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModSource {
    type Err = ParseError;

    /// Parses a source name, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// use murmur::modulation::ModSource;
    ///
    /// assert_eq!("lfo2".parse::<ModSource>().unwrap(), ModSource::Lfo2);
    /// assert_eq!("AMPENV".parse::<ModSource>().unwrap(), ModSource::AmpEnv);
    /// assert!("wheel".parse::<ModSource>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        Self::ALL
            .iter()
            .find(|src| src.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseError::InvalidModSource(s.to_string()))
    }
}

/// Something a modulation value is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ModDest {
    /// SVF cutoff, octaves
    SvfCutoff = 0,
    /// Ladder cutoff, octaves
    LadderCutoff = 1,
    /// SVF resonance, linear
    SvfResonance = 2,
    /// Ladder resonance, linear
    LadderResonance = 3,
    /// Oscillator 1 pitch, semitones
    Osc1Pitch = 4,
    /// Oscillator 2 pitch, semitones
    Osc2Pitch = 5,
    /// Oscillator 3 pitch, semitones
    Osc3Pitch = 6,
    /// Sub oscillator pitch, semitones
    SubOscPitch = 7,
    /// Oscillator 1 mix level, linear
    Osc1Mix = 8,
    /// Oscillator 2 mix level, linear
    Osc2Mix = 9,
    /// Oscillator 3 mix level, linear
    Osc3Mix = 10,
    /// Sub oscillator mix level, linear
    SubOscMix = 11,
}

impl ModDest {
    /// Number of destinations.
    pub const COUNT: usize = 12;

    /// Every destination, in index order.
    pub const ALL: [ModDest; Self::COUNT] = [
        ModDest::SvfCutoff,
        ModDest::LadderCutoff,
        ModDest::SvfResonance,
        ModDest::LadderResonance,
        ModDest::Osc1Pitch,
        ModDest::Osc2Pitch,
        ModDest::Osc3Pitch,
        ModDest::SubOscPitch,
        ModDest::Osc1Mix,
        ModDest::Osc2Mix,
        ModDest::Osc3Mix,
        ModDest::SubOscMix,
    ];

    /// Pitch destinations in oscillator slot order (osc1, osc2, osc3, sub).
    pub const PITCH: [ModDest; 4] = [
        ModDest::Osc1Pitch,
        ModDest::Osc2Pitch,
        ModDest::Osc3Pitch,
        ModDest::SubOscPitch,
    ];

    /// Mix destinations in oscillator slot order (osc1, osc2, osc3, sub).
    pub const MIX: [ModDest; 4] = [
        ModDest::Osc1Mix,
        ModDest::Osc2Mix,
        ModDest::Osc3Mix,
        ModDest::SubOscMix,
    ];

    /// Returns the destination for a numeric index, or `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this destination in the per-destination arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used by control surfaces.
    pub fn name(self) -> &'static str {
        match self {
            ModDest::SvfCutoff => "svf.cutoff",
            ModDest::LadderCutoff => "ladder.cutoff",
            ModDest::SvfResonance => "svf.resonance",
            ModDest::LadderResonance => "ladder.resonance",
            ModDest::Osc1Pitch => "osc1.pitch",
            ModDest::Osc2Pitch => "osc2.pitch",
            ModDest::Osc3Pitch => "osc3.pitch",
            ModDest::SubOscPitch => "subOsc.pitch",
            ModDest::Osc1Mix => "osc1.mixLevel",
            ModDest::Osc2Mix => "osc2.mixLevel",
            ModDest::Osc3Mix => "osc3.mixLevel",
            ModDest::SubOscMix => "subOsc.mixLevel",
        }
    }

    /// Returns true for destinations that are ramped per sample.
    pub fn is_interpolated(self) -> bool {
        matches!(
            self,
            ModDest::SvfCutoff
                | ModDest::LadderCutoff
                | ModDest::Osc1Pitch
                | ModDest::Osc2Pitch
                | ModDest::Osc3Pitch
                | ModDest::SubOscPitch
        )
    }

    /// Bipolar limit of the summed modulation for this destination.
    pub fn limit(self) -> f64 {
        match self {
            ModDest::SvfCutoff | ModDest::LadderCutoff => 4.0,
            ModDest::Osc1Pitch | ModDest::Osc2Pitch | ModDest::Osc3Pitch | ModDest::SubOscPitch => {
                24.0
            }
            _ => 1.0,
        }
    }
}

impl fmt::Display for ModDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModDest {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        Self::ALL
            .iter()
            .find(|dest| dest.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseError::InvalidModDest(s.to_string()))
    }
}

/// One source-to-destination connection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModRoute {
    pub source: ModSource,
    pub dest: ModDest,
    /// Depth, in the destination's units per unit of source
    pub amount: f64,
}

impl ModRoute {
    pub fn new(source: ModSource, dest: ModDest, amount: f64) -> Self {
        Self {
            source,
            dest,
            amount,
        }
    }
}

/// Current values of every source for one voice.
pub type SourceValues = [f64; ModSource::COUNT];

type DestValues = [[f64; MAX_VOICES]; ModDest::COUNT];

/// The modulation matrix.
///
/// # Examples
///
/// ```
/// use murmur::modulation::{ModDest, ModMatrix, ModRoute, ModSource};
///
/// let mut matrix = ModMatrix::new();
/// assert!(matrix.add_route(ModRoute::new(ModSource::ModEnv, ModDest::Osc1Pitch, 12.0)));
///
/// let mut sources = [0.0; ModSource::COUNT];
/// sources[ModSource::ModEnv.index()] = 1.0;
///
/// matrix.clear_steps();
/// matrix.evaluate(0, &sources, 64);
///
/// // Pitch ramps from the previous block's 0.0 towards 12.0
/// assert_eq!(matrix.value_at(ModDest::Osc1Pitch, 0, 0), 0.0);
/// assert_eq!(matrix.value_at(ModDest::Osc1Pitch, 0, 32), 6.0);
///
/// matrix.post_pass();
/// assert_eq!(matrix.previous(ModDest::Osc1Pitch, 0), 12.0);
/// ```
#[derive(Debug, Clone)]
pub struct ModMatrix {
    routes: [ModRoute; MAX_MOD_ROUTES],
    count: usize,
    current: DestValues,
    previous: DestValues,
    steps: DestValues,
}

impl ModMatrix {
    /// Creates an empty matrix.
    pub fn new() -> Self {
        Self {
            routes: [ModRoute::new(ModSource::AmpEnv, ModDest::SvfCutoff, 0.0); MAX_MOD_ROUTES],
            count: 0,
            current: [[0.0; MAX_VOICES]; ModDest::COUNT],
            previous: [[0.0; MAX_VOICES]; ModDest::COUNT],
            steps: [[0.0; MAX_VOICES]; ModDest::COUNT],
        }
    }

    /// Appends a route. Returns `false` if the matrix already holds
    /// [`MAX_MOD_ROUTES`] routes or the amount is not finite.
    pub fn add_route(&mut self, route: ModRoute) -> bool {
        if self.count >= MAX_MOD_ROUTES || !route.amount.is_finite() {
            return false;
        }
        self.routes[self.count] = route;
        self.count += 1;
        true
    }

    /// Removes the route at `index` by moving the last route into its place.
    /// Route order is not preserved. Returns `false` if `index` is out of
    /// range.
    pub fn remove_route(&mut self, index: usize) -> bool {
        if index >= self.count {
            return false;
        }
        self.count -= 1;
        self.routes[index] = self.routes[self.count];
        true
    }

    /// Removes every route.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// The active routes.
    pub fn routes(&self) -> &[ModRoute] {
        &self.routes[..self.count]
    }

    /// Number of active routes.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if another route would be rejected.
    pub fn is_full(&self) -> bool {
        self.count >= MAX_MOD_ROUTES
    }

    /// Zeroes every interpolation step. Run at the start of each block.
    pub fn clear_steps(&mut self) {
        for row in self.steps.iter_mut() {
            row.fill(0.0);
        }
    }

    /// Pre-pass for one voice: sums every route into this block's
    /// destination values and derives the per-sample steps for interpolated
    /// destinations over `block_len` samples.
    pub fn evaluate(&mut self, voice: usize, sources: &SourceValues, block_len: usize) {
        for row in self.current.iter_mut() {
            row[voice] = 0.0;
        }

        for route in &self.routes[..self.count] {
            self.current[route.dest.index()][voice] += sources[route.source.index()] * route.amount;
        }

        let inv_len = if block_len > 0 { 1.0 / block_len as f64 } else { 0.0 };
        for dest in ModDest::ALL {
            let d = dest.index();
            let limit = dest.limit();
            let value = self.current[d][voice];
            self.current[d][voice] = if value.is_nan() { 0.0 } else { value.clamp(-limit, limit) };

            if dest.is_interpolated() {
                self.steps[d][voice] = (self.current[d][voice] - self.previous[d][voice]) * inv_len;
            }
        }
    }

    /// Value of `dest` for `voice` at sample `n` of the block.
    #[inline]
    pub fn value_at(&self, dest: ModDest, voice: usize, n: usize) -> f64 {
        let d = dest.index();
        if dest.is_interpolated() {
            self.previous[d][voice] + self.steps[d][voice] * n as f64
        } else {
            self.current[d][voice]
        }
    }

    /// This block's value of `dest` for `voice`.
    pub fn current(&self, dest: ModDest, voice: usize) -> f64 {
        self.current[dest.index()][voice]
    }

    /// The previous block's value of `dest` for `voice`.
    pub fn previous(&self, dest: ModDest, voice: usize) -> f64 {
        self.previous[dest.index()][voice]
    }

    /// Per-sample step of `dest` for `voice` in this block.
    pub fn step(&self, dest: ModDest, voice: usize) -> f64 {
        self.steps[dest.index()][voice]
    }

    /// Copies this block's values into the interpolation baseline.
    pub fn post_pass(&mut self) {
        self.previous = self.current;
    }

    /// Zeroes every destination value and baseline of `voice`. Run when the
    /// voice is allocated so it does not glide from its previous note.
    pub fn reset_voice(&mut self, voice: usize) {
        for d in 0..ModDest::COUNT {
            self.current[d][voice] = 0.0;
            self.previous[d][voice] = 0.0;
            self.steps[d][voice] = 0.0;
        }
    }
}

impl Default for ModMatrix {
    fn default() -> Self {
        Self::new()
    }
}

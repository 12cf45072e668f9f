//! Parameter bindings: typed, range-aware access to live engine settings.
//!
//! Every settable value in the voice pool has a [`ParamId`]. The id maps to a
//! [`ParamBinding`], which names the field it controls ([`Field`]), how that
//! field is stored ([`ParamKind`]) and its valid range. Reads and writes go
//! through a `match` on the field, so there is no aliasing and no pointer
//! into the pool; the table itself is built once and never changes.
//!
//! Setting a value clamps it, writes it, then runs the field's post-update
//! hook: envelope times recompute increments, filter settings recompute the
//! cached coefficients, and enabling a filter clears its state. Those hooks
//! are the only place derived state is refreshed.

use std::fmt;
use std::str::FromStr;

use crate::dsp::Waveform;
use crate::error::ParamError;
use crate::filters::SvfMode;
use crate::voice_pool::{EnvSlot, OscSlot, VoicePool};

/// Whether a value is in the parameter's own units or mapped to 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamFormat {
    /// 0.0 to 1.0 across the parameter's range
    Normalized,
    /// The parameter's own units (Hz, ms, cents, ...)
    #[default]
    Denormalized,
}

/// How a parameter is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    /// Signed integer, rounded on write
    Int8,
    /// True at 0.5 and above
    Bool,
    /// Waveform index, rounded on write
    Waveform,
    /// Filter mode index, rounded on write
    FilterMode,
}

/// The live field a parameter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    OscWaveform(OscSlot),
    OscMixLevel(OscSlot),
    OscDetune(OscSlot),
    OscOctave(OscSlot),
    OscEnabled(OscSlot),
    EnvAttack(EnvSlot),
    EnvDecay(EnvSlot),
    EnvSustain(EnvSlot),
    EnvRelease(EnvSlot),
    SvfEnabled,
    SvfMode,
    SvfCutoff,
    SvfResonance,
    SvfEnvAmount,
    LadderEnabled,
    LadderCutoff,
    LadderResonance,
    LadderDrive,
    LadderEnvAmount,
    LfoWaveform(usize),
    LfoRate(usize),
    MasterGain,
}

/// A field reference plus its storage kind and range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBinding {
    pub field: Field,
    pub kind: ParamKind,
    pub min: f64,
    pub max: f64,
}

impl ParamBinding {
    const fn new(field: Field, kind: ParamKind, min: f64, max: f64) -> Self {
        Self {
            field,
            kind,
            min,
            max,
        }
    }

    const fn float(field: Field, min: f64, max: f64) -> Self {
        Self::new(field, ParamKind::Float, min, max)
    }

    const fn toggle(field: Field) -> Self {
        Self::new(field, ParamKind::Bool, 0.0, 1.0)
    }

    const fn waveform(field: Field) -> Self {
        Self::new(field, ParamKind::Waveform, 0.0, (Waveform::COUNT - 1) as f64)
    }

    /// Maps a raw value to 0.0-1.0. A degenerate range maps to 0.0.
    pub fn normalize(&self, raw: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            (raw - self.min) / range
        } else {
            0.0
        }
    }

    /// Maps 0.0-1.0 (clamped) to the raw range.
    pub fn denormalize(&self, normalized: f64) -> f64 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }

    /// Clamps a raw value into range.
    pub fn clamp(&self, raw: f64) -> f64 {
        raw.clamp(self.min, self.max)
    }

    /// Snaps a raw value to what the field can store: integers and enum
    /// indices round, booleans become 0.0 or 1.0.
    pub fn quantize(&self, raw: f64) -> f64 {
        match self.kind {
            ParamKind::Float => raw,
            ParamKind::Int8 | ParamKind::Waveform | ParamKind::FilterMode => raw.round(),
            ParamKind::Bool => {
                if raw >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

macro_rules! param_ids {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Identifier of a bindable parameter.
        ///
        /// The numeric value (see [`ParamId::index`]) is what travels in a
        /// `ParamEvent`; the name is what control surfaces type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum ParamId {
            $($variant),*
        }

        impl ParamId {
            /// Every parameter, in id order.
            pub const ALL: &'static [ParamId] = &[$(ParamId::$variant),*];

            /// Human-readable name, `<group>.<field>`.
            pub fn name(self) -> &'static str {
                match self {
                    $(ParamId::$variant => $name),*
                }
            }
        }
    };
}

param_ids! {
    Osc1Waveform => "osc1.waveform",
    Osc1MixLevel => "osc1.mixLevel",
    Osc1Detune => "osc1.detune",
    Osc1Octave => "osc1.octave",
    Osc1Enabled => "osc1.enabled",
    Osc2Waveform => "osc2.waveform",
    Osc2MixLevel => "osc2.mixLevel",
    Osc2Detune => "osc2.detune",
    Osc2Octave => "osc2.octave",
    Osc2Enabled => "osc2.enabled",
    Osc3Waveform => "osc3.waveform",
    Osc3MixLevel => "osc3.mixLevel",
    Osc3Detune => "osc3.detune",
    Osc3Octave => "osc3.octave",
    Osc3Enabled => "osc3.enabled",
    SubOscWaveform => "subOsc.waveform",
    SubOscMixLevel => "subOsc.mixLevel",
    SubOscDetune => "subOsc.detune",
    SubOscOctave => "subOsc.octave",
    SubOscEnabled => "subOsc.enabled",
    AmpEnvAttack => "ampEnv.attack",
    AmpEnvDecay => "ampEnv.decay",
    AmpEnvSustain => "ampEnv.sustain",
    AmpEnvRelease => "ampEnv.release",
    FilterEnvAttack => "filterEnv.attack",
    FilterEnvDecay => "filterEnv.decay",
    FilterEnvSustain => "filterEnv.sustain",
    FilterEnvRelease => "filterEnv.release",
    ModEnvAttack => "modEnv.attack",
    ModEnvDecay => "modEnv.decay",
    ModEnvSustain => "modEnv.sustain",
    ModEnvRelease => "modEnv.release",
    SvfEnabled => "svf.enabled",
    SvfMode => "svf.mode",
    SvfCutoff => "svf.cutoff",
    SvfResonance => "svf.resonance",
    SvfEnvAmount => "svf.envAmount",
    LadderEnabled => "ladder.enabled",
    LadderCutoff => "ladder.cutoff",
    LadderResonance => "ladder.resonance",
    LadderDrive => "ladder.drive",
    LadderEnvAmount => "ladder.envAmount",
    Lfo1Waveform => "lfo1.waveform",
    Lfo1Rate => "lfo1.rate",
    Lfo2Waveform => "lfo2.waveform",
    Lfo2Rate => "lfo2.rate",
    Lfo3Waveform => "lfo3.waveform",
    Lfo3Rate => "lfo3.rate",
    MasterGain => "master.gain",
}

impl ParamId {
    /// Number of parameters.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the parameter with numeric id `index`, or `None`.
    pub fn from_index(index: u16) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Numeric id of this parameter.
    pub fn index(self) -> u16 {
        self as u16
    }

    /// The field, kind and range this parameter is bound to.
    pub fn binding(self) -> ParamBinding {
        let osc = |slot: OscSlot, field: usize| match field {
            0 => ParamBinding::waveform(Field::OscWaveform(slot)),
            1 => ParamBinding::float(Field::OscMixLevel(slot), 0.0, 4.0),
            2 => ParamBinding::float(Field::OscDetune(slot), -100.0, 100.0),
            3 => ParamBinding::new(Field::OscOctave(slot), ParamKind::Int8, -2.0, 2.0),
            _ => ParamBinding::toggle(Field::OscEnabled(slot)),
        };
        let env = |slot: EnvSlot, field: usize| match field {
            0 => ParamBinding::float(Field::EnvAttack(slot), 0.0, 10_000.0),
            1 => ParamBinding::float(Field::EnvDecay(slot), 0.0, 10_000.0),
            2 => ParamBinding::float(Field::EnvSustain(slot), 0.0, 1.0),
            _ => ParamBinding::float(Field::EnvRelease(slot), 0.0, 10_000.0),
        };
        let lfo = |index: usize, rate: bool| {
            if rate {
                ParamBinding::float(Field::LfoRate(index), 0.0, 50.0)
            } else {
                ParamBinding::waveform(Field::LfoWaveform(index))
            }
        };

        match self {
            Self::Osc1Waveform => osc(OscSlot::Osc1, 0),
            Self::Osc1MixLevel => osc(OscSlot::Osc1, 1),
            Self::Osc1Detune => osc(OscSlot::Osc1, 2),
            Self::Osc1Octave => osc(OscSlot::Osc1, 3),
            Self::Osc1Enabled => osc(OscSlot::Osc1, 4),
            Self::Osc2Waveform => osc(OscSlot::Osc2, 0),
            Self::Osc2MixLevel => osc(OscSlot::Osc2, 1),
            Self::Osc2Detune => osc(OscSlot::Osc2, 2),
            Self::Osc2Octave => osc(OscSlot::Osc2, 3),
            Self::Osc2Enabled => osc(OscSlot::Osc2, 4),
            Self::Osc3Waveform => osc(OscSlot::Osc3, 0),
            Self::Osc3MixLevel => osc(OscSlot::Osc3, 1),
            Self::Osc3Detune => osc(OscSlot::Osc3, 2),
            Self::Osc3Octave => osc(OscSlot::Osc3, 3),
            Self::Osc3Enabled => osc(OscSlot::Osc3, 4),
            Self::SubOscWaveform => osc(OscSlot::Sub, 0),
            Self::SubOscMixLevel => osc(OscSlot::Sub, 1),
            Self::SubOscDetune => osc(OscSlot::Sub, 2),
            Self::SubOscOctave => osc(OscSlot::Sub, 3),
            Self::SubOscEnabled => osc(OscSlot::Sub, 4),
            Self::AmpEnvAttack => env(EnvSlot::Amp, 0),
            Self::AmpEnvDecay => env(EnvSlot::Amp, 1),
            Self::AmpEnvSustain => env(EnvSlot::Amp, 2),
            Self::AmpEnvRelease => env(EnvSlot::Amp, 3),
            Self::FilterEnvAttack => env(EnvSlot::Filter, 0),
            Self::FilterEnvDecay => env(EnvSlot::Filter, 1),
            Self::FilterEnvSustain => env(EnvSlot::Filter, 2),
            Self::FilterEnvRelease => env(EnvSlot::Filter, 3),
            Self::ModEnvAttack => env(EnvSlot::Mod, 0),
            Self::ModEnvDecay => env(EnvSlot::Mod, 1),
            Self::ModEnvSustain => env(EnvSlot::Mod, 2),
            Self::ModEnvRelease => env(EnvSlot::Mod, 3),
            Self::SvfEnabled => ParamBinding::toggle(Field::SvfEnabled),
            Self::SvfMode => ParamBinding::new(
                Field::SvfMode,
                ParamKind::FilterMode,
                0.0,
                (SvfMode::COUNT - 1) as f64,
            ),
            Self::SvfCutoff => ParamBinding::float(Field::SvfCutoff, 20.0, 20_000.0),
            Self::SvfResonance => ParamBinding::float(Field::SvfResonance, 0.0, 1.0),
            Self::SvfEnvAmount => ParamBinding::float(Field::SvfEnvAmount, -4.0, 4.0),
            Self::LadderEnabled => ParamBinding::toggle(Field::LadderEnabled),
            Self::LadderCutoff => ParamBinding::float(Field::LadderCutoff, 20.0, 20_000.0),
            Self::LadderResonance => ParamBinding::float(Field::LadderResonance, 0.0, 1.0),
            Self::LadderDrive => ParamBinding::float(Field::LadderDrive, 1.0, 10.0),
            Self::LadderEnvAmount => ParamBinding::float(Field::LadderEnvAmount, -4.0, 4.0),
            Self::Lfo1Waveform => lfo(0, false),
            Self::Lfo1Rate => lfo(0, true),
            Self::Lfo2Waveform => lfo(1, false),
            Self::Lfo2Rate => lfo(1, true),
            Self::Lfo3Waveform => lfo(2, false),
            Self::Lfo3Rate => lfo(2, true),
            Self::MasterGain => ParamBinding::float(Field::MasterGain, 0.0, 2.0),
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamId {
    type Err = ParamError;

    /// Looks up a parameter by its exact name.
    ///
    /// # Examples
    ///
    /// ```
    /// use murmur::params::ParamId;
    ///
    /// let id: ParamId = "ladder.drive".parse().unwrap();
    /// assert_eq!(id, ParamId::LadderDrive);
    /// assert!("ladder.mode".parse::<ParamId>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|id| id.name() == s)
            .copied()
            .ok_or_else(|| ParamError::UnknownName(s.to_string()))
    }
}

/// The binding table, one entry per [`ParamId`].
///
/// # Examples
///
/// ```
/// use murmur::config::EngineConfig;
/// use murmur::params::{ParamBindings, ParamFormat, ParamId};
/// use murmur::voice_pool::VoicePool;
///
/// let mut pool = VoicePool::new(&EngineConfig::default());
/// let bindings = ParamBindings::new();
///
/// bindings.set(&mut pool, ParamId::MasterGain, 0.25, ParamFormat::Normalized).unwrap();
/// assert_eq!(bindings.get(&pool, ParamId::MasterGain, ParamFormat::Denormalized), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct ParamBindings {
    table: [ParamBinding; ParamId::COUNT],
}

impl ParamBindings {
    /// Builds the table.
    pub fn new() -> Self {
        Self {
            table: std::array::from_fn(|i| ParamId::ALL[i].binding()),
        }
    }

    /// Binding for `id`.
    pub fn binding(&self, id: ParamId) -> &ParamBinding {
        &self.table[id as usize]
    }

    /// Reads a parameter.
    pub fn get(&self, pool: &VoicePool, id: ParamId, format: ParamFormat) -> f64 {
        let binding = self.binding(id);
        let raw = read(pool, binding.field);
        match format {
            ParamFormat::Denormalized => raw,
            ParamFormat::Normalized => binding.normalize(raw),
        }
    }

    /// Reads a parameter by numeric id.
    pub fn get_by_index(
        &self,
        pool: &VoicePool,
        index: u16,
        format: ParamFormat,
    ) -> Result<f64, ParamError> {
        let id = ParamId::from_index(index).ok_or(ParamError::UnknownId(index))?;
        Ok(self.get(pool, id, format))
    }

    /// Writes a parameter: denormalizes if needed, clamps into range, stores
    /// the value and runs the post-update hook. NaN is rejected.
    pub fn set(
        &self,
        pool: &mut VoicePool,
        id: ParamId,
        value: f64,
        format: ParamFormat,
    ) -> Result<(), ParamError> {
        if value.is_nan() {
            return Err(ParamError::NotANumber);
        }

        let binding = self.binding(id);
        let raw = match format {
            ParamFormat::Denormalized => value,
            ParamFormat::Normalized => binding.denormalize(value),
        };
        let raw = binding.quantize(binding.clamp(raw));

        write(pool, binding.field, raw);
        after_update(pool, binding.field);
        Ok(())
    }

    /// Writes a parameter by numeric id.
    pub fn set_by_index(
        &self,
        pool: &mut VoicePool,
        index: u16,
        value: f64,
        format: ParamFormat,
    ) -> Result<(), ParamError> {
        let id = ParamId::from_index(index).ok_or(ParamError::UnknownId(index))?;
        self.set(pool, id, value, format)
    }
}

impl Default for ParamBindings {
    fn default() -> Self {
        Self::new()
    }
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn read(pool: &VoicePool, field: Field) -> f64 {
    match field {
        Field::OscWaveform(slot) => pool.oscillator(slot).config.waveform.index() as f64,
        Field::OscMixLevel(slot) => pool.oscillator(slot).config.mix_level,
        Field::OscDetune(slot) => pool.oscillator(slot).config.detune,
        Field::OscOctave(slot) => pool.oscillator(slot).config.octave as f64,
        Field::OscEnabled(slot) => bool_value(pool.oscillator(slot).config.enabled),
        Field::EnvAttack(slot) => pool.envelope(slot).config.attack_ms,
        Field::EnvDecay(slot) => pool.envelope(slot).config.decay_ms,
        Field::EnvSustain(slot) => pool.envelope(slot).config.sustain,
        Field::EnvRelease(slot) => pool.envelope(slot).config.release_ms,
        Field::SvfEnabled => bool_value(pool.svf().config.enabled),
        Field::SvfMode => pool.svf().config.mode.index() as f64,
        Field::SvfCutoff => pool.svf().config.cutoff,
        Field::SvfResonance => pool.svf().config.resonance,
        Field::SvfEnvAmount => pool.svf().config.env_amount,
        Field::LadderEnabled => bool_value(pool.ladder().config.enabled),
        Field::LadderCutoff => pool.ladder().config.cutoff,
        Field::LadderResonance => pool.ladder().config.resonance,
        Field::LadderDrive => pool.ladder().config.drive,
        Field::LadderEnvAmount => pool.ladder().config.env_amount,
        Field::LfoWaveform(i) => pool
            .lfos()
            .configs
            .get(i)
            .map_or(0.0, |c| c.waveform.index() as f64),
        Field::LfoRate(i) => pool.lfos().configs.get(i).map_or(0.0, |c| c.rate),
        Field::MasterGain => pool.master_gain(),
    }
}

/// Stores an already clamped and quantized value.
fn write(pool: &mut VoicePool, field: Field, raw: f64) {
    let as_bool = raw >= 0.5;
    let rounded = raw as i64;

    match field {
        Field::OscWaveform(slot) => {
            if let Some(waveform) = Waveform::from_index(rounded as u8) {
                pool.oscillator_mut(slot).config.waveform = waveform;
            }
        }
        Field::OscMixLevel(slot) => pool.oscillator_mut(slot).config.mix_level = raw,
        Field::OscDetune(slot) => pool.oscillator_mut(slot).config.detune = raw,
        Field::OscOctave(slot) => pool.oscillator_mut(slot).config.octave = rounded as i8,
        Field::OscEnabled(slot) => pool.oscillator_mut(slot).config.enabled = as_bool,
        Field::EnvAttack(slot) => pool.envelope_mut(slot).config.attack_ms = raw,
        Field::EnvDecay(slot) => pool.envelope_mut(slot).config.decay_ms = raw,
        Field::EnvSustain(slot) => pool.envelope_mut(slot).config.sustain = raw,
        Field::EnvRelease(slot) => pool.envelope_mut(slot).config.release_ms = raw,
        // Toggling goes through set_enabled so re-enabling clears stale state
        Field::SvfEnabled => pool.svf_mut().set_enabled(as_bool),
        Field::SvfMode => {
            if let Some(mode) = SvfMode::from_index(rounded as u8) {
                pool.svf_mut().config.mode = mode;
            }
        }
        Field::SvfCutoff => pool.svf_mut().config.cutoff = raw,
        Field::SvfResonance => pool.svf_mut().config.resonance = raw,
        Field::SvfEnvAmount => pool.svf_mut().config.env_amount = raw,
        Field::LadderEnabled => pool.ladder_mut().set_enabled(as_bool),
        Field::LadderCutoff => pool.ladder_mut().config.cutoff = raw,
        Field::LadderResonance => pool.ladder_mut().config.resonance = raw,
        Field::LadderDrive => pool.ladder_mut().config.drive = raw,
        Field::LadderEnvAmount => pool.ladder_mut().config.env_amount = raw,
        Field::LfoWaveform(i) => {
            if let (Some(config), Some(waveform)) = (
                pool.lfos_mut().configs.get_mut(i),
                Waveform::from_index(rounded as u8),
            ) {
                config.waveform = waveform;
            }
        }
        Field::LfoRate(i) => {
            if let Some(config) = pool.lfos_mut().configs.get_mut(i) {
                config.rate = raw;
            }
        }
        Field::MasterGain => pool.set_master_gain(raw),
    }
}

fn after_update(pool: &mut VoicePool, field: Field) {
    match field {
        Field::EnvAttack(slot)
        | Field::EnvDecay(slot)
        | Field::EnvSustain(slot)
        | Field::EnvRelease(slot) => pool.envelope_mut(slot).update_increments(),
        Field::SvfCutoff | Field::SvfResonance | Field::SvfEnvAmount => {
            pool.svf_mut().update_coefficients()
        }
        Field::LadderCutoff | Field::LadderResonance | Field::LadderDrive | Field::LadderEnvAmount => {
            pool.ladder_mut().update_coefficients()
        }
        // Detune and octave take effect at the next note-on
        _ => {}
    }
}

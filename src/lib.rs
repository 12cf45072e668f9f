//! Murmur - a real-time polyphonic synthesizer voice engine
//!
//! Up to [`MAX_VOICES`] voices, each with four oscillators (three main and a
//! sub), a state-variable filter and a ladder filter in series, and three
//! ADSR envelopes. A modulation matrix routes envelopes, LFOs, velocity and
//! noise to pitch, mix, cutoff and resonance. Control input reaches the
//! render thread through lock-free channels; nothing in the render path
//! locks or allocates.
//!
//! ```
//! use murmur::{Engine, EngineConfig};
//!
//! let (mut engine, mut handle) = Engine::new(EngineConfig::default());
//! handle.note_on(60, 100);
//!
//! let mut buffer = [0.0f32; 512];
//! engine.render(&mut buffer);
//! assert!(buffer.iter().any(|&s| s != 0.0));
//! ```

pub mod config;
pub mod dsp;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod events;
pub mod filters;
pub mod modulation;
pub mod oscillator;
pub mod params;
pub mod voice_pool;

/// Maximum number of simultaneously sounding voices.
pub const MAX_VOICES: usize = 64;

/// Frames rendered per internal block; modulation is evaluated once per block.
pub const ENGINE_BLOCK_SIZE: usize = 64;

/// Per-voice output gain, leaving headroom for several voices.
pub const VOICE_GAIN: f64 = 1.0 / 8.0;

/// Gain applied to the sum of a voice's four oscillators.
pub const OSC_MIX_GAIN: f64 = 1.0 / 4.0;

pub use config::EngineConfig;
pub use dsp::Waveform;
pub use engine::{Engine, EngineHandle};
pub use error::{ParamError, ParseError};
pub use events::{NoteEvent, ParamEvent, RouteEvent};
pub use modulation::{ModDest, ModRoute, ModSource};
pub use params::{ParamFormat, ParamId};

/// Resolves a parameter name to its [`ParamId`] at compile time.
///
/// ```
/// use murmur::params::ParamId;
///
/// assert_eq!(murmur::param!("svf.cutoff"), ParamId::SvfCutoff);
/// ```
#[cfg(feature = "macros")]
pub use murmur_macros::param;

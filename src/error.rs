//! Error types for the control surface.
//!
//! Nothing in the render path returns these: the audio thread clamps or
//! ignores bad input instead. They are reported synchronously to callers of
//! the parameter and name-lookup APIs.

use thiserror::Error;

/// Errors returned by parameter get/set and name lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// The numeric id does not name a bound parameter.
    #[error("unknown parameter id {0}")]
    UnknownId(u16),
    /// The name does not match any bound parameter.
    #[error("unknown parameter name '{0}'")]
    UnknownName(String),
    /// NaN cannot be clamped into a range, so it is rejected.
    #[error("parameter value is not a number")]
    NotANumber,
}

/// Errors returned when parsing enumerated names (waveforms, filter modes,
/// modulation sources and destinations).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input string was empty
    #[error("input string is empty")]
    Empty,
    /// The waveform name was not recognized
    #[error("invalid waveform: '{0}'")]
    InvalidWaveform(String),
    /// The filter mode name was not recognized
    #[error("invalid filter mode: '{0}'")]
    InvalidFilterMode(String),
    /// The modulation source name was not recognized
    #[error("invalid modulation source: '{0}'")]
    InvalidModSource(String),
    /// The modulation destination name was not recognized
    #[error("invalid modulation destination: '{0}'")]
    InvalidModDest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_error_display() {
        assert_eq!(
            ParamError::UnknownId(99).to_string(),
            "unknown parameter id 99"
        );
        assert_eq!(
            ParamError::UnknownName("osc9.waveform".into()).to_string(),
            "unknown parameter name 'osc9.waveform'"
        );
    }

    #[test]
    fn test_parse_error_display() {
        assert_eq!(ParseError::Empty.to_string(), "input string is empty");
        assert_eq!(
            ParseError::InvalidWaveform("zigzag".into()).to_string(),
            "invalid waveform: 'zigzag'"
        );
    }
}

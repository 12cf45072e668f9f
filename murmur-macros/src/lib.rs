use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{LitStr, parse_macro_input};

/// Resolves a parameter name to its `ParamId` at compile time.
///
/// The lookup happens while the crate is being built, so a typo in a
/// parameter name is a compile error instead of a runtime `UnknownName`.
/// The expansion is a plain enum path and costs nothing at runtime, which
/// makes it usable on the audio thread.
///
/// # Format
///
/// Names are `<group>.<field>`, matching `ParamId::name()`:
/// - oscillators: `osc1`, `osc2`, `osc3`, `subOsc` with `waveform`,
///   `mixLevel`, `detune`, `octave`, `enabled`
/// - envelopes: `ampEnv`, `filterEnv`, `modEnv` with `attack`, `decay`,
///   `sustain`, `release`
/// - filters: `svf` with `enabled`, `mode`, `cutoff`, `resonance`,
///   `envAmount`; `ladder` with `enabled`, `cutoff`, `resonance`, `drive`,
///   `envAmount`
/// - LFOs: `lfo1`, `lfo2`, `lfo3` with `waveform`, `rate`
/// - `master.gain`
///
/// # Examples
///
/// ```ignore
/// use murmur::param;
///
/// let cutoff = param!("svf.cutoff");
/// let attack = param!("ampEnv.attack");
/// ```
#[proc_macro]
pub fn param(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let name = input.value();

    match lookup_variant(&name) {
        Ok(variant) => {
            let ident = format_ident!("{}", variant);
            let expanded = quote! {
                ::murmur::params::ParamId::#ident
            };

            TokenStream::from(expanded)
        }
        Err(e) => {
            let error_msg = format!("Invalid parameter name '{}': {}", name, e);
            let expanded = quote! {
                compile_error!(#error_msg)
            };
            TokenStream::from(expanded)
        }
    }
}

const OSC_FIELDS: [(&str, &str); 5] = [
    ("waveform", "Waveform"),
    ("mixLevel", "MixLevel"),
    ("detune", "Detune"),
    ("octave", "Octave"),
    ("enabled", "Enabled"),
];

const ENV_FIELDS: [(&str, &str); 4] = [
    ("attack", "Attack"),
    ("decay", "Decay"),
    ("sustain", "Sustain"),
    ("release", "Release"),
];

const SVF_FIELDS: [(&str, &str); 5] = [
    ("enabled", "Enabled"),
    ("mode", "Mode"),
    ("cutoff", "Cutoff"),
    ("resonance", "Resonance"),
    ("envAmount", "EnvAmount"),
];

const LADDER_FIELDS: [(&str, &str); 5] = [
    ("enabled", "Enabled"),
    ("cutoff", "Cutoff"),
    ("resonance", "Resonance"),
    ("drive", "Drive"),
    ("envAmount", "EnvAmount"),
];

const LFO_FIELDS: [(&str, &str); 2] = [("waveform", "Waveform"), ("rate", "Rate")];

fn lookup_variant(name: &str) -> Result<String, String> {
    let (group, field) = name
        .split_once('.')
        .ok_or_else(|| "expected '<group>.<field>'".to_string())?;

    let (prefix, fields): (&str, &[(&str, &str)]) = match group {
        "osc1" => ("Osc1", &OSC_FIELDS),
        "osc2" => ("Osc2", &OSC_FIELDS),
        "osc3" => ("Osc3", &OSC_FIELDS),
        "subOsc" => ("SubOsc", &OSC_FIELDS),
        "ampEnv" => ("AmpEnv", &ENV_FIELDS),
        "filterEnv" => ("FilterEnv", &ENV_FIELDS),
        "modEnv" => ("ModEnv", &ENV_FIELDS),
        "svf" => ("Svf", &SVF_FIELDS),
        "ladder" => ("Ladder", &LADDER_FIELDS),
        "lfo1" => ("Lfo1", &LFO_FIELDS),
        "lfo2" => ("Lfo2", &LFO_FIELDS),
        "lfo3" => ("Lfo3", &LFO_FIELDS),
        "master" => ("Master", &[("gain", "Gain")]),
        _ => return Err(format!("unknown group '{}'", group)),
    };

    fields
        .iter()
        .find(|(key, _)| *key == field)
        .map(|(_, suffix)| format!("{}{}", prefix, suffix))
        .ok_or_else(|| format!("unknown field '{}' for group '{}'", field, group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_oscillator() {
        assert_eq!(lookup_variant("osc1.waveform").unwrap(), "Osc1Waveform");
        assert_eq!(lookup_variant("subOsc.mixLevel").unwrap(), "SubOscMixLevel");
    }

    #[test]
    fn test_lookup_filters_and_master() {
        assert_eq!(lookup_variant("svf.cutoff").unwrap(), "SvfCutoff");
        assert_eq!(lookup_variant("ladder.drive").unwrap(), "LadderDrive");
        assert_eq!(lookup_variant("master.gain").unwrap(), "MasterGain");
    }

    #[test]
    fn test_lookup_errors() {
        assert!(lookup_variant("").is_err());
        assert!(lookup_variant("osc1").is_err());
        assert!(lookup_variant("osc4.waveform").is_err());
        assert!(lookup_variant("ladder.mode").is_err());
    }
}

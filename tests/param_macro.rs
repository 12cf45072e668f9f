#![cfg(feature = "macros")]

use murmur::params::ParamId;
use murmur::param;

#[test]
fn test_param_macro_oscillators() {
    assert_eq!(param!("osc1.waveform"), ParamId::Osc1Waveform);
    assert_eq!(param!("osc3.detune"), ParamId::Osc3Detune);
    assert_eq!(param!("subOsc.mixLevel"), ParamId::SubOscMixLevel);
}

#[test]
fn test_param_macro_envelopes() {
    assert_eq!(param!("ampEnv.attack"), ParamId::AmpEnvAttack);
    assert_eq!(param!("filterEnv.sustain"), ParamId::FilterEnvSustain);
    assert_eq!(param!("modEnv.release"), ParamId::ModEnvRelease);
}

#[test]
fn test_param_macro_filters_and_master() {
    assert_eq!(param!("svf.cutoff"), ParamId::SvfCutoff);
    assert_eq!(param!("svf.mode"), ParamId::SvfMode);
    assert_eq!(param!("ladder.drive"), ParamId::LadderDrive);
    assert_eq!(param!("lfo2.rate"), ParamId::Lfo2Rate);
    assert_eq!(param!("master.gain"), ParamId::MasterGain);
}

#[test]
fn test_param_macro_agrees_with_runtime_lookup() {
    let names = ["osc2.octave", "ladder.envAmount", "lfo3.waveform", "svf.enabled"];
    let ids = [
        param!("osc2.octave"),
        param!("ladder.envAmount"),
        param!("lfo3.waveform"),
        param!("svf.enabled"),
    ];
    for (name, id) in names.iter().zip(ids) {
        assert_eq!(name.parse::<ParamId>().unwrap(), id);
        assert_eq!(id.name(), *name);
    }
}

//! Voice pool and block renderer.
//!
//! The pool owns every per-voice array (oscillator phases, envelope states,
//! filter registers, modulation values) plus the voice metadata, all of
//! length [`MAX_VOICES`] and indexed by voice slot. The slot index is the
//! only join key between them.
//!
//! Sounding voices are tracked in a dense list. Removal swaps the removed
//! entry with the last one, so the list is unordered; the renderer walks it
//! from the end so that a voice retired mid-loop never causes another voice
//! to be skipped or visited twice.
//!
//! # Allocation
//!
//! A note-on takes the first free slot. When all [`MAX_VOICES`] slots are
//! sounding, the voice with the oldest note-on stamp is cut off immediately
//! (no release tail) and reused.

use crate::config::EngineConfig;
use crate::dsp::soft_clip;
use crate::envelope::{Envelope, EnvelopeStatus};
use crate::filters::{LadderFilter, SvfFilter};
use crate::modulation::{LfoBank, ModDest, ModMatrix, ModSource, NoiseSource, SourceValues};
use crate::oscillator::Oscillator;
use crate::{MAX_VOICES, OSC_MIX_GAIN, VOICE_GAIN};

/// Number of oscillator slots per voice.
pub const OSC_COUNT: usize = 4;

/// Number of envelope slots per voice.
pub const ENV_COUNT: usize = 3;

/// One of the four oscillator slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OscSlot {
    Osc1 = 0,
    Osc2 = 1,
    Osc3 = 2,
    /// Sub oscillator
    Sub = 3,
}

impl OscSlot {
    /// Every slot, in mixing order.
    pub const ALL: [OscSlot; OSC_COUNT] = [OscSlot::Osc1, OscSlot::Osc2, OscSlot::Osc3, OscSlot::Sub];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One of the three envelope slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvSlot {
    /// Drives the voice amplitude and decides when the voice ends
    Amp = 0,
    /// Conventionally routed to filter cutoff
    Filter = 1,
    /// General-purpose
    Mod = 2,
}

impl EnvSlot {
    pub const ALL: [EnvSlot; ENV_COUNT] = [EnvSlot::Amp, EnvSlot::Filter, EnvSlot::Mod];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// All per-voice state and the shared settings that drive it.
///
/// # Examples
///
/// ```
/// use murmur::config::EngineConfig;
/// use murmur::voice_pool::VoicePool;
///
/// let mut pool = VoicePool::new(&EngineConfig::default());
/// pool.note_on(60, 0.8, 0);
/// pool.note_on(64, 0.8, 1);
/// assert_eq!(pool.active_count(), 2);
///
/// let mut block = [0.0f32; 64];
/// pool.render_block(&mut block);
/// assert!(block.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
///
/// pool.note_off(60);
/// assert!(!pool.is_note_playing(60));
/// ```
#[derive(Debug, Clone)]
pub struct VoicePool {
    oscillators: [Oscillator; OSC_COUNT],
    envelopes: [Envelope; ENV_COUNT],
    svf: SvfFilter,
    ladder: LadderFilter,
    lfos: LfoBank,
    noise: NoiseSource,
    matrix: ModMatrix,
    master_gain: f64,
    sample_rate: f64,

    // Voice metadata
    notes: [u8; MAX_VOICES],
    velocities: [f64; MAX_VOICES],
    note_on_times: [u64; MAX_VOICES],
    active: [bool; MAX_VOICES],

    // Dense list of sounding voice slots
    active_indices: [usize; MAX_VOICES],
    active_count: usize,
}

impl VoicePool {
    /// Creates a pool with every voice free.
    pub fn new(config: &EngineConfig) -> Self {
        let sample_rate = config.sample_rate;
        let [osc1, osc2, osc3, sub] = config.oscillators();

        let mut matrix = ModMatrix::new();
        for route in &config.routes {
            matrix.add_route(*route);
        }

        Self {
            oscillators: [
                Oscillator::new(osc1),
                Oscillator::new(osc2),
                Oscillator::new(osc3),
                Oscillator::new(sub),
            ],
            envelopes: [
                Envelope::new(config.amp_env, sample_rate),
                Envelope::new(config.filter_env, sample_rate),
                Envelope::new(config.mod_env, sample_rate),
            ],
            svf: SvfFilter::new(config.svf, sample_rate).with_mod_epsilon(config.filter_mod_epsilon),
            ladder: LadderFilter::new(config.ladder, sample_rate)
                .with_mod_epsilon(config.filter_mod_epsilon),
            lfos: LfoBank::new(config.lfos, sample_rate),
            noise: NoiseSource::new(config.noise_seed),
            matrix,
            master_gain: config.master_gain.clamp(0.0, 2.0),
            sample_rate,
            notes: [0; MAX_VOICES],
            velocities: [0.0; MAX_VOICES],
            note_on_times: [0; MAX_VOICES],
            active: [false; MAX_VOICES],
            active_indices: [0; MAX_VOICES],
            active_count: 0,
        }
    }

    /// Picks a slot for a new note: the first free one, or else the oldest
    /// sounding voice, which is retired on the spot.
    pub fn allocate(&mut self) -> usize {
        if let Some(free) = self.active.iter().position(|active| !active) {
            return free;
        }

        let oldest = self.active_voices().iter().copied().min_by_key(|&v| self.note_on_times[v]);
        let voice = oldest.unwrap_or(0);
        self.retire(voice);
        voice
    }

    /// Starts a note. `note` is clamped to 127; `velocity` is 0.0-1.0;
    /// `time` orders notes for stealing (smaller is older). Returns the
    /// voice slot used.
    pub fn note_on(&mut self, note: u8, velocity: f64, time: u64) -> usize {
        let note = note.min(127);
        let voice = self.allocate();

        self.notes[voice] = note;
        self.velocities[voice] = if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) };
        self.note_on_times[voice] = time;

        for osc in self.oscillators.iter_mut() {
            osc.init(voice, note, self.sample_rate);
        }
        for env in self.envelopes.iter_mut() {
            env.trigger(voice);
        }
        self.svf.init_state(voice);
        self.ladder.init_state(voice);
        self.matrix.reset_voice(voice);

        self.active[voice] = true;
        self.active_indices[self.active_count] = voice;
        self.active_count += 1;

        voice
    }

    /// Releases the first sounding, not yet released voice playing `note`.
    /// Returns `false` if there is none.
    pub fn note_off(&mut self, note: u8) -> bool {
        let note = note.min(127);
        let found = self.active_voices().iter().copied().find(|&v| {
            self.notes[v] == note
                && !matches!(
                    self.envelopes[EnvSlot::Amp.index()].status(v),
                    EnvelopeStatus::Idle | EnvelopeStatus::Release
                )
        });

        match found {
            Some(voice) => {
                self.release_voice(voice);
                true
            }
            None => false,
        }
    }

    /// Releases every sounding voice.
    pub fn all_notes_off(&mut self) {
        for i in 0..self.active_count {
            let voice = self.active_indices[i];
            self.release_voice(voice);
        }
    }

    fn release_voice(&mut self, voice: usize) {
        for env in self.envelopes.iter_mut() {
            env.trigger_release(voice);
        }
    }

    /// Frees `voice` immediately. Returns `false` (and changes nothing) if
    /// the slot is out of range or not sounding.
    pub fn retire(&mut self, voice: usize) -> bool {
        if voice >= MAX_VOICES || !self.active[voice] {
            return false;
        }

        if let Some(pos) = self.active_voices().iter().position(|&v| v == voice) {
            self.active_count -= 1;
            self.active_indices[pos] = self.active_indices[self.active_count];
        }
        self.active[voice] = false;

        for env in self.envelopes.iter_mut() {
            env.reset(voice);
        }
        true
    }

    /// Renders one block of mono audio into `out`, overwriting it.
    ///
    /// The modulation matrix is evaluated once at the start of the block
    /// and ramped across `out.len()` samples, so callers should keep blocks
    /// short (the engine uses [`crate::ENGINE_BLOCK_SIZE`]).
    pub fn render_block(&mut self, out: &mut [f32]) {
        let len = out.len();
        if len == 0 {
            return;
        }

        self.matrix.clear_steps();

        let lfo_values = [self.lfos.value(0), self.lfos.value(1), self.lfos.value(2)];
        for i in 0..self.active_count {
            let voice = self.active_indices[i];
            let sources = self.source_values(voice, lfo_values);
            self.matrix.evaluate(voice, &sources, len);
        }

        for (n, sample_out) in out.iter_mut().enumerate() {
            let mut sample = 0.0;

            let mut i = self.active_count;
            while i > 0 {
                i -= 1;
                let voice = self.active_indices[i];

                let mut mixed = 0.0;
                for (slot, osc) in self.oscillators.iter_mut().enumerate() {
                    let pitch = self.matrix.value_at(ModDest::PITCH[slot], voice, n);
                    let increment = if pitch != 0.0 {
                        Some(osc.modulated_increment(voice, pitch))
                    } else {
                        None
                    };
                    let mix_mod = self.matrix.value_at(ModDest::MIX[slot], voice, n);
                    mixed += osc.process_with_mix(voice, increment, mix_mod);
                }
                mixed *= OSC_MIX_GAIN;

                let filtered = self.svf.process_with_resonance(
                    voice,
                    mixed,
                    self.matrix.value_at(ModDest::SvfCutoff, voice, n),
                    self.matrix.value_at(ModDest::SvfResonance, voice, n),
                );
                let filtered = self.ladder.process_with_resonance(
                    voice,
                    filtered,
                    self.matrix.value_at(ModDest::LadderCutoff, voice, n),
                    self.matrix.value_at(ModDest::LadderResonance, voice, n),
                );
                // A non-finite voice must not reach the mix
                let filtered = if filtered.is_finite() {
                    filtered
                } else {
                    self.svf.init_state(voice);
                    self.ladder.init_state(voice);
                    0.0
                };

                let amp = self.envelopes[EnvSlot::Amp.index()].process(voice);
                self.envelopes[EnvSlot::Filter.index()].process(voice);
                self.envelopes[EnvSlot::Mod.index()].process(voice);

                if self.envelopes[EnvSlot::Amp.index()].is_idle(voice) {
                    self.retire(voice);
                }

                sample += filtered * amp * self.velocities[voice] * VOICE_GAIN;
            }

            *sample_out = soft_clip(sample * self.master_gain) as f32;
        }

        self.matrix.post_pass();
        self.lfos.advance(len);
    }

    fn source_values(&mut self, voice: usize, lfo_values: [f64; 3]) -> SourceValues {
        let mut sources = [0.0; ModSource::COUNT];
        sources[ModSource::AmpEnv.index()] = self.envelopes[EnvSlot::Amp.index()].level(voice);
        sources[ModSource::FilterEnv.index()] = self.envelopes[EnvSlot::Filter.index()].level(voice);
        sources[ModSource::ModEnv.index()] = self.envelopes[EnvSlot::Mod.index()].level(voice);
        sources[ModSource::Lfo1.index()] = lfo_values[0];
        sources[ModSource::Lfo2.index()] = lfo_values[1];
        sources[ModSource::Lfo3.index()] = lfo_values[2];
        sources[ModSource::Velocity.index()] = self.velocities[voice];
        sources[ModSource::Noise.index()] = self.noise.next_value();
        sources
    }

    /// Changes the sample rate of every component. Sounding voices keep
    /// their current phase increments until retriggered.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for env in self.envelopes.iter_mut() {
            env.set_sample_rate(sample_rate);
        }
        self.svf.set_sample_rate(sample_rate);
        self.ladder.set_sample_rate(sample_rate);
        self.lfos.set_sample_rate(sample_rate);
    }

    /// Number of sounding voices.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Slots of the sounding voices, in no particular order.
    pub fn active_voices(&self) -> &[usize] {
        &self.active_indices[..self.active_count]
    }

    /// Returns true if `voice` is sounding.
    pub fn is_active(&self, voice: usize) -> bool {
        self.active.get(voice).copied().unwrap_or(false)
    }

    /// Returns true if a sounding voice is holding `note` (not yet released).
    pub fn is_note_playing(&self, note: u8) -> bool {
        let note = note.min(127);
        self.active_voices().iter().any(|&v| {
            self.notes[v] == note
                && !matches!(
                    self.envelopes[EnvSlot::Amp.index()].status(v),
                    EnvelopeStatus::Idle | EnvelopeStatus::Release
                )
        })
    }

    /// MIDI note last assigned to `voice`.
    pub fn note(&self, voice: usize) -> u8 {
        self.notes[voice]
    }

    /// Velocity, 0.0-1.0, last assigned to `voice`.
    pub fn velocity(&self, voice: usize) -> f64 {
        self.velocities[voice]
    }

    /// Note-on stamp of `voice`.
    pub fn note_on_time(&self, voice: usize) -> u64 {
        self.note_on_times[voice]
    }

    pub fn oscillator(&self, slot: OscSlot) -> &Oscillator {
        &self.oscillators[slot.index()]
    }

    pub fn oscillator_mut(&mut self, slot: OscSlot) -> &mut Oscillator {
        &mut self.oscillators[slot.index()]
    }

    pub fn envelope(&self, slot: EnvSlot) -> &Envelope {
        &self.envelopes[slot.index()]
    }

    pub fn envelope_mut(&mut self, slot: EnvSlot) -> &mut Envelope {
        &mut self.envelopes[slot.index()]
    }

    pub fn svf(&self) -> &SvfFilter {
        &self.svf
    }

    pub fn svf_mut(&mut self) -> &mut SvfFilter {
        &mut self.svf
    }

    pub fn ladder(&self) -> &LadderFilter {
        &self.ladder
    }

    pub fn ladder_mut(&mut self) -> &mut LadderFilter {
        &mut self.ladder
    }

    pub fn lfos(&self) -> &LfoBank {
        &self.lfos
    }

    pub fn lfos_mut(&mut self) -> &mut LfoBank {
        &mut self.lfos
    }

    pub fn matrix(&self) -> &ModMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut ModMatrix {
        &mut self.matrix
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    /// Sets the master gain, clamped to 0.0-2.0.
    pub fn set_master_gain(&mut self, gain: f64) {
        if !gain.is_nan() {
            self.master_gain = gain.clamp(0.0, 2.0);
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::Waveform;
    use crate::envelope::EnvelopeConfig;
    use crate::modulation::ModRoute;
    use crate::oscillator::OscConfig;

    fn pool() -> VoicePool {
        VoicePool::new(&EngineConfig::default())
    }

    fn assert_active_list_consistent(pool: &VoicePool) {
        let list = pool.active_voices();
        for (i, &v) in list.iter().enumerate() {
            assert!(pool.is_active(v));
            assert!(!list[i + 1..].contains(&v), "duplicate voice {}", v);
        }
        let flagged = (0..MAX_VOICES).filter(|&v| pool.is_active(v)).count();
        assert_eq!(flagged, list.len());
    }

    fn sine_only(sample_rate: f64) -> EngineConfig {
        EngineConfig::new(sample_rate)
            .with_oscillators([
                OscConfig::new(Waveform::Sine),
                OscConfig::default().with_enabled(false),
                OscConfig::default().with_enabled(false),
                OscConfig::SUB.with_enabled(false),
            ])
            .with_amp_env(EnvelopeConfig::new(0.0, 0.0, 1.0, 100.0))
    }

    #[test]
    fn test_note_on_uses_free_slots_in_order() {
        let mut pool = pool();
        assert_eq!(pool.note_on(60, 1.0, 0), 0);
        assert_eq!(pool.note_on(62, 1.0, 1), 1);
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.note(1), 62);
        assert_active_list_consistent(&pool);
    }

    #[test]
    fn test_65th_note_steals_oldest() {
        let mut pool = pool();
        for i in 0..MAX_VOICES {
            pool.note_on(i as u8, 1.0, i as u64);
        }
        assert_eq!(pool.active_count(), MAX_VOICES);

        let stolen = pool.note_on(100, 1.0, MAX_VOICES as u64);
        assert_eq!(stolen, 0, "the very first note should be stolen");
        assert_eq!(pool.active_count(), MAX_VOICES);
        assert!(!pool.is_note_playing(0));
        assert!(pool.is_note_playing(1));
        assert!(pool.is_note_playing(100));
        assert_active_list_consistent(&pool);
    }

    #[test]
    fn test_steal_picks_smallest_stamp_not_slot() {
        let mut pool = pool();
        for i in 0..MAX_VOICES {
            // Slot 10 gets the oldest stamp
            let time = if i == 10 { 0 } else { 100 + i as u64 };
            pool.note_on(i as u8, 1.0, time);
        }
        assert_eq!(pool.note_on(120, 1.0, 1000), 10);
        assert!(!pool.is_note_playing(10));
    }

    #[test]
    fn test_note_off_without_match_is_noop() {
        let mut pool = pool();
        pool.note_on(60, 1.0, 0);
        assert!(!pool.note_off(61));
        assert_eq!(pool.active_count(), 1);

        assert!(pool.note_off(60));
        // Already releasing: second note-off finds nothing
        assert!(!pool.note_off(60));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_note_off_releases_all_envelopes() {
        let mut pool = pool();
        let voice = pool.note_on(60, 1.0, 0);
        pool.note_off(60);
        for slot in EnvSlot::ALL {
            assert_eq!(pool.envelope(slot).status(voice), EnvelopeStatus::Release);
        }
    }

    #[test]
    fn test_double_retire_is_noop() {
        let mut pool = pool();
        pool.note_on(60, 1.0, 0);
        let voice = pool.note_on(64, 1.0, 1);
        pool.note_on(67, 1.0, 2);

        assert!(pool.retire(voice));
        let list_after_first: Vec<usize> = pool.active_voices().to_vec();

        assert!(!pool.retire(voice));
        assert_eq!(pool.active_voices(), list_after_first.as_slice());
        assert_eq!(pool.active_count(), 2);
        assert!(!pool.retire(MAX_VOICES + 5));
        assert_active_list_consistent(&pool);
    }

    #[test]
    fn test_voice_retires_after_release() {
        let config = EngineConfig::default().with_amp_env(EnvelopeConfig::new(1.0, 1.0, 0.5, 1.0));
        let mut pool = VoicePool::new(&config);
        pool.note_on(60, 1.0, 0);

        let mut block = [0.0f32; 64];
        for _ in 0..4 {
            pool.render_block(&mut block);
        }
        assert_eq!(pool.active_count(), 1);

        pool.note_off(60);
        // 1 ms release = 48 samples
        pool.render_block(&mut block);
        assert_eq!(pool.active_count(), 0);
        assert_active_list_consistent(&pool);
    }

    #[test]
    fn test_retire_during_render_visits_everyone() {
        let config = EngineConfig::default().with_amp_env(EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0));
        let mut pool = VoicePool::new(&config);
        for i in 0..8u8 {
            pool.note_on(60 + i, 1.0, i as u64);
        }
        // Release every other voice; zero release means they end on the next sample
        for i in (0..8u8).step_by(2) {
            pool.note_off(60 + i);
        }

        let mut block = [0.0f32; 16];
        pool.render_block(&mut block);
        assert_eq!(pool.active_count(), 4);
        for i in 0..8u8 {
            assert_eq!(pool.is_note_playing(60 + i), i % 2 == 1);
        }
        assert_active_list_consistent(&pool);
    }

    #[test]
    fn test_single_sine_voice_matches_reference() {
        let sample_rate = 48000.0;
        let mut pool = VoicePool::new(&sine_only(sample_rate));
        let velocity = 100.0 / 127.0;
        pool.note_on(69, velocity, 0);

        let mut block = [0.0f32; 64];
        pool.render_block(&mut block);

        for (n, &actual) in block.iter().enumerate() {
            let osc = (std::f64::consts::TAU * 440.0 * n as f64 / sample_rate).sin();
            let expected = soft_clip(pool.master_gain() * osc * OSC_MIX_GAIN * velocity * VOICE_GAIN);
            assert!(
                (actual as f64 - expected).abs() < 1e-6,
                "sample {}: expected {}, got {}",
                n,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_silence_without_voices() {
        let mut pool = pool();
        let mut block = [1.0f32; 64];
        pool.render_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_output_bounded_under_stress() {
        let config = EngineConfig::default()
            .with_oscillators([
                OscConfig::new(Waveform::Square).with_mix_level(4.0),
                OscConfig::new(Waveform::Saw).with_mix_level(4.0),
                OscConfig::new(Waveform::Square).with_mix_level(4.0),
                OscConfig::SUB.with_mix_level(4.0),
            ])
            .with_master_gain(2.0)
            .with_route(ModRoute::new(ModSource::Noise, ModDest::Osc1Pitch, 24.0))
            .with_route(ModRoute::new(ModSource::Lfo1, ModDest::LadderCutoff, 4.0));
        let mut pool = VoicePool::new(&config);
        pool.ladder_mut().set_enabled(true);
        pool.svf_mut().set_enabled(true);

        for i in 0..MAX_VOICES {
            pool.note_on(30 + i as u8, 1.0, i as u64);
        }

        let mut block = [0.0f32; 64];
        for _ in 0..50 {
            pool.render_block(&mut block);
            for &s in &block {
                assert!(s.is_finite());
                assert!((-1.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_pitch_modulation_glides() {
        let config = sine_only(48000.0).with_route(ModRoute::new(
            ModSource::Velocity,
            ModDest::Osc1Pitch,
            12.0,
        ));
        let mut pool = VoicePool::new(&config);
        let voice = pool.note_on(57, 1.0, 0);

        let mut block = [0.0f32; 64];
        pool.render_block(&mut block);
        // First block ramps 0 -> 12 semitones, baseline ends at the target
        assert_eq!(pool.matrix().previous(ModDest::Osc1Pitch, voice), 12.0);
        let phase_after_ramp = pool.oscillator(OscSlot::Osc1).phase(voice);
        let base = pool.oscillator(OscSlot::Osc1).increment(voice);
        assert!(phase_after_ramp > base * 64.0);
        assert!(phase_after_ramp < base * 2.0 * 64.0);
    }

    #[test]
    fn test_all_notes_off() {
        let mut pool = pool();
        for i in 0..5u8 {
            pool.note_on(60 + i, 1.0, i as u64);
        }
        pool.all_notes_off();
        assert!((0..5u8).all(|i| !pool.is_note_playing(60 + i)));
        assert_eq!(pool.active_count(), 5);
    }

    #[test]
    fn test_out_of_range_note_is_clamped() {
        let mut pool = VoicePool::new(&sine_only(48000.0));
        let high = pool.note_on(200, 1.0, 0);
        let top = pool.note_on(127, 1.0, 1);
        assert_eq!(pool.note(high), 127);
        let osc = pool.oscillator(OscSlot::Osc1);
        assert_eq!(osc.increment(high), osc.increment(top));

        assert!(pool.is_note_playing(200));
        assert!(pool.note_off(200));
        assert!(pool.note_off(200));
        assert!(!pool.is_note_playing(127));
    }

    #[test]
    fn test_non_finite_voice_is_reset_and_others_stay_audible() {
        let mut pool = VoicePool::new(&sine_only(48000.0));
        pool.ladder_mut().set_enabled(true);
        let broken = pool.note_on(69, 1.0, 0);
        pool.note_on(76, 1.0, 1);

        let mut block = [0.0f32; 64];
        pool.render_block(&mut block);
        pool.ladder_mut().state_mut(broken).s = [f64::NAN; 4];

        pool.render_block(&mut block);
        assert!(block.iter().all(|s| s.is_finite()));
        assert!(block.iter().any(|&s| s.abs() > 1e-4), "second voice went silent");
        assert!(pool.ladder().state(broken).s.iter().all(|s| s.is_finite()));
        assert!(pool.is_active(broken));
    }

    #[test]
    fn test_retrigger_same_note_gets_new_voice() {
        let mut pool = pool();
        let a = pool.note_on(60, 1.0, 0);
        let b = pool.note_on(60, 1.0, 1);
        assert_ne!(a, b);
        assert_eq!(pool.active_count(), 2);
    }
}

//! Interactive polyphonic synth played from the computer keyboard.
//!
//! The engine renders in the audio callback; this thread only pushes note
//! and parameter events through the handle.
//!
//! ## Controls
//!
//! **Play notes:**
//! - Bottom row (A-L): white keys
//! - Top row (W-E, T-Y-U, O-P): black keys
//! - Z / X: octave down / up
//!
//! **Sound:**
//! - 1-4: osc1 waveform (sine, saw, square, triangle)
//! - V: toggle the state-variable filter
//! - B: toggle the ladder filter
//! - [ / ]: filter cutoff down / up
//! - M: toggle a filter-envelope sweep on the cutoff
//! - Space: release every held note
//!
//! Run with `RUST_LOG=debug` to see engine logging on stderr.

mod common;

use anyhow::Result;
use common::{
    KeyAction, KeyboardConfig, draw_keyboard_ui, draw_status, init_logging, is_quit_key,
    key_to_midi_note, midi_note_to_name, run_interactive,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use murmur::filters::SvfConfig;
use murmur::{EngineConfig, EngineHandle, ModDest, ModRoute, ModSource, ParamFormat, ParamId};

struct KeyboardState {
    base_note: u8,
    held: Vec<u8>,
    cutoff: f64,
    svf_on: bool,
    ladder_on: bool,
    sweep_on: bool,
}

impl KeyboardState {
    fn new() -> Self {
        Self {
            base_note: 60,
            held: Vec::new(),
            cutoff: 2000.0,
            svf_on: true,
            ladder_on: false,
            sweep_on: true,
        }
    }

    fn status(&self) -> String {
        let notes = if self.held.is_empty() {
            "-".to_string()
        } else {
            self.held
                .iter()
                .map(|&n| midi_note_to_name(n))
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!(
            "Octave base {} | SVF {} | Ladder {} | Cutoff {:.0} Hz | Sweep {} | Held: {}",
            midi_note_to_name(self.base_note),
            on_off(self.svf_on),
            on_off(self.ladder_on),
            self.cutoff,
            on_off(self.sweep_on),
            notes
        )
    }

    fn release_all(&mut self, handle: &mut EngineHandle) {
        for note in self.held.drain(..) {
            handle.note_off(note);
        }
    }

    fn set_cutoff(&mut self, handle: &mut EngineHandle, cutoff: f64) {
        self.cutoff = cutoff.clamp(20.0, 20_000.0);
        handle.set_param(ParamId::SvfCutoff, self.cutoff, ParamFormat::Denormalized);
        handle.set_param(ParamId::LadderCutoff, self.cutoff, ParamFormat::Denormalized);
    }
}

fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

fn sweep_route() -> ModRoute {
    ModRoute::new(ModSource::FilterEnv, ModDest::SvfCutoff, 2.0)
}

fn handle_key(
    state: &mut KeyboardState,
    handle: &mut EngineHandle,
    key_event: &KeyEvent,
) -> Result<KeyAction> {
    if is_quit_key(key_event.code) {
        state.release_all(handle);
        return Ok(KeyAction::Exit);
    }

    match key_event.kind {
        KeyEventKind::Press => match key_event.code {
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as u8 - b'1';
                handle.set_param(ParamId::Osc1Waveform, index as f64, ParamFormat::Denormalized);
            }
            KeyCode::Char('z') => {
                state.release_all(handle);
                state.base_note = state.base_note.saturating_sub(12).max(12);
            }
            KeyCode::Char('x') => {
                state.release_all(handle);
                state.base_note = (state.base_note + 12).min(96);
            }
            KeyCode::Char('v') => {
                state.svf_on = !state.svf_on;
                let value = if state.svf_on { 1.0 } else { 0.0 };
                handle.set_param(ParamId::SvfEnabled, value, ParamFormat::Denormalized);
            }
            KeyCode::Char('b') => {
                state.ladder_on = !state.ladder_on;
                let value = if state.ladder_on { 1.0 } else { 0.0 };
                handle.set_param(ParamId::LadderEnabled, value, ParamFormat::Denormalized);
            }
            KeyCode::Char('[') => {
                let cutoff = state.cutoff / 1.25;
                state.set_cutoff(handle, cutoff);
            }
            KeyCode::Char(']') => {
                let cutoff = state.cutoff * 1.25;
                state.set_cutoff(handle, cutoff);
            }
            KeyCode::Char('m') => {
                state.sweep_on = !state.sweep_on;
                if state.sweep_on {
                    handle.add_route(sweep_route());
                } else {
                    handle.clear_routes();
                }
            }
            KeyCode::Char(' ') => state.release_all(handle),
            code => {
                if let Some(note) = key_to_midi_note(code, state.base_note)
                    && !state.held.contains(&note)
                {
                    state.held.push(note);
                    handle.note_on(note, 100);
                }
            }
        },
        KeyEventKind::Release => {
            if let Some(note) = key_to_midi_note(key_event.code, state.base_note)
                && let Some(pos) = state.held.iter().position(|&n| n == note)
            {
                state.held.remove(pos);
                handle.note_off(note);
            }
        }
        _ => {}
    }

    draw_status(&state.status())?;
    Ok(KeyAction::Continue)
}

fn main() -> Result<()> {
    init_logging();

    let config = EngineConfig::default()
        .with_svf(SvfConfig {
            enabled: true,
            cutoff: 2000.0,
            resonance: 0.6,
            ..SvfConfig::default()
        })
        .with_route(sweep_route());

    let mut state = KeyboardState::new();
    let initial_status = state.status();

    run_interactive(
        config,
        KeyboardConfig::with_enhancements(),
        || {
            draw_keyboard_ui(
                "Murmur - Polyphonic Keyboard",
                Some("1-4 waveform | V svf | B ladder | [ ] cutoff | M sweep | Z X octave"),
            )?;
            draw_status(&initial_status)
        },
        |handle, key_event| handle_key(&mut state, handle, key_event),
    )
}

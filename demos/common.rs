//! Common utilities for the interactive demos.

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, StreamConfig};
use crossterm::{
    ExecutableCommand,
    event::{
        self, Event, KeyCode, KeyEvent, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use murmur::{Engine, EngineConfig, EngineHandle};
use std::io::{Write, stdout};
use std::panic;
use std::time::Duration;
use tracing::{error, info};

/// Frames converted per pass in the audio callback.
const CALLBACK_FRAMES: usize = 1024;

/// Configuration for keyboard enhancements (needed for detecting key press/release).
#[derive(Default)]
pub struct KeyboardConfig {
    /// Enable keyboard enhancements (for press/release detection)
    pub enable_enhancements: bool,
}

impl KeyboardConfig {
    /// Create config that enables keyboard enhancements for press/release detection
    pub fn with_enhancements() -> Self {
        Self {
            enable_enhancements: true,
        }
    }
}

/// Key handling result that controls the event loop
pub enum KeyAction {
    /// Continue the event loop
    Continue,
    /// Exit the event loop
    Exit,
}

/// Installs a `tracing` subscriber that writes to stderr, filtered by
/// `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs an interactive synth with a terminal UI.
///
/// The engine is built at the output device's sample rate and moved into
/// the audio callback; the key handler only ever sees the [`EngineHandle`].
/// This function handles:
/// - Audio device setup and stream creation
/// - Terminal raw mode and alternate screen
/// - Panic hook for terminal cleanup
/// - Event loop with key polling
pub fn run_interactive<F, K>(
    config: EngineConfig,
    keyboard_config: KeyboardConfig,
    initial_ui: F,
    mut key_handler: K,
) -> Result<()>
where
    F: FnOnce() -> Result<()>,
    K: FnMut(&mut EngineHandle, &KeyEvent) -> Result<KeyAction>,
{
    // Setup audio
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    let stream_config: StreamConfig = supported.into();

    let config = config.with_sample_rate(stream_config.sample_rate.0 as f64);
    let (engine, mut handle) = Engine::new(config);
    info!(
        channels = stream_config.channels,
        sample_rate = stream_config.sample_rate.0,
        format = %sample_format,
        "opening output stream"
    );

    // Start audio stream
    let _stream = match sample_format {
        SampleFormat::F32 => create_audio_stream::<f32>(&device, &stream_config, engine)?,
        SampleFormat::I16 => create_audio_stream::<i16>(&device, &stream_config, engine)?,
        SampleFormat::U16 => create_audio_stream::<u16>(&device, &stream_config, engine)?,
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    // Setup terminal - keyboard enhancements MUST come before alternate screen
    if keyboard_config.enable_enhancements {
        stdout().execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
    }

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    // Set up panic hook to restore terminal on panic
    let has_enhancements = keyboard_config.enable_enhancements;
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal(has_enhancements);
        original_hook(panic_info);
    }));

    initial_ui()?;

    loop {
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key_event) = event::read()?
        {
            match key_handler(&mut handle, &key_event)? {
                KeyAction::Continue => {}
                KeyAction::Exit => break,
            }
        }
    }

    cleanup_terminal(keyboard_config.enable_enhancements);

    Ok(())
}

/// Creates an audio stream that renders straight from the engine.
fn create_audio_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut engine: Engine,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f32> + cpal::SizedSample,
{
    let channels = config.channels as usize;
    // Allocated once here, never in the callback
    let mut scratch = vec![0.0f32; CALLBACK_FRAMES * channels];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for chunk in data.chunks_mut(scratch.len()) {
                let buffer = &mut scratch[..chunk.len()];
                engine.render_interleaved(buffer, channels);
                for (out, &sample) in chunk.iter_mut().zip(buffer.iter()) {
                    *out = T::from_sample(sample);
                }
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

/// Cleans up terminal state (cursor, alternate screen, raw mode).
fn cleanup_terminal(has_keyboard_enhancements: bool) {
    if has_keyboard_enhancements {
        let _ = stdout().execute(PopKeyboardEnhancementFlags);
    }
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}

/// Maps the two home rows to one octave and a bit, piano style, starting
/// at `base_note` on the A key.
pub fn key_to_midi_note(code: KeyCode, base_note: u8) -> Option<u8> {
    let offset = match code {
        KeyCode::Char('a') => 0,
        KeyCode::Char('w') => 1,
        KeyCode::Char('s') => 2,
        KeyCode::Char('e') => 3,
        KeyCode::Char('d') => 4,
        KeyCode::Char('f') => 5,
        KeyCode::Char('t') => 6,
        KeyCode::Char('g') => 7,
        KeyCode::Char('y') => 8,
        KeyCode::Char('h') => 9,
        KeyCode::Char('u') => 10,
        KeyCode::Char('j') => 11,
        KeyCode::Char('k') => 12,
        KeyCode::Char('o') => 13,
        KeyCode::Char('l') => 14,
        KeyCode::Char('p') => 15,
        _ => return None,
    };
    base_note.checked_add(offset).filter(|&n| n <= 127)
}

/// Note name with octave, e.g. `C#4` for 61.
pub fn midi_note_to_name(note: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NAMES[note as usize % 12], octave)
}

/// Clears the screen and draws a title, the key map and optional extra help.
pub fn draw_keyboard_ui(title: &str, extra: Option<&str>) -> Result<()> {
    let mut out = stdout();
    out.execute(crossterm::terminal::Clear(crossterm::terminal::ClearType::All))?;
    out.execute(crossterm::cursor::MoveTo(0, 0))?;
    write!(out, "{}\r\n\r\n", title)?;
    write!(out, "   W E   T Y U   O P\r\n")?;
    write!(out, "  A S D F G H J K L\r\n\r\n")?;
    if let Some(extra) = extra {
        write!(out, "{}\r\n", extra)?;
    }
    write!(out, "Q / ESC = quit\r\n")?;
    out.flush()?;
    Ok(())
}

/// Overwrites the status line below the help text.
pub fn draw_status(line: &str) -> Result<()> {
    let mut out = stdout();
    out.execute(crossterm::cursor::MoveTo(0, 9))?;
    out.execute(crossterm::terminal::Clear(
        crossterm::terminal::ClearType::CurrentLine,
    ))?;
    write!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

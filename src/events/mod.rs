//! Event records and the lock-free channel that carries them to the render
//! thread.
//!
//! Every event type here is `Copy` and fixed-size, so pushing one is a plain
//! memory copy into a pre-allocated slot.

mod channel;

pub use channel::{CHANNEL_SIZE, EventChannel, EventConsumer, EventProducer};

use crate::modulation::ModRoute;
use crate::params::ParamFormat;

/// Whether a note event starts or ends a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEventKind {
    /// Key pressed
    On,
    /// Key released
    Off,
}

/// A note-on or note-off with MIDI note number and velocity.
///
/// # Examples
///
/// ```
/// use murmur::events::{NoteEvent, NoteEventKind};
///
/// let event = NoteEvent::on(60, 127);
/// assert_eq!(event.kind, NoteEventKind::On);
/// assert_eq!(event.velocity_f64(), 1.0);
///
/// let event = NoteEvent::off(60);
/// assert_eq!(event.kind, NoteEventKind::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// On or off
    pub kind: NoteEventKind,
    /// MIDI note number (0-127)
    pub note: u8,
    /// MIDI velocity (0-127); ignored for note-off
    pub velocity: u8,
}

impl NoteEvent {
    /// Creates a note-on event. Note and velocity are clamped to 0-127.
    pub fn on(note: u8, velocity: u8) -> Self {
        Self {
            kind: NoteEventKind::On,
            note: note.min(127),
            velocity: velocity.min(127),
        }
    }

    /// Creates a note-off event.
    pub fn off(note: u8) -> Self {
        Self {
            kind: NoteEventKind::Off,
            note: note.min(127),
            velocity: 0,
        }
    }

    /// Velocity scaled to 0.0-1.0.
    pub fn velocity_f64(&self) -> f64 {
        self.velocity.min(127) as f64 / 127.0
    }
}

/// A parameter change addressed by numeric id.
///
/// The id is kept as a raw `u16` so events from untyped sources (MIDI CC
/// maps, text commands) can be forwarded as-is; unknown ids are ignored when
/// the event is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamEvent {
    /// Numeric parameter id, see `ParamId::index`
    pub id: u16,
    /// New value, interpreted according to `format`
    pub value: f64,
    /// Whether `value` is raw or normalized to 0.0-1.0
    pub format: ParamFormat,
}

impl ParamEvent {
    /// Creates a parameter event carrying a raw value.
    pub fn raw(id: u16, value: f64) -> Self {
        Self {
            id,
            value,
            format: ParamFormat::Denormalized,
        }
    }

    /// Creates a parameter event carrying a normalized value.
    pub fn normalized(id: u16, value: f64) -> Self {
        Self {
            id,
            value,
            format: ParamFormat::Normalized,
        }
    }
}

/// An edit to the modulation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteEvent {
    /// Append a route; dropped if the matrix is full
    Add(ModRoute),
    /// Remove the route at this index
    Remove(u8),
    /// Remove every route
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_event_constructors() {
        let on = NoteEvent::on(64, 100);
        assert_eq!(on.kind, NoteEventKind::On);
        assert_eq!(on.note, 64);
        assert_eq!(on.velocity, 100);

        let off = NoteEvent::off(64);
        assert_eq!(off.kind, NoteEventKind::Off);
        assert_eq!(off.velocity, 0);
    }

    #[test]
    fn test_note_event_clamps_to_midi_range() {
        let on = NoteEvent::on(200, 255);
        assert_eq!(on.note, 127);
        assert_eq!(on.velocity, 127);
        assert_eq!(on.velocity_f64(), 1.0);
    }

    #[test]
    fn test_param_event_formats() {
        assert_eq!(ParamEvent::raw(3, 0.5).format, ParamFormat::Denormalized);
        assert_eq!(
            ParamEvent::normalized(3, 0.5).format,
            ParamFormat::Normalized
        );
    }

    #[test]
    fn test_events_travel_through_channel() {
        let (mut tx, mut rx) = EventChannel::<ParamEvent>::new();
        assert!(tx.push(ParamEvent::raw(1, 2.0)));
        assert!(tx.push(ParamEvent::normalized(2, 0.25)));
        assert_eq!(rx.pop(), Some(ParamEvent::raw(1, 2.0)));
        assert_eq!(rx.pop(), Some(ParamEvent::normalized(2, 0.25)));
        assert_eq!(rx.pop(), None);
    }
}

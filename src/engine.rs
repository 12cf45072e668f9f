//! The engine façade and its control handle.
//!
//! [`Engine::new`] builds a [`VoicePool`] from an [`EngineConfig`] and
//! splits three event channels (notes, parameters, routes) between the
//! engine and an [`EngineHandle`]. The engine goes to the audio thread and
//! is the only thing that touches the pool; the handle stays with whatever
//! produces input. Each `render*` call drains every channel once, then
//! renders the host buffer in [`ENGINE_BLOCK_SIZE`] sub-blocks so modulation
//! runs at the same rate whatever the host period is.

use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::ENGINE_BLOCK_SIZE;
use crate::config::EngineConfig;
use crate::error::ParamError;
use crate::events::{
    EventChannel, EventConsumer, EventProducer, NoteEvent, NoteEventKind, ParamEvent, RouteEvent,
};
use crate::modulation::{MAX_MOD_ROUTES, ModRoute};
use crate::params::{ParamBindings, ParamFormat, ParamId};
use crate::voice_pool::VoicePool;

/// Producer side of the engine's event channels.
///
/// Every method is non-blocking and returns `false` when the event was
/// dropped because its channel was full.
#[derive(Debug)]
pub struct EngineHandle {
    notes: EventProducer<NoteEvent>,
    params: EventProducer<ParamEvent>,
    routes: EventProducer<RouteEvent>,
}

impl EngineHandle {
    /// Queues a note-on. `velocity` is MIDI velocity, 0-127.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> bool {
        self.send_note(NoteEvent::on(note, velocity))
    }

    /// Queues a note-off.
    pub fn note_off(&mut self, note: u8) -> bool {
        self.send_note(NoteEvent::off(note))
    }

    pub fn send_note(&mut self, event: NoteEvent) -> bool {
        let sent = self.notes.push(event);
        if !sent {
            warn!(note = event.note, kind = ?event.kind, "note channel full, event dropped");
        }
        sent
    }

    /// Queues a parameter change.
    pub fn set_param(&mut self, id: ParamId, value: f64, format: ParamFormat) -> bool {
        self.send_param(ParamEvent {
            id: id.index(),
            value,
            format,
        })
    }

    /// Queues a parameter change by raw id. Unknown ids are ignored by the
    /// engine.
    pub fn send_param(&mut self, event: ParamEvent) -> bool {
        let sent = self.params.push(event);
        if !sent {
            warn!(id = event.id, value = event.value, "param channel full, event dropped");
        }
        sent
    }

    /// Queues a new modulation route.
    pub fn add_route(&mut self, route: ModRoute) -> bool {
        self.send_route(RouteEvent::Add(route))
    }

    /// Queues removal of the route at `index`.
    pub fn remove_route(&mut self, index: u8) -> bool {
        self.send_route(RouteEvent::Remove(index))
    }

    /// Queues removal of every route.
    pub fn clear_routes(&mut self) -> bool {
        self.send_route(RouteEvent::Clear)
    }

    fn send_route(&mut self, event: RouteEvent) -> bool {
        let sent = self.routes.push(event);
        if !sent {
            warn!(event = ?event, "route channel full, event dropped");
        }
        sent
    }

    /// Splits the handle so each channel can be fed from its own thread.
    pub fn into_parts(
        self,
    ) -> (
        EventProducer<NoteEvent>,
        EventProducer<ParamEvent>,
        EventProducer<RouteEvent>,
    ) {
        (self.notes, self.params, self.routes)
    }
}

/// A polyphonic synth voice engine.
///
/// # Examples
///
/// ```
/// use murmur::config::EngineConfig;
/// use murmur::engine::Engine;
/// use murmur::params::{ParamFormat, ParamId};
///
/// let (mut engine, mut handle) = Engine::new(EngineConfig::default());
///
/// handle.note_on(60, 100);
/// handle.set_param(ParamId::SvfEnabled, 1.0, ParamFormat::Denormalized);
///
/// // Interleaved stereo, any buffer length
/// let mut buffer = vec![0.0f32; 2 * 300];
/// engine.render_interleaved(&mut buffer, 2);
///
/// assert_eq!(engine.active_voice_count(), 1);
/// assert_eq!(engine.get(ParamId::SvfEnabled, ParamFormat::Denormalized), 1.0);
/// assert!(buffer.chunks(2).all(|frame| frame[0] == frame[1]));
/// ```
#[derive(Debug)]
pub struct Engine {
    pool: VoicePool,
    bindings: ParamBindings,
    notes: EventConsumer<NoteEvent>,
    params: EventConsumer<ParamEvent>,
    routes: EventConsumer<RouteEvent>,
    note_counter: u64,
    scratch: [f32; ENGINE_BLOCK_SIZE],
}

impl Engine {
    /// Builds an engine and the handle that feeds it.
    pub fn new(config: EngineConfig) -> (Self, EngineHandle) {
        let (note_tx, note_rx) = EventChannel::new();
        let (param_tx, param_rx) = EventChannel::new();
        let (route_tx, route_rx) = EventChannel::new();

        if config.routes.len() > MAX_MOD_ROUTES {
            warn!(
                requested = config.routes.len(),
                kept = MAX_MOD_ROUTES,
                "too many initial modulation routes, extra routes dropped"
            );
        }

        let pool = VoicePool::new(&config);
        info!(
            sample_rate = config.sample_rate,
            routes = pool.matrix().len(),
            "engine created"
        );
        debug!(
            svf = config.svf.enabled,
            ladder = config.ladder.enabled,
            master_gain = config.master_gain,
            "filter and output settings"
        );

        let engine = Self {
            pool,
            bindings: ParamBindings::new(),
            notes: note_rx,
            params: param_rx,
            routes: route_rx,
            note_counter: 0,
            scratch: [0.0; ENGINE_BLOCK_SIZE],
        };
        let handle = EngineHandle {
            notes: note_tx,
            params: param_tx,
            routes: route_tx,
        };
        (engine, handle)
    }

    /// Applies every queued event: parameters, then routes, then notes.
    pub fn drain_events(&mut self) {
        while let Some(event) = self.params.pop() {
            // Unknown ids and NaN values are dropped
            let _ = self
                .bindings
                .set_by_index(&mut self.pool, event.id, event.value, event.format);
        }

        while let Some(event) = self.routes.pop() {
            self.apply_route_event(event);
        }

        while let Some(event) = self.notes.pop() {
            match event.kind {
                NoteEventKind::On => self.note_on(event.note, event.velocity),
                NoteEventKind::Off => self.note_off(event.note),
            }
        }
    }

    fn apply_route_event(&mut self, event: RouteEvent) {
        let matrix = self.pool.matrix_mut();
        match event {
            RouteEvent::Add(route) => {
                matrix.add_route(route);
            }
            RouteEvent::Remove(index) => {
                matrix.remove_route(index as usize);
            }
            RouteEvent::Clear => matrix.clear(),
        }
    }

    /// Drains events and renders mono audio into `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        self.drain_events();
        for block in out.chunks_mut(ENGINE_BLOCK_SIZE) {
            self.pool.render_block(block);
        }
    }

    /// Drains events and renders into an interleaved buffer, copying the
    /// mono mix to every channel. A trailing partial frame is zeroed.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        self.drain_events();

        let frames = out.len() / channels;
        let mut frame = 0;
        while frame < frames {
            let len = (frames - frame).min(ENGINE_BLOCK_SIZE);
            let block = &mut self.scratch[..len];
            self.pool.render_block(block);

            let dest = &mut out[frame * channels..(frame + len) * channels];
            for (samples, &value) in dest.chunks_exact_mut(channels).zip(block.iter()) {
                samples.fill(value);
            }
            frame += len;
        }

        out[frames * channels..].fill(0.0);
    }

    /// Drains events and renders into one buffer per channel. Only the
    /// length of the shortest buffer is rendered; the rest of longer
    /// buffers is zeroed.
    pub fn render_planar(&mut self, outs: &mut [&mut [f32]]) {
        self.drain_events();

        let frames = outs.iter().map(|ch| ch.len()).min().unwrap_or(0);
        let mut frame = 0;
        while frame < frames {
            let len = (frames - frame).min(ENGINE_BLOCK_SIZE);
            let block = &mut self.scratch[..len];
            self.pool.render_block(block);

            for channel in outs.iter_mut() {
                channel[frame..frame + len].copy_from_slice(block);
            }
            frame += len;
        }

        for channel in outs.iter_mut() {
            channel[frames..].fill(0.0);
        }
    }

    /// Starts a note immediately. `velocity` is MIDI velocity, 0-127.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        let velocity = velocity.min(127) as f64 / 127.0;
        self.pool.note_on(note, velocity, self.note_counter);
        self.note_counter = self.note_counter.wrapping_add(1);
    }

    /// Releases a note immediately.
    pub fn note_off(&mut self, note: u8) {
        self.pool.note_off(note);
    }

    /// Releases every sounding voice.
    pub fn all_notes_off(&mut self) {
        self.pool.all_notes_off();
    }

    /// Reads a parameter.
    pub fn get(&self, id: ParamId, format: ParamFormat) -> f64 {
        self.bindings.get(&self.pool, id, format)
    }

    /// Writes a parameter.
    pub fn set(&mut self, id: ParamId, value: f64, format: ParamFormat) -> Result<(), ParamError> {
        self.bindings.set(&mut self.pool, id, value, format)
    }

    /// Reads a parameter by name, e.g. `"svf.cutoff"`.
    pub fn get_by_name(&self, name: &str, format: ParamFormat) -> Result<f64, ParamError> {
        let id = ParamId::from_str(name)?;
        Ok(self.get(id, format))
    }

    /// Writes a parameter by name.
    pub fn set_by_name(
        &mut self,
        name: &str,
        value: f64,
        format: ParamFormat,
    ) -> Result<(), ParamError> {
        let id = ParamId::from_str(name)?;
        debug!(param = name, value, "set by name");
        self.set(id, value, format)
    }

    /// Adds a modulation route. Returns `false` if the matrix is full.
    pub fn add_route(&mut self, route: ModRoute) -> bool {
        self.pool.matrix_mut().add_route(route)
    }

    /// Removes the route at `index`. Returns `false` if there is none.
    pub fn remove_route(&mut self, index: usize) -> bool {
        self.pool.matrix_mut().remove_route(index)
    }

    pub fn clear_routes(&mut self) {
        self.pool.matrix_mut().clear();
    }

    /// Installed modulation routes.
    pub fn routes(&self) -> &[ModRoute] {
        self.pool.matrix().routes()
    }

    /// Changes the sample rate. Sounding voices keep their pitch until
    /// retriggered.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        info!(sample_rate, "sample rate changed");
        self.pool.set_sample_rate(sample_rate);
    }

    pub fn sample_rate(&self) -> f64 {
        self.pool.sample_rate()
    }

    pub fn active_voice_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn is_note_playing(&self, note: u8) -> bool {
        self.pool.is_note_playing(note)
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut VoicePool {
        &mut self.pool
    }
}

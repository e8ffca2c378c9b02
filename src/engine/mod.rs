//! Session hub: the playback engine.
//!
//! A [`Session`] owns everything that was ambient state in a browser
//! keyboard: the instrument catalog, the transposition offset, the voice
//! registry, the recorder and the replay timer queue. Input events and
//! button controls come in; tone-generator commands, highlight changes
//! and recorder captures go out. All of it runs single-threaded and
//! cooperative: handlers run to completion, and deferred replay work
//! only happens when the host loop calls [`Session::pump`].

pub mod registry;
pub mod scheduler;

use crate::config::EngineConfig;
use crate::instrument::{Catalog, Instrument, NoteRange, RangeMode};
use crate::layout::{self, KeySlot};
use crate::mapping::KeyMap;
use crate::recorder::{EventKind, RecordedEvent, Recorder};
use crate::synth::{Clock, ToneGenerator, ToneHandle};

use registry::{StartOutcome, VoiceRegistry};
use scheduler::{ReplayBatch, TimerQueue};

/// A discrete input event from the keyboard or pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown { symbol: char, repeat: bool },
    KeyUp { symbol: char },
    PointerDown { note: u8 },
    PointerUp { note: u8 },
}

/// Zero-argument edge-triggered UI actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ToggleRecord,
    TriggerPlayback,
    CycleInstrument,
    CycleRange,
}

/// Receives active-state changes for visual feedback.
pub trait HighlightSink {
    fn set_active(&mut self, note: u8, on: bool);
}

/// Discards highlight changes; the default sink.
pub struct NullHighlight;

impl HighlightSink for NullHighlight {
    fn set_active(&mut self, _note: u8, _on: bool) {}
}

/// Whether a play/stop should be mirrored into the recorder. Replay
/// always suppresses capture so playback can never extend its own log.
#[derive(Clone, Copy)]
enum Capture {
    Mirror,
    Suppress,
}

pub struct Session<G: ToneGenerator> {
    config: EngineConfig,
    keymap: KeyMap,
    catalog: Catalog,
    range_mode: RangeMode,
    transpose: i32,
    generator: G,
    clock: Box<dyn Clock>,
    registry: VoiceRegistry<G::Handle>,
    recorder: Recorder,
    timers: TimerQueue,
    highlight: Box<dyn HighlightSink>,
}

impl<G: ToneGenerator> Session<G> {
    pub fn new(config: EngineConfig, catalog: Catalog, generator: G, clock: Box<dyn Clock>) -> Self {
        let keymap = KeyMap::new(&config.key_layout, config.base_note);
        Self {
            config,
            keymap,
            catalog,
            range_mode: RangeMode::Full,
            transpose: 0,
            generator,
            clock,
            registry: VoiceRegistry::new(),
            recorder: Recorder::new(),
            timers: TimerQueue::new(),
            highlight: Box::new(NullHighlight),
        }
    }

    /// Replace the highlight sink.
    pub fn with_highlight(mut self, sink: Box<dyn HighlightSink>) -> Self {
        self.highlight = sink;
        self
    }

    /// Start sounding a note. Duplicate plays of an already-sounding
    /// note are no-ops; notes outside the current instrument's range
    /// never sound (unbounded transposition lands here).
    pub fn play(&mut self, note: u8) {
        self.play_with(note, Capture::Mirror);
    }

    /// Stop a sounding note, shaping its release: cancel anything the
    /// backend had scheduled, then ramp to silence over the configured
    /// sustain time. A stop without a prior play is a no-op.
    pub fn stop(&mut self, note: u8) {
        self.stop_with(note, Capture::Mirror);
    }

    fn play_with(&mut self, note: u8, capture: Capture) {
        if !self.catalog.current().range.contains(note) {
            return;
        }

        let now = self.clock.now();
        let program = self.catalog.current().program;
        let loudness = self.config.loudness;
        let attack = self.config.attack;

        let Self { registry, generator, .. } = self;
        let started = matches!(
            registry.start(note, || {
                generator.begin_tone(program, now, note, loudness, attack)
            }),
            StartOutcome::Started(_)
        );

        if started {
            self.highlight.set_active(note, true);
            if let Capture::Mirror = capture {
                self.recorder.capture(note, EventKind::Start, now);
            }
        }
    }

    fn stop_with(&mut self, note: u8, capture: Capture) {
        let Some(mut handle) = self.registry.stop(note) else {
            return;
        };

        let now = self.clock.now();
        handle.cancel_scheduled(now);
        handle.ramp_level_to(0.0, now + self.config.sustain_time);

        self.highlight.set_active(note, false);
        if let Capture::Mirror = capture {
            self.recorder.capture(note, EventKind::Stop, now);
        }
    }

    /// Dispatch one input event. Key repeats are discarded outright,
    /// before the transpose symbols are examined.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown { repeat: true, .. } => {}
            InputEvent::KeyDown { symbol, .. } => {
                if symbol == self.config.transpose_down {
                    self.transpose -= 1;
                } else if symbol == self.config.transpose_up {
                    self.transpose += 1;
                }
                if let Some(note) = self.map_symbol(symbol) {
                    self.play(note);
                }
            }
            InputEvent::KeyUp { symbol } => {
                if let Some(note) = self.map_symbol(symbol) {
                    self.stop(note);
                }
            }
            InputEvent::PointerDown { note } => self.play(note),
            InputEvent::PointerUp { note } => self.stop(note),
        }
    }

    /// Dispatch one UI control.
    pub fn handle_control(&mut self, control: Control) {
        match control {
            Control::ToggleRecord => {
                let now = self.clock.now();
                self.recorder.toggle(now);
            }
            Control::TriggerPlayback => {
                self.replay();
            }
            Control::CycleInstrument => {
                self.catalog.cycle();
            }
            Control::CycleRange => {
                self.range_mode = self.range_mode.toggled();
            }
        }
    }

    /// Schedule the current take: one deferred task per recorded event,
    /// at its offset from now. The batch id can be handed to
    /// [`Session::cancel_replay`]; nothing cancels it implicitly, so
    /// re-arming while a replay is pending lets the stale tasks fire.
    pub fn replay(&mut self) -> ReplayBatch {
        let now = self.clock.now();
        let batch = self.timers.open_batch();
        for event in self.recorder.events() {
            self.timers.schedule(now + event.offset, batch, event.note, event.kind);
        }
        batch
    }

    /// Drop the pending tasks of one replay batch.
    pub fn cancel_replay(&mut self, batch: ReplayBatch) {
        self.timers.cancel_batch(batch);
    }

    /// Run every deferred replay task that has come due. Replay-driven
    /// plays and stops are never mirrored into the recorder.
    pub fn pump(&mut self) {
        let now = self.clock.now();
        for task in self.timers.drain_due(now) {
            match task.kind {
                EventKind::Start => self.play_with(task.note, Capture::Suppress),
                EventKind::Stop => self.stop_with(task.note, Capture::Suppress),
            }
        }
    }

    fn map_symbol(&self, symbol: char) -> Option<u8> {
        let raw = self.keymap.note_for(symbol, self.transpose)?;
        u8::try_from(raw).ok()
    }

    /// The note range the keyboard currently shows, or `None` when the
    /// compact window misses the instrument entirely.
    pub fn visible_range(&self) -> Option<NoteRange> {
        let range = self.catalog.current().range;
        match self.range_mode {
            RangeMode::Full => Some(range),
            RangeMode::Compact => range.intersect(&self.config.compact_window),
        }
    }

    /// Rebuild the key layout for the current instrument and range mode.
    pub fn layout(&self) -> Vec<KeySlot> {
        self.visible_range().map(layout::generate).unwrap_or_default()
    }

    pub fn current_instrument(&self) -> &Instrument {
        self.catalog.current()
    }

    pub fn range_mode(&self) -> RangeMode {
        self.range_mode
    }

    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_armed()
    }

    pub fn recorded_events(&self) -> &[RecordedEvent] {
        self.recorder.events()
    }

    /// Notes currently sounding, for the renderer's highlight pass.
    pub fn sounding(&self) -> impl Iterator<Item = u8> + '_ {
        self.registry.sounding()
    }

    pub fn active_voices(&self) -> usize {
        self.registry.len()
    }

    /// Pending replay tasks, for inspection.
    pub fn pending_replay(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct NoopHandle;

    impl ToneHandle for NoopHandle {
        fn cancel_scheduled(&mut self, _at: f64) {}
        fn ramp_level_to(&mut self, _level: f32, _at: f64) {}
    }

    struct CountingTone {
        begins: Rc<Cell<usize>>,
    }

    impl ToneGenerator for CountingTone {
        type Handle = NoopHandle;

        fn begin_tone(&mut self, _p: u8, _s: f64, _n: u8, _v: u8, _a: f64) -> NoopHandle {
            self.begins.set(self.begins.get() + 1);
            NoopHandle
        }
    }

    struct ManualClock(Rc<Cell<f64>>);

    impl Clock for ManualClock {
        fn now(&self) -> f64 {
            self.0.get()
        }
    }

    fn session() -> (Session<CountingTone>, Rc<Cell<usize>>, Rc<Cell<f64>>) {
        let begins = Rc::new(Cell::new(0));
        let time = Rc::new(Cell::new(0.0));
        let session = Session::new(
            EngineConfig::default(),
            Catalog::standard(),
            CountingTone { begins: Rc::clone(&begins) },
            Box::new(ManualClock(Rc::clone(&time))),
        );
        (session, begins, time)
    }

    #[test]
    fn duplicate_play_triggers_one_tone() {
        let (mut session, begins, _) = session();
        session.play(64);
        session.play(64);
        assert_eq!(begins.get(), 1);
        assert_eq!(session.active_voices(), 1);
    }

    #[test]
    fn out_of_range_note_never_sounds() {
        let (mut session, begins, _) = session();
        // Piano range is 21-108.
        session.play(110);
        session.play(3);
        assert_eq!(begins.get(), 0);
        assert!(session.sounding().next().is_none());
    }

    #[test]
    fn transpose_symbols_shift_mapping() {
        let (mut session, begins, _) = session();
        session.handle_input(InputEvent::KeyDown { symbol: 'x', repeat: false });
        session.handle_input(InputEvent::KeyDown { symbol: 'a', repeat: false });
        assert_eq!(session.transpose(), 1);
        assert_eq!(begins.get(), 1);
        let sounding: Vec<u8> = session.sounding().collect();
        assert_eq!(sounding, [72]);
    }

    #[test]
    fn key_repeat_is_discarded_before_transpose() {
        let (mut session, _, _) = session();
        session.handle_input(InputEvent::KeyDown { symbol: 'z', repeat: true });
        assert_eq!(session.transpose(), 0);
    }

    #[test]
    fn cycling_instrument_changes_layout() {
        let (mut session, _, _) = session();
        let piano_keys = session.layout().len();
        session.handle_control(Control::CycleInstrument);
        let violin_keys = session.layout().len();
        assert_eq!(piano_keys, 88);
        assert_eq!(violin_keys, 49);
        assert_eq!(session.current_instrument().name, "violin");
    }

    #[test]
    fn compact_mode_clips_to_window() {
        let (mut session, _, _) = session();
        session.handle_control(Control::CycleRange);
        assert_eq!(session.range_mode(), RangeMode::Compact);
        let range = session.visible_range().unwrap();
        assert_eq!(range, NoteRange::new(48, 84));
    }

    #[test]
    fn replay_is_not_recaptured() {
        let (mut session, _, time) = session();
        session.handle_control(Control::ToggleRecord);
        time.set(0.10);
        session.play(64);
        time.set(0.45);
        session.stop(64);
        // Still armed; replay must not append to the take.
        time.set(1.0);
        session.replay();
        time.set(2.0);
        session.pump();

        assert_eq!(session.recorded_events().len(), 2);
        assert!(session.pending_replay().is_empty());
    }
}

//! clavier - application wiring and event loop

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::stdout;
use std::rc::Rc;
use std::time::{Duration, Instant};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use claviature::config::EngineConfig;
use claviature::engine::{Control, HighlightSink, InputEvent, Session};
use claviature::instrument::Catalog;
use claviature::synth::sine::SineSynth;

use crate::ui;

/// How long a pressed key sounds when the terminal cannot report key
/// releases.
const TAP_HOLD: Duration = Duration::from_millis(350);

/// Highlight sink shared with the renderer.
#[derive(Clone, Default)]
pub struct ActiveNotes(Rc<RefCell<HashSet<u8>>>);

impl ActiveNotes {
    pub fn contains(&self, note: u8) -> bool {
        self.0.borrow().contains(&note)
    }
}

impl HighlightSink for ActiveNotes {
    fn set_active(&mut self, note: u8, on: bool) {
        if on {
            self.0.borrow_mut().insert(note);
        } else {
            self.0.borrow_mut().remove(&note);
        }
    }
}

pub struct App {
    session: Session<SineSynth>,
    active: ActiveNotes,
    /// Set when the terminal reports key release events.
    has_release_events: bool,
    /// Press timestamps for the tap fallback.
    held: HashMap<u8, Instant>,
    should_quit: bool,
}

impl App {
    pub fn new() -> EyreResult<Self> {
        let config = EngineConfig::default();
        let synth = SineSynth::start(&config).wrap_err("audio device unavailable")?;
        let clock = Box::new(synth.clock());

        let active = ActiveNotes::default();
        let session = Session::new(config, Catalog::standard(), synth, clock)
            .with_highlight(Box::new(active.clone()));

        Ok(Self {
            session,
            active,
            has_release_events: false,
            held: HashMap::new(),
            should_quit: false,
        })
    }

    pub fn run(&mut self) -> EyreResult<()> {
        let mut terminal = ratatui::init();

        self.has_release_events =
            crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.has_release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(&mut terminal);

        if self.has_release_events {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            // Fire any replay tasks that have come due.
            self.session.pump();
            self.expire_taps();

            terminal.draw(|frame| {
                ui::render(frame, &self.session, &self.active, self.has_release_events)
            })?;

            // Non-blocking input at ~60fps.
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.kind);
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, kind: KeyEventKind) {
        if kind == KeyEventKind::Press {
            match code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('r') => {
                    self.session.handle_control(Control::ToggleRecord);
                    return;
                }
                KeyCode::Char('v') => {
                    self.session.handle_control(Control::TriggerPlayback);
                    return;
                }
                KeyCode::Char('m') => {
                    self.session.handle_control(Control::CycleInstrument);
                    return;
                }
                KeyCode::Char('n') => {
                    self.session.handle_control(Control::CycleRange);
                    return;
                }
                _ => {}
            }
        }

        let KeyCode::Char(symbol) = code else {
            return;
        };

        match kind {
            KeyEventKind::Press => {
                let before: Option<HashSet<u8>> = (!self.has_release_events)
                    .then(|| self.session.sounding().collect());
                self.session.handle_input(InputEvent::KeyDown { symbol, repeat: false });
                // Without release events every press is a tap; remember
                // when each new note started.
                if let Some(before) = before {
                    let pressed_at = Instant::now();
                    let new_notes: Vec<u8> = self
                        .session
                        .sounding()
                        .filter(|note| !before.contains(note))
                        .collect();
                    for note in new_notes {
                        self.held.insert(note, pressed_at);
                    }
                }
            }
            KeyEventKind::Repeat => {
                self.session.handle_input(InputEvent::KeyDown { symbol, repeat: true });
            }
            KeyEventKind::Release => {
                self.session.handle_input(InputEvent::KeyUp { symbol });
            }
        }
    }

    /// Stop tap-fallback notes that have been held past the tap window.
    fn expire_taps(&mut self) {
        if self.has_release_events || self.held.is_empty() {
            return;
        }
        let expired: Vec<u8> = self
            .held
            .iter()
            .filter(|(_, pressed)| pressed.elapsed() >= TAP_HOLD)
            .map(|(&note, _)| note)
            .collect();
        for note in expired {
            self.held.remove(&note);
            self.session.stop(note);
        }
    }
}

//! clavier - keyboard and status rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use claviature::engine::Session;
use claviature::instrument::RangeMode;
use claviature::layout::{natural_width, KeyKind};
use claviature::synth::ToneGenerator;

use crate::app::ActiveNotes;

pub fn render<G: ToneGenerator>(
    frame: &mut Frame,
    session: &Session<G>,
    active: &ActiveNotes,
    has_release_events: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(8),    // Keyboard
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_status(frame, chunks[0], session);
    render_keyboard(frame, chunks[1], session, active);
    render_help(frame, chunks[2], has_release_events);
}

fn render_status<G: ToneGenerator>(frame: &mut Frame, area: Rect, session: &Session<G>) {
    let instrument = session.current_instrument();
    let range = match session.range_mode() {
        RangeMode::Full => "full",
        RangeMode::Compact => "compact",
    };
    let rec = if session.is_recording() { "  [REC]" } else { "" };
    let pending = session.pending_replay().len();
    let replay = if pending > 0 {
        format!("  replay: {} pending", pending)
    } else {
        String::new()
    };

    let line = format!(
        " {}  [{}-{}]  range: {}  octave: {:+}{}{}",
        instrument.name,
        instrument.range.min,
        instrument.range.max,
        range,
        session.transpose(),
        rec,
        replay,
    );

    let block = Block::default().title(" clavier ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_keyboard<G: ToneGenerator>(
    frame: &mut Frame,
    area: Rect,
    session: &Session<G>,
    active: &ActiveNotes,
) {
    let Some(range) = session.visible_range() else {
        return;
    };
    let slots = session.layout();
    let naturals = natural_width(range).max(1) as u16;
    let unit = (area.width / naturals).max(1);
    let raised_height = (area.height * 2 / 5).max(1);

    // Naturals first so raised keys paint over their top ends.
    for slot in slots.iter().filter(|s| s.kind == KeyKind::Natural) {
        let x = area.x + slot.x as u16 * unit;
        let width = unit.saturating_sub(1).max(1);
        if x + width > area.right() {
            continue;
        }
        let color = if active.contains(slot.note) {
            Color::Cyan
        } else {
            Color::Gray
        };
        let rect = Rect::new(x, area.y, width, area.height);
        frame.render_widget(Block::default().style(Style::default().bg(color)), rect);
    }

    for slot in slots.iter().filter(|s| s.kind == KeyKind::Raised) {
        let x = area.x + (slot.x * unit as f32).round() as u16;
        let width = (unit * 3 / 5).max(1);
        if x + width > area.right() {
            continue;
        }
        let color = if active.contains(slot.note) {
            Color::Cyan
        } else {
            Color::Black
        };
        let rect = Rect::new(x, area.y, width, raised_height);
        frame.render_widget(Block::default().style(Style::default().bg(color)), rect);
    }
}

fn render_help(frame: &mut Frame, area: Rect, has_release_events: bool) {
    let hold = if has_release_events {
        "hold keys to sustain"
    } else {
        "taps only (terminal lacks key-release events)"
    };
    let help = Paragraph::new(format!(
        " [awsedftgyhujkolp;'] play  [Z/X] octave  [R] record  [V] play back  [M] instrument  [N] range  [Q] quit  ({})",
        hold
    ))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

//! Timestamped capture of note events.
//!
//! While armed, the recorder mirrors every genuine start/stop the engine
//! performs, stamped with its offset from the moment of arming. Arming is
//! deliberately destructive: a new take always discards the old one.
//! Disarming only lowers the flag; the captured take stays readable for
//! playback.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Stop,
}

/// One captured note event. Immutable once appended.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedEvent {
    pub note: u8,
    /// Seconds from the start of the take.
    pub offset: f64,
    pub kind: EventKind,
}

/// One-take recorder: idle or armed, with the current take.
#[derive(Debug, Default)]
pub struct Recorder {
    armed: bool,
    record_start: f64,
    events: Vec<RecordedEvent>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh take at `now`. Any prior capture is discarded, even
    /// when already armed.
    pub fn arm(&mut self, now: f64) {
        self.armed = true;
        self.record_start = now;
        self.events.clear();
    }

    /// Stop capturing. The take is kept.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Flip between idle and armed, as the record button does.
    pub fn toggle(&mut self, now: f64) {
        if self.armed {
            self.disarm();
        } else {
            self.arm(now);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Append an event if armed; otherwise do nothing.
    pub fn capture(&mut self, note: u8, kind: EventKind, now: f64) {
        if self.armed {
            self.events.push(RecordedEvent {
                note,
                offset: now - self.record_start,
                kind,
            });
        }
    }

    /// The current take, chronological.
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_is_ignored_while_idle() {
        let mut recorder = Recorder::new();
        recorder.capture(60, EventKind::Start, 1.0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn offsets_are_relative_to_arm_time() {
        let mut recorder = Recorder::new();
        recorder.arm(10.0);
        recorder.capture(64, EventKind::Start, 10.10);
        recorder.capture(64, EventKind::Stop, 10.45);

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].note, 64);
        assert!((events[0].offset - 0.10).abs() < 1e-3);
        assert_eq!(events[0].kind, EventKind::Start);
        assert!((events[1].offset - 0.45).abs() < 1e-3);
        assert_eq!(events[1].kind, EventKind::Stop);
    }

    #[test]
    fn rearming_discards_the_previous_take() {
        let mut recorder = Recorder::new();
        recorder.arm(0.0);
        recorder.capture(60, EventKind::Start, 0.2);
        recorder.capture(60, EventKind::Stop, 0.6);

        recorder.arm(5.0);
        assert!(recorder.events().is_empty());
        assert!(recorder.is_armed());
    }

    #[test]
    fn disarm_keeps_the_take() {
        let mut recorder = Recorder::new();
        recorder.arm(0.0);
        recorder.capture(72, EventKind::Start, 0.3);
        recorder.disarm();

        assert!(!recorder.is_armed());
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn toggle_flips_between_states() {
        let mut recorder = Recorder::new();
        recorder.toggle(1.0);
        assert!(recorder.is_armed());
        recorder.toggle(2.0);
        assert!(!recorder.is_armed());
    }
}

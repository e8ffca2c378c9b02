//! Instrument catalog.
//!
//! An instrument is an immutable bundle: a display name, the General MIDI
//! program its tone generator should voice, and the note range it can
//! sound. Exactly one catalog entry is current at a time; the Mode button
//! cycles through them round-robin.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inclusive note-number range.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRange {
    pub min: u8,
    pub max: u8,
}

impl NoteRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, note: u8) -> bool {
        note >= self.min && note <= self.max
    }

    /// Overlap of two ranges, or `None` when they are disjoint.
    pub fn intersect(&self, other: &NoteRange) -> Option<NoteRange> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(NoteRange { min, max })
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub name: &'static str,
    /// General MIDI program number, interpreted by the tone generator.
    pub program: u8,
    pub range: NoteRange,
}

/// Whether the keyboard shows the instrument's full range or a compact
/// window around the playing area.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Full,
    Compact,
}

impl RangeMode {
    pub fn toggled(self) -> Self {
        match self {
            RangeMode::Full => RangeMode::Compact,
            RangeMode::Compact => RangeMode::Full,
        }
    }
}

/// The fixed set of instruments, with the current selection.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Instrument>,
    current: usize,
}

impl Catalog {
    /// Piano, violin, viola, cello with their FluidR3 soundfont ranges.
    pub fn standard() -> Self {
        Self::from_entries(vec![
            Instrument { name: "piano", program: 0, range: NoteRange::new(21, 108) },
            Instrument { name: "violin", program: 40, range: NoteRange::new(55, 103) },
            Instrument { name: "viola", program: 41, range: NoteRange::new(48, 91) },
            Instrument { name: "cello", program: 42, range: NoteRange::new(36, 76) },
        ])
    }

    /// Build a catalog from a non-empty entry list; selection starts at 0.
    pub fn from_entries(entries: Vec<Instrument>) -> Self {
        assert!(!entries.is_empty(), "catalog needs at least one instrument");
        Self { entries, current: 0 }
    }

    pub fn current(&self) -> &Instrument {
        &self.entries[self.current]
    }

    /// Advance the selection, wrapping past the last entry.
    pub fn cycle(&mut self) -> &Instrument {
        self.current = (self.current + 1) % self.entries.len();
        self.current()
    }

    pub fn entries(&self) -> &[Instrument] {
        &self.entries
    }
}

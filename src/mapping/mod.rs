//! Physical key symbols to note numbers.
//!
//! The keyboard layout is an ordered run of distinct symbols, one per
//! semitone, anchored at a base note. Transposition shifts the whole run
//! in octave steps. Mapping is pure lookup plus arithmetic; nothing here
//! knows about instruments or ranges.

use crate::SEMITONES_PER_OCTAVE;

/// An ordered semitone keymap.
#[derive(Debug, Clone)]
pub struct KeyMap {
    layout: Vec<char>,
    base_note: i32,
}

impl KeyMap {
    pub fn new(layout: &str, base_note: i32) -> Self {
        Self {
            layout: layout.chars().collect(),
            base_note,
        }
    }

    /// Map a key symbol to a note number under the given octave offset.
    ///
    /// Returns `None` for symbols outside the layout. The result is raw
    /// semitone arithmetic with no clamping: a large offset can push it
    /// outside 0-127, and the playback engine decides what to do then.
    pub fn note_for(&self, symbol: char, transpose_octaves: i32) -> Option<i32> {
        let index = self.layout.iter().position(|&s| s == symbol)?;
        Some(self.base_note + index as i32 + transpose_octaves * SEMITONES_PER_OCTAVE)
    }

    /// Number of semitones the layout spans.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }
}

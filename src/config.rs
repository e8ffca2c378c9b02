#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instrument::NoteRange;

/// All the tunables the engine exposes, with defaults matching the
/// reference keyboard: two staggered QWERTY rows covering one octave
/// and a half upward from middle C.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Physical key symbols, one per semitone starting at `base_note`.
    pub key_layout: String,
    /// Note number of the first symbol in `key_layout`.
    pub base_note: i32,
    /// Seconds over which a released voice ramps to silence.
    pub sustain_time: f64,
    /// Fixed loudness passed to the tone generator (0-127).
    pub loudness: u8,
    /// Fixed attack duration passed to the tone generator, in seconds.
    pub attack: f64,
    /// Master output level applied by audio backends (0.0-1.0).
    pub master_level: f32,
    /// Note window used when the keyboard is in compact range mode.
    pub compact_window: NoteRange,
    /// Symbol that shifts the transposition down one octave.
    pub transpose_down: char,
    /// Symbol that shifts the transposition up one octave.
    pub transpose_up: char,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_layout: "awsedftgyhujkolp;'".to_string(),
            base_note: 60,
            sustain_time: 0.5,
            loudness: 60,
            attack: 0.3,
            master_level: 0.6,
            compact_window: NoteRange::new(48, 84),
            transpose_down: 'z',
            transpose_up: 'x',
        }
    }
}

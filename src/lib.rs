pub mod config;
pub mod engine; // Session hub: voice registry, replay scheduling
pub mod instrument;
pub mod layout; // Keyboard geometry from a note range
pub mod mapping; // Physical key symbols to note numbers
pub mod recorder;
pub mod synth; // Tone generator capability and backends

pub const SEMITONES_PER_OCTAVE: i32 = 12;

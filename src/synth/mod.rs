//! Tone generator capability and backends.
//!
//! The engine never renders audio itself. It issues fire-and-forget
//! commands to a [`ToneGenerator`] it was handed at construction: begin a
//! tone now, and later shape that tone's release through the returned
//! handle. Backends run on their own clock (an audio callback, a test
//! log) and completion is never awaited.

#[cfg(feature = "rtrb")]
pub mod sine;

use std::time::Instant;

/// Shapes one sounding tone after it has started.
pub trait ToneHandle {
    /// Drop any level changes scheduled at or after `at`.
    fn cancel_scheduled(&mut self, at: f64);

    /// Linearly ramp the tone's output level, arriving at `level` at
    /// time `at`.
    fn ramp_level_to(&mut self, level: f32, at: f64);
}

/// Starts tones. One generator serves every instrument in the catalog;
/// the program number selects the timbre.
pub trait ToneGenerator {
    type Handle: ToneHandle;

    fn begin_tone(
        &mut self,
        program: u8,
        start: f64,
        note: u8,
        velocity: u8,
        attack: f64,
    ) -> Self::Handle;
}

/// The engine's time source, in seconds. Matches the clock the tone
/// generator schedules against.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall-clock seconds since construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

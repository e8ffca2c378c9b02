//! Active-voice bookkeeping.
//!
//! At most one voice per note number. Starting an already-sounding note
//! and stopping a silent one are both no-ops, which makes the engine's
//! play/stop idempotent under duplicate input (key auto-repeat, mouse
//! and keyboard landing on the same note).

use std::collections::HashMap;

/// Result of a start request.
pub enum StartOutcome<'a, H> {
    /// A new voice was allocated.
    Started(&'a mut H),
    /// The note was already sounding; nothing changed.
    AlreadyActive,
}

pub struct VoiceRegistry<H> {
    voices: HashMap<u8, H>,
}

impl<H> VoiceRegistry<H> {
    pub fn new() -> Self {
        Self { voices: HashMap::new() }
    }

    /// Start a voice for `note`, allocating a handle with `begin` only if
    /// the note is not already sounding.
    pub fn start<F>(&mut self, note: u8, begin: F) -> StartOutcome<'_, H>
    where
        F: FnOnce() -> H,
    {
        use std::collections::hash_map::Entry;

        match self.voices.entry(note) {
            Entry::Occupied(_) => StartOutcome::AlreadyActive,
            Entry::Vacant(slot) => StartOutcome::Started(slot.insert(begin())),
        }
    }

    /// Remove and return the voice for `note`, if it is sounding.
    pub fn stop(&mut self, note: u8) -> Option<H> {
        self.voices.remove(&note)
    }

    pub fn is_active(&self, note: u8) -> bool {
        self.voices.contains_key(&note)
    }

    /// Notes currently sounding, in no particular order.
    pub fn sounding(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

impl<H> Default for VoiceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_is_a_no_op() {
        let mut registry: VoiceRegistry<u32> = VoiceRegistry::new();
        let mut allocations = 0;

        for _ in 0..2 {
            registry.start(64, || {
                allocations += 1;
                allocations
            });
        }

        assert_eq!(allocations, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stop_returns_the_original_handle() {
        let mut registry: VoiceRegistry<&str> = VoiceRegistry::new();
        registry.start(60, || "voice");

        assert_eq!(registry.stop(60), Some("voice"));
        assert_eq!(registry.stop(60), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn stray_stop_is_a_no_op() {
        let mut registry: VoiceRegistry<u32> = VoiceRegistry::new();
        assert_eq!(registry.stop(99), None);
    }

    #[test]
    fn size_tracks_sounding_notes() {
        let mut registry: VoiceRegistry<u32> = VoiceRegistry::new();
        registry.start(60, || 0);
        registry.start(64, || 1);
        registry.start(67, || 2);
        assert_eq!(registry.len(), 3);

        registry.stop(64);
        assert_eq!(registry.len(), 2);
        let mut sounding: Vec<u8> = registry.sounding().collect();
        sounding.sort_unstable();
        assert_eq!(sounding, [60, 67]);
    }
}

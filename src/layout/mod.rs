//! Keyboard geometry from a note range.
//!
//! Positions are in natural-key widths; the renderer multiplies by
//! whatever pixel or cell width it likes. Natural keys (pitch classes
//! 0 2 4 5 7 9 11) advance left to right one width at a time. Raised
//! keys sit at fixed fractional offsets from the start of their octave
//! group: 0.65 for C#, 1.65 for D#, 3.65 F#, 4.65 G#, 5.65 A#, which is
//! the same as 0.65 past the preceding natural, so a raised key always
//! straddles the gap between its two naturals even when the range
//! starts mid-octave. The position is computed as integer naturals plus
//! one fractional constant; summing group anchor and offset as floats
//! loses the low bits when the two nearly cancel.
//!
//! Generation is pure and wholesale: any instrument or range change
//! rebuilds the slot list from scratch.

use crate::instrument::NoteRange;

/// Fraction of a natural-key width between a natural and the raised key
/// above it.
const RAISED_FRACTION: f32 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Natural,
    Raised,
}

/// One rendered key: a note, a horizontal position in natural-key
/// widths, and whether it is a natural or raised key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySlot {
    pub note: u8,
    pub x: f32,
    pub kind: KeyKind,
}

pub fn is_natural(note: u8) -> bool {
    !matches!(note % 12, 1 | 3 | 6 | 8 | 10)
}

/// Lay out every note in the range, ascending.
pub fn generate(range: NoteRange) -> Vec<KeySlot> {
    let mut slots = Vec::with_capacity(usize::from(range.max.saturating_sub(range.min)) + 1);
    let mut natural_count: i32 = 0;

    for note in range.min..=range.max {
        if is_natural(note) {
            slots.push(KeySlot {
                note,
                x: natural_count as f32,
                kind: KeyKind::Natural,
            });
            natural_count += 1;
        } else {
            // 0.65 widths past the preceding natural's slot. Keeping the
            // anchor integral until the final conversion makes the whole
            // part exact.
            slots.push(KeySlot {
                note,
                x: (natural_count - 1) as f32 + RAISED_FRACTION,
                kind: KeyKind::Raised,
            });
        }
    }

    slots
}

/// Number of natural keys in the range (the keyboard's total width in
/// natural-key units).
pub fn natural_width(range: NoteRange) -> u32 {
    (range.min..=range.max).filter(|&n| is_natural(n)).count() as u32
}

//! Built-in tone sequences, timed for a 1 ms audio tick.

use super::Tone;

/// Length of a per-pulse tick.
pub const TICK_TICKS: u32 = 4;

const TICK_HIGH_HZ: u32 = 2_000;
const TICK_LOW_HZ: u32 = 1_000;

/// High-pitched per-pulse click with LED flash.
pub const TICK_HIGH: [Tone; 2] = [
    Tone::new(TICK_HIGH_HZ, Tone::LOW, true, TICK_TICKS),
    Tone::END,
];

/// Low-pitched per-pulse click with LED flash.
pub const TICK_LOW: [Tone; 2] = [
    Tone::new(TICK_LOW_HZ, Tone::LOW, true, TICK_TICKS),
    Tone::END,
];

// Start-up motif transposed down by a fourth (x0.75), 85 ms beat.
const BEAT: u32 = 85;
const D: u32 = 881;
const E: u32 = 989;
const F_SHARP: u32 = 1_110;
const G: u32 = 1_176;
const B: u32 = 741;
const C: u32 = 785;

/// Played once at boot.
pub const START: [Tone; 15] = [
    Tone::new(D, Tone::HIGH, false, 2 * BEAT),
    Tone::rest(2 * BEAT),
    Tone::new(E, Tone::HIGH, false, 2 * BEAT),
    Tone::rest(2 * BEAT),
    Tone::new(F_SHARP, Tone::HIGH, false, 2 * BEAT),
    Tone::rest(2 * BEAT),
    Tone::new(G, Tone::HIGH, false, 4 * BEAT),
    Tone::new(D, Tone::HIGH, false, 2 * BEAT),
    Tone::new(E, Tone::HIGH, false, 2 * BEAT),
    Tone::new(D, Tone::HIGH, false, 4 * BEAT),
    Tone::new(B, Tone::HIGH, false, 2 * BEAT),
    Tone::new(C, Tone::HIGH, false, 2 * BEAT),
    Tone::new(B, Tone::HIGH, false, 4 * BEAT),
    Tone::new(B, Tone::LOW, false, 4 * BEAT),
    Tone::END,
];

const ALARM_HIGH_HZ: u32 = 3_000;
const ALARM_LOW_HZ: u32 = 2_000;
const ALARM_NOTE: u32 = 150;

/// Two-tone warning with the LED lit on the high note.
pub const ALARM: [Tone; 7] = [
    Tone::new(ALARM_HIGH_HZ, Tone::HIGH, true, ALARM_NOTE),
    Tone::new(ALARM_LOW_HZ, Tone::HIGH, false, ALARM_NOTE),
    Tone::new(ALARM_HIGH_HZ, Tone::HIGH, true, ALARM_NOTE),
    Tone::new(ALARM_LOW_HZ, Tone::HIGH, false, ALARM_NOTE),
    Tone::new(ALARM_HIGH_HZ, Tone::HIGH, true, ALARM_NOTE),
    Tone::new(ALARM_LOW_HZ, Tone::HIGH, false, ALARM_NOTE),
    Tone::END,
];

/// Total ticks a sequence plays before reaching its terminator.
pub fn sequence_ticks(sequence: &[Tone]) -> u32 {
    sequence
        .iter()
        .take_while(|tone| !tone.is_end())
        .map(|tone| tone.duration)
        .sum()
}

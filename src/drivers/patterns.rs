//! Light and sound patterns for the play and hunting routines.
//!
//! Pure data plus a few helpers; the drivers in [`pixels`](super::pixels)
//! and [`buzzer`](super::buzzer) turn them into RMT frames and LEDC tones.
//!
//! ## Chirp
//!
//! A bird-like call built from short frequency sweeps:
//!
//! | Phase | Sweep   | Repeats | Gap after each |
//! |-------|---------|---------|----------------|
//! | 1     | falling | 5       | 100 ms         |
//! | 2     | rising  | 10      | 100 ms         |
//! | 3     | falling | 1       | 400 ms         |
//! | 4     | falling | 5       | 400 ms         |
//! | 5     | rising  | 10      | 100 ms         |
//! | 6     | falling | 1       |                |

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const OFF: Rgb = (0, 0, 0);

/// Colour-cycle palette, in display order.
pub const PALETTE: [Rgb; 10] = [
    (255, 0, 0),     // Red
    (255, 165, 0),   // Orange
    (255, 215, 0),   // Gold
    (255, 255, 0),   // Yellow
    (0, 255, 0),     // Green
    (0, 128, 128),   // Teal
    (0, 0, 255),     // Blue
    (75, 0, 130),    // Indigo
    (148, 0, 211),   // Violet
    (255, 192, 203), // Pink
];

/// Dwell per palette colour.
pub const COLOUR_STEP_MS: u32 = 250;
/// Full passes over the palette per cycle.
pub const COLOUR_PASSES: usize = 2;
/// Dark pause after each pass.
pub const PASS_GAP_MS: u32 = 500;

// ── Round timing ──────────────────────────────────────────────

/// Motor drive time per direction, random within `[lo, hi)`.
pub const MOTOR_RUN_MS: (u32, u32) = (500, 2_000);
/// Rest after each motor run.
pub const MOTOR_REST_MS: (u32, u32) = (500, 1_000);
/// Pause closing a play round.
pub const PLAY_ROUND_GAP_MS: (u32, u32) = (500, 1_000);
/// Pause between the chirp and the light show in a hunting round.
pub const HUNT_GAP_MS: (u32, u32) = (300, 700);
/// Fixed pause closing a hunting round.
pub const HUNT_ROUND_TAIL_MS: u32 = 1_000;

// ── Chirp ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChirpPhase {
    pub sweep: Sweep,
    pub repeats: u8,
    pub gap_ms: u32,
}

const fn phase(sweep: Sweep, repeats: u8, gap_ms: u32) -> ChirpPhase {
    ChirpPhase { sweep, repeats, gap_ms }
}

pub const CHIRP_SEQUENCE: [ChirpPhase; 6] = [
    phase(Sweep::Falling, 5, 100),
    phase(Sweep::Rising, 10, 100),
    phase(Sweep::Falling, 1, 400),
    phase(Sweep::Falling, 5, 400),
    phase(Sweep::Rising, 10, 100),
    phase(Sweep::Falling, 1, 0),
];

/// Sweep band.  Period runs linearly between 300 µs and 62 µs.
pub const SWEEP_LONG_PERIOD_US: u32 = 300;
pub const SWEEP_SHORT_PERIOD_US: u32 = 62;
pub const SWEEP_STEPS: usize = 16;
pub const SWEEP_STEP_MS: u32 = 6;

/// Note frequencies for one sweep, in playing order.
pub fn sweep_steps(sweep: Sweep) -> [u32; SWEEP_STEPS] {
    let span = SWEEP_LONG_PERIOD_US - SWEEP_SHORT_PERIOD_US;
    let last = (SWEEP_STEPS - 1) as u32;
    let mut out = [0u32; SWEEP_STEPS];
    for (i, slot) in out.iter_mut().enumerate() {
        // i = 0 is the low note (longest period)
        let period_us = SWEEP_LONG_PERIOD_US - span * i as u32 / last;
        *slot = 1_000_000 / (2 * period_us);
    }
    if sweep == Sweep::Falling {
        out.reverse();
    }
    out
}

/// Wall time of one full chirp.
pub fn chirp_duration_ms() -> u32 {
    let sweep_ms = SWEEP_STEPS as u32 * SWEEP_STEP_MS;
    CHIRP_SEQUENCE
        .iter()
        .map(|p| u32::from(p.repeats) * (sweep_ms + p.gap_ms))
        .sum()
}

/// Wall time of one colour cycle (all passes, including gaps).
pub fn colour_cycle_duration_ms() -> u32 {
    COLOUR_PASSES as u32 * (PALETTE.len() as u32 * COLOUR_STEP_MS + PASS_GAP_MS)
}

/// Upper bound on one play round: both motor runs, an optional chirp,
/// the colour cycle with its hold and the closing pause.
pub fn play_round_max_ms(chirps: bool, led_hold_ms: u32) -> u64 {
    let motor = 2 * u64::from(MOTOR_RUN_MS.1 + MOTOR_REST_MS.1);
    let chirp = if chirps { u64::from(chirp_duration_ms()) } else { 0 };
    motor
        + chirp
        + u64::from(colour_cycle_duration_ms())
        + u64::from(led_hold_ms)
        + u64::from(PLAY_ROUND_GAP_MS.1)
}

/// Upper bound on one hunting round.
pub fn hunting_round_max_ms(led_hold_ms: u32) -> u64 {
    u64::from(chirp_duration_ms())
        + u64::from(HUNT_GAP_MS.1)
        + u64::from(colour_cycle_duration_ms())
        + u64::from(led_hold_ms)
        + u64::from(HUNT_ROUND_TAIL_MS)
}

//! Controller state and the context threaded through every state handler.
//!
//! [`ControllerState`] is the single mutable core value: it is passed into
//! [`Controller::tick`](super::Controller::tick) and a new one is returned,
//! so there is no hidden shared state.  During a tick the handlers work on
//! an [`FsmContext`], which bundles that state with the current time, the
//! classified motion reading and the thresholds.

use crate::ledger::{DurationLedger, Segment, TelemetryReport};
use crate::motion::MotionReading;

use super::Mode;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// The subset of configuration the transition guards read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Magnitude (g) strictly above which motion is detected.
    pub motion_threshold_g: f32,
    /// Play → Hunting on a quiet tick at least this long after entering Play.
    pub idle_to_hunt_ms: u64,
    /// Hunting → Sleep once this long has passed since entry.
    pub hunt_to_sleep_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        crate::config::ToyConfig::default().controller()
    }
}

// ---------------------------------------------------------------------------
// ControllerState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub(super) mode: Mode,
    pub(super) mode_entered_at: u64,
    pub(super) ledger: DurationLedger,
}

impl ControllerState {
    /// Boot value: Play, counters at zero, awake segment starting at `now`.
    /// Does not run any entry action; use [`Controller::start`](super::Controller::start).
    pub const fn boot(now: u64) -> Self {
        Self {
            mode: Mode::Play,
            mode_entered_at: now,
            ledger: DurationLedger::new(now, Segment::Awake),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mode_entered_at(&self) -> u64 {
        self.mode_entered_at
    }

    pub fn ledger(&self) -> &DurationLedger {
        &self.ledger
    }

    pub fn cumulative_play_ms(&self) -> u64 {
        self.ledger.play_ms()
    }

    pub fn cumulative_sleep_ms(&self) -> u64 {
        self.ledger.sleep_ms()
    }

    pub fn report(&self) -> TelemetryReport {
        self.ledger.report()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    /// Clock reading for this tick (ms since boot).
    pub now: u64,
    /// This tick's motion classification.
    pub reading: MotionReading,
    /// Thresholds for the guards.
    pub config: ControllerConfig,
    /// The state being advanced.
    pub state: ControllerState,
}

impl FsmContext {
    pub fn new(state: ControllerState, config: ControllerConfig, now: u64, reading: MotionReading) -> Self {
        Self {
            now,
            reading,
            config,
            state,
        }
    }

    /// Milliseconds since the current mode was entered (0 on rollback).
    pub fn ms_in_mode(&self) -> u64 {
        self.now.saturating_sub(self.state.mode_entered_at)
    }
}

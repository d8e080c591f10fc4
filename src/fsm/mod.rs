//! Function-pointer finite state machine driving the toy's behaviour.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ Mode    │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Play    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Hunting │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Sleep   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`Controller`] is pure: it owns only the table and thresholds.  Each
//! tick takes a [`ControllerState`] by value and returns the next one.
//!
//! Per tick:
//! 1. Fold the live ledger segment up to `now`.
//! 2. Call `on_update` for the current mode, exactly once.
//! 3. On `Some(next)`: `on_exit(current)` → switch → `on_enter(next)`.
//!    The new mode's timers and segment start at `now`.  The new mode's
//!    guards are not evaluated until the next tick.

pub mod context;
pub mod states;

use context::{ControllerConfig, ControllerState, FsmContext};
use log::info;

use crate::ledger::TelemetryReport;
use crate::motion::{MotionReading, MotionSample};

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Behavioural mode.  Must stay in sync with [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    Play = 0,
    Hunting = 1,
    Sleep = 2,
}

impl Mode {
    /// Number of modes; sizes the state table.
    pub const COUNT: usize = 3;

    /// Play and Hunting both count as awake time.
    pub fn is_awake(self) -> bool {
        !matches!(self, Self::Sleep)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick guard evaluation.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<Mode>;

/// One row in the state table.
pub struct StateDescriptor {
    pub id: Mode,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Tick results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    pub at_ms: u64,
}

/// Everything a caller needs after one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Mode after the tick.
    pub mode: Mode,
    /// Set when this tick changed mode.
    pub transition: Option<Transition>,
    /// Counters after accrual, ready for the telemetry sink.
    pub report: TelemetryReport,
    /// How the sample was classified.
    pub reading: MotionReading,
    /// Milliseconds folded into a counter by this tick.
    pub credited_ms: u64,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct Controller {
    /// Fixed-size table indexed by `Mode as usize`.
    table: [StateDescriptor; Mode::COUNT],
    config: ControllerConfig,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            table: states::build_state_table(),
            config,
        }
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    /// Swap thresholds.  Takes effect on the next tick.
    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    /// Boot state: Play entered at `now`, counters at zero.
    pub fn start(&self, now: u64) -> ControllerState {
        let mut ctx = self.context(ControllerState::boot(now), now, MotionSample::ZERO);
        info!("Controller starting in {}", self.table[Mode::Play as usize].name);
        if let Some(enter) = self.table[Mode::Play as usize].on_enter {
            enter(&mut ctx);
        }
        ctx.state
    }

    /// Advance by one control-loop iteration.
    pub fn tick(
        &self,
        state: ControllerState,
        now: u64,
        sample: MotionSample,
    ) -> (ControllerState, TickOutcome) {
        let mut ctx = self.context(state, now, sample);
        let credited_ms = ctx.state.ledger.accrue(now);

        let current = ctx.state.mode;
        let transition = (self.table[current as usize].on_update)(&mut ctx)
            .filter(|next| *next != current)
            .map(|next| self.transition(next, &mut ctx));

        let outcome = TickOutcome {
            mode: ctx.state.mode,
            transition,
            report: ctx.state.report(),
            reading: ctx.reading,
            credited_ms,
        };
        (ctx.state, outcome)
    }

    /// Zero both counters and restart both segments at `now`.  Mode and
    /// mode timers are untouched.
    pub fn reset_accumulators(&self, state: ControllerState, now: u64) -> ControllerState {
        let mut state = state;
        state.ledger.reset(now);
        state
    }

    /// Jump to `target` outside the normal guards (operator wake, tests).
    /// Accrues up to `now` first so no interval is lost.
    pub fn force_mode(
        &self,
        state: ControllerState,
        target: Mode,
        now: u64,
    ) -> (ControllerState, Option<Transition>) {
        let mut ctx = self.context(state, now, MotionSample::ZERO);
        ctx.state.ledger.accrue(now);
        if target == ctx.state.mode {
            return (ctx.state, None);
        }
        let t = self.transition(target, &mut ctx);
        (ctx.state, Some(t))
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn context(&self, state: ControllerState, now: u64, sample: MotionSample) -> FsmContext {
        let reading = MotionReading::classify(sample, self.config.motion_threshold_g);
        FsmContext::new(state, self.config, now, reading)
    }

    fn transition(&self, next: Mode, ctx: &mut FsmContext) -> Transition {
        let from = ctx.state.mode;
        info!(
            "Controller transition: {} -> {} at {}ms",
            self.table[from as usize].name, self.table[next as usize].name, ctx.now
        );

        if let Some(exit) = self.table[from as usize].on_exit {
            exit(ctx);
        }

        ctx.state.mode = next;

        if let Some(enter) = self.table[next as usize].on_enter {
            enter(ctx);
        }

        Transition {
            from,
            to: next,
            at_ms: ctx.now,
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_step() -> impl Strategy<Value = (u64, f32)> {
        (
            0u64..20_000, // ms since previous tick
            0.0f32..2.0,  // motion magnitude
        )
    }

    proptest! {
        #[test]
        fn at_most_one_transition_per_tick(steps in proptest::collection::vec(arb_step(), 1..200)) {
            let ctl = Controller::default();
            let mut s = ctl.start(0);
            let mut now = 0u64;
            for (dt, mag) in steps {
                now += dt;
                let before = s.mode();
                let (next, out) = ctl.tick(s, now, MotionSample::new(mag, 0.0));
                match out.transition {
                    Some(t) => {
                        prop_assert_eq!(t.from, before);
                        prop_assert_eq!(t.to, next.mode());
                        prop_assert_ne!(t.from, t.to);
                        prop_assert_eq!(next.mode_entered_at(), now);
                    }
                    None => prop_assert_eq!(next.mode(), before),
                }
                s = next;
            }
        }

        #[test]
        fn live_segment_matches_mode(steps in proptest::collection::vec(arb_step(), 1..200)) {
            let ctl = Controller::default();
            let mut s = ctl.start(0);
            let mut now = 0u64;
            for (dt, mag) in steps {
                now += dt;
                s = ctl.tick(s, now, MotionSample::new(mag, 0.0)).0;
                let awake = s.ledger().live() == crate::ledger::Segment::Awake;
                prop_assert_eq!(awake, s.mode().is_awake());
            }
        }
    }
}

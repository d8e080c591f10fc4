//! Concrete state handler functions and table builder.
//!
//! Each mode is three plain `fn` pointers operating on [`FsmContext`].
//! Accrual happens in the engine before `on_update` runs; handlers only
//! move timers and the live ledger segment.
//!
//! ```text
//!  PLAY ──[quiet, in mode >= idle_to_hunt]──▶ HUNTING ──[in mode >= hunt_to_sleep]──▶ SLEEP
//!    ▲                                            │                                      │
//!    └─────────────────[motion]───────────────────┘                                      │
//!    └──────────────────────────────────────[motion]─────────────────────────────────────┘
//! ```
//!
//! Play measures from its own entry, not from the last motion: a cat that
//! keeps batting the ball does not hold off Hunting, it just has to be
//! still on the tick the threshold is checked.
//!
//! In Hunting the motion guard is checked first, so when both guards hold
//! on the same tick the toy wakes into Play instead of going to sleep.

use log::{debug, info};

use super::context::FsmContext;
use super::{Mode, StateDescriptor};
use crate::ledger::Segment;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per controller.
pub fn build_state_table() -> [StateDescriptor; Mode::COUNT] {
    [
        // Index 0: Play
        StateDescriptor {
            id: Mode::Play,
            name: "Play",
            on_enter: Some(play_enter),
            on_exit: None,
            on_update: play_update,
        },
        // Index 1: Hunting
        StateDescriptor {
            id: Mode::Hunting,
            name: "Hunting",
            on_enter: Some(hunting_enter),
            on_exit: None,
            on_update: hunting_update,
        },
        // Index 2: Sleep
        StateDescriptor {
            id: Mode::Sleep,
            name: "Sleep",
            on_enter: Some(sleep_enter),
            on_exit: Some(sleep_exit),
            on_update: sleep_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  PLAY
// ═══════════════════════════════════════════════════════════════════════════

fn play_enter(ctx: &mut FsmContext) {
    ctx.state.mode_entered_at = ctx.now;
    ctx.state.ledger.switch_to(Segment::Awake, ctx.now);
    info!("PLAY: entered at {}ms", ctx.now);
}

fn play_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.reading.quiescent() && ctx.ms_in_mode() >= ctx.config.idle_to_hunt_ms {
        info!("PLAY: quiet {}ms into play, start hunting", ctx.ms_in_mode());
        return Some(Mode::Hunting);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HUNTING: still awake, trying to lure the cat back
// ═══════════════════════════════════════════════════════════════════════════

fn hunting_enter(ctx: &mut FsmContext) {
    ctx.state.mode_entered_at = ctx.now;
    // Hunting counts as play time; the awake segment keeps running.
    ctx.state.ledger.switch_to(Segment::Awake, ctx.now);
}

fn hunting_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.reading.detected {
        info!("HUNTING: motion {:.2}g, back to play", ctx.reading.magnitude);
        return Some(Mode::Play);
    }

    if ctx.ms_in_mode() >= ctx.config.hunt_to_sleep_ms {
        info!("HUNTING: no response after {}ms, going to sleep", ctx.ms_in_mode());
        return Some(Mode::Sleep);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEP: actuators off, waiting for the cat
// ═══════════════════════════════════════════════════════════════════════════

fn sleep_enter(ctx: &mut FsmContext) {
    ctx.state.mode_entered_at = ctx.now;
    ctx.state.ledger.switch_to(Segment::Asleep, ctx.now);
    info!(
        "SLEEP: play total {}ms, sleep total {}ms",
        ctx.state.ledger.play_ms(),
        ctx.state.ledger.sleep_ms()
    );
}

fn sleep_exit(ctx: &mut FsmContext) {
    debug!("SLEEP: woke after {}ms", ctx.ms_in_mode());
}

fn sleep_update(ctx: &mut FsmContext) -> Option<Mode> {
    if ctx.reading.detected {
        return Some(Mode::Play);
    }
    None
}

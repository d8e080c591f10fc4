//! Mode controller scenarios, driven tick by tick with a pure state value.

use cattoy::fsm::context::{ControllerConfig, ControllerState};
use cattoy::fsm::{Controller, Mode};
use cattoy::motion::MotionSample;

const QUIET: MotionSample = MotionSample::ZERO;

fn moving(g: f32) -> MotionSample {
    MotionSample::new(g, 0.0)
}

fn controller() -> Controller {
    Controller::new(ControllerConfig::default())
}

/// Mode at `t`, entered at `t`, counters at zero.
fn entered(ctl: &Controller, mode: Mode, t: u64) -> ControllerState {
    let (state, _) = ctl.force_mode(ctl.start(t), mode, t);
    ctl.reset_accumulators(state, t)
}

#[test]
fn sustained_quiet_play_hunts_at_thirty_seconds() {
    let ctl = controller();
    let mut state = ctl.start(0);
    let mut fired_at = None;

    for t in (250..=30_000).step_by(250) {
        let (next, out) = ctl.tick(state, t, QUIET);
        state = next;
        if let Some(tr) = out.transition {
            assert_eq!(fired_at, None, "second transition at {t}");
            assert_eq!((tr.from, tr.to), (Mode::Play, Mode::Hunting));
            fired_at = Some(t);
        }
    }

    assert_eq!(fired_at, Some(30_000));
    assert_eq!(state.mode(), Mode::Hunting);
    assert_eq!(state.cumulative_play_ms(), 30_000);
    assert_eq!(state.cumulative_sleep_ms(), 0);
}

#[test]
fn motion_in_hunting_returns_to_play_and_restarts_timer() {
    let ctl = controller();
    let mut state = entered(&ctl, Mode::Hunting, 0);

    for t in (1_000..5_000).step_by(1_000) {
        let (next, out) = ctl.tick(state, t, QUIET);
        assert!(out.transition.is_none());
        state = next;
    }

    let (state, out) = ctl.tick(state, 5_000, moving(0.8));
    let tr = out.transition.expect("motion should end hunting");
    assert_eq!((tr.from, tr.to, tr.at_ms), (Mode::Hunting, Mode::Play, 5_000));
    assert_eq!(state.mode(), Mode::Play);
    assert_eq!(state.mode_entered_at(), 5_000);
}

#[test]
fn unanswered_hunting_sleeps_at_sixty_seconds() {
    let ctl = controller();
    let mut state = entered(&ctl, Mode::Hunting, 0);

    for t in (1_000..60_000).step_by(1_000) {
        let (next, out) = ctl.tick(state, t, QUIET);
        assert!(out.transition.is_none(), "early transition at {t}");
        state = next;
    }

    let (state, out) = ctl.tick(state, 60_000, QUIET);
    let tr = out.transition.expect("timeout should put the toy to sleep");
    assert_eq!((tr.from, tr.to), (Mode::Hunting, Mode::Sleep));
    assert_eq!(state.mode(), Mode::Sleep);
    // Hunting counts as play.
    assert_eq!(state.cumulative_play_ms(), 60_000);
    assert_eq!(state.cumulative_sleep_ms(), 0);
}

#[test]
fn waking_from_sleep_freezes_sleep_counter() {
    let ctl = controller();
    let mut state = entered(&ctl, Mode::Sleep, 0);

    for t in (1_000..10_000).step_by(1_000) {
        state = ctl.tick(state, t, QUIET).0;
    }

    let (mut state, out) = ctl.tick(state, 10_000, moving(0.6));
    assert_eq!(out.transition.map(|t| t.to), Some(Mode::Play));
    assert_eq!(state.cumulative_sleep_ms(), 10_000);
    assert_eq!(state.cumulative_play_ms(), 0);

    for t in (11_000..=20_000).step_by(1_000) {
        state = ctl.tick(state, t, moving(0.6)).0;
    }
    assert_eq!(state.cumulative_sleep_ms(), 10_000);
    assert_eq!(state.cumulative_play_ms(), 10_000);
}

#[test]
fn hunting_motion_beats_timeout_on_same_tick() {
    let ctl = controller();
    let state = entered(&ctl, Mode::Hunting, 0);
    let (state, out) = ctl.tick(state, 60_000, moving(1.0));
    assert_eq!(out.transition.map(|t| t.to), Some(Mode::Play));
    assert_eq!(state.mode(), Mode::Play);
}

#[test]
fn late_motion_in_play_does_not_postpone_hunting() {
    let ctl = controller();
    let state = ctl.start(0);

    let (state, out) = ctl.tick(state, 29_000, moving(1.0));
    assert!(out.transition.is_none());

    let (state, out) = ctl.tick(state, 31_000, QUIET);
    assert_eq!(out.transition.map(|t| t.to), Some(Mode::Hunting));
    assert_eq!(state.mode_entered_at(), 31_000);
}

#[test]
fn play_keeps_going_while_the_cat_is_moving() {
    let ctl = controller();
    let mut state = ctl.start(0);
    for t in (10_000..=60_000).step_by(10_000) {
        let (next, out) = ctl.tick(state, t, moving(0.7));
        assert_eq!(out.mode, Mode::Play, "left Play at {t}");
        state = next;
    }
    let (_, out) = ctl.tick(state, 61_000, QUIET);
    assert_eq!(out.transition.map(|t| t.to), Some(Mode::Hunting));
}

#[test]
fn threshold_itself_is_quiet() {
    let ctl = controller();
    let state = entered(&ctl, Mode::Sleep, 0);
    let (state, out) = ctl.tick(state, 1_000, moving(0.5));
    assert!(out.transition.is_none());
    assert_eq!(state.mode(), Mode::Sleep);
}

#[test]
fn non_finite_sample_never_wakes() {
    let ctl = controller();
    let state = entered(&ctl, Mode::Sleep, 0);
    for (t, s) in [
        (1_000, MotionSample::new(f32::NAN, 0.0)),
        (2_000, MotionSample::new(f32::INFINITY, 1.0)),
        (3_000, MotionSample::new(0.0, f32::NEG_INFINITY)),
    ] {
        let (_, out) = ctl.tick(state, t, s);
        assert!(out.transition.is_none());
        assert!(!out.reading.valid);
    }
}

#[test]
fn one_transition_per_tick_even_after_a_long_gap() {
    let ctl = controller();
    let state = ctl.start(0);
    // Far past both thresholds: Play can only step to Hunting.
    let (state, out) = ctl.tick(state, 1_000_000, QUIET);
    assert_eq!(out.transition.map(|t| t.to), Some(Mode::Hunting));
    assert_eq!(state.mode(), Mode::Hunting);
    assert_eq!(state.mode_entered_at(), 1_000_000);
}

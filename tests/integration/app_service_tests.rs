//! Integration tests for the AppService → Controller → actuation pipeline.
//!
//! Every actuation call advances the mock clock by one loop period, so
//! the ledger sees the same wall-clock cost a real blocking sequence has.

use crate::mock_hw::{
    Actuation, ManualClock, MemConfigStore, RecordingSink, RecordingTelemetry, ScriptedToy,
};

use cattoy::adapters::console::{self, pump_lines};
use cattoy::app::commands::AppCommand;
use cattoy::app::events::AppEvent;
use cattoy::app::ports::Clock;
use cattoy::app::service::AppService;
use cattoy::config::ToyConfig;
use cattoy::error::{SensorError, TelemetryError};
use cattoy::events::Event;
use cattoy::fsm::Mode;
use cattoy::motion::MotionSample;

const STEP_MS: u64 = 250;

struct Rig {
    app: AppService,
    clock: ManualClock,
    toy: ScriptedToy,
    telemetry: RecordingTelemetry,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: ToyConfig) -> Self {
        let clock = ManualClock::at(0);
        let mut sink = RecordingSink::default();
        let mut app = AppService::new(config);
        app.start(&clock, &mut sink);
        Self {
            app,
            toy: ScriptedToy::new(clock.clone(), STEP_MS),
            clock,
            telemetry: RecordingTelemetry::default(),
            sink,
        }
    }

    fn tick(&mut self) -> Mode {
        self.app
            .tick(&mut self.toy, &self.clock, &mut self.telemetry, &mut self.sink)
            .mode
    }

    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app.handle_command(cmd, &self.clock, &mut self.sink);
    }
}

#[test]
fn starts_in_play_with_zero_counters() {
    let rig = Rig::new(ToyConfig::default());
    assert_eq!(rig.app.mode(), Mode::Play);
    assert_eq!(rig.app.report().play_time_ms, 0);
    assert_eq!(rig.app.report().sleep_time_ms, 0);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(Mode::Play)]);
}

#[test]
fn full_day_cycle_accounts_every_millisecond() {
    let mut rig = Rig::new(ToyConfig::default());

    // 30 s of quiet play.
    rig.ticks(119);
    assert_eq!(rig.app.mode(), Mode::Play);
    assert_eq!(rig.tick(), Mode::Hunting);
    assert_eq!(rig.clock.now_ms(), 30_000);

    // 60 s of unanswered hunting.
    rig.ticks(239);
    assert_eq!(rig.app.mode(), Mode::Hunting);
    assert_eq!(rig.tick(), Mode::Sleep);
    assert_eq!(rig.app.report().play_time_ms, 90_000);
    assert_eq!(rig.app.report().sleep_time_ms, 0);

    // 10 s asleep, then the cat bats the ball.
    rig.ticks(40);
    rig.toy.push_motion(0.9);
    assert_eq!(rig.tick(), Mode::Play);

    let report = rig.app.report();
    assert_eq!(report.play_time_ms, 90_000);
    assert_eq!(report.sleep_time_ms, 10_250);
    assert_eq!(report.play_time_ms + report.sleep_time_ms, rig.clock.now_ms());

    assert_eq!(rig.toy.count(Actuation::Play), 120);
    assert_eq!(rig.toy.count(Actuation::Hunting), 240);
    assert_eq!(rig.toy.count(Actuation::Quiescent), 41);
    assert_eq!(rig.sink.mode_changes(), 3);
}

#[test]
fn actuation_follows_mode_at_tick_start() {
    let mut rig = Rig::new(ToyConfig::default());
    rig.tick();
    rig.command(AppCommand::ForceMode(Mode::Hunting));
    rig.tick();
    rig.command(AppCommand::ForceMode(Mode::Sleep));
    rig.tick();
    assert_eq!(
        rig.toy.calls,
        [Actuation::Play, Actuation::Hunting, Actuation::Quiescent]
    );
}

#[test]
fn telemetry_reports_every_tick_by_default() {
    let mut rig = Rig::new(ToyConfig::default());
    rig.ticks(4);
    let plays: Vec<u64> = rig.telemetry.reports.iter().map(|r| r.play_time_ms).collect();
    assert_eq!(plays, [250, 500, 750, 1_000]);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Telemetry { status: 200, .. }
    )));
}

#[test]
fn failed_delivery_does_not_touch_counters() {
    let mut rig = Rig::new(ToyConfig::default());
    rig.telemetry.fail_with = Some(TelemetryError::ConnectFailed);
    rig.ticks(8);

    assert_eq!(rig.app.report().play_time_ms, 2_000);
    let failures = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::TelemetryDeliveryFailed { .. }))
        .count();
    assert_eq!(failures, 8);

    // Recovery picks up the same counters; nothing was queued or lost.
    rig.telemetry.fail_with = None;
    rig.tick();
    assert_eq!(rig.telemetry.reports.last().map(|r| r.play_time_ms), Some(2_250));
}

#[test]
fn sensor_fault_is_treated_as_no_motion() {
    let mut rig = Rig::new(ToyConfig::default());
    rig.command(AppCommand::ForceMode(Mode::Sleep));
    rig.toy.push_fault(SensorError::BusFailed);
    assert_eq!(rig.tick(), Mode::Sleep);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::SensorFault(SensorError::BusFailed)));

    // The loop keeps going on the next good read.
    rig.toy.push_motion(1.2);
    assert_eq!(rig.tick(), Mode::Play);
}

#[test]
fn non_finite_sample_is_flagged_and_ignored() {
    let mut rig = Rig::new(ToyConfig::default());
    rig.command(AppCommand::ForceMode(Mode::Sleep));
    rig.toy.push_raw(MotionSample::new(f32::NAN, 3.0));
    assert_eq!(rig.tick(), Mode::Sleep);
    assert!(rig.sink.events.contains(&AppEvent::InvalidSample));
}

#[test]
fn reset_counters_zeroes_without_changing_mode() {
    let mut rig = Rig::new(ToyConfig::default());
    rig.ticks(10);
    rig.command(AppCommand::ForceMode(Mode::Sleep));
    rig.ticks(4);
    assert!(rig.app.report().sleep_time_ms > 0);

    rig.command(AppCommand::ResetCounters);
    let once = rig.app.state();
    rig.command(AppCommand::ResetCounters);
    assert_eq!(rig.app.state(), once);

    assert_eq!(rig.app.mode(), Mode::Sleep);
    assert_eq!(rig.app.report().play_time_ms, 0);
    assert_eq!(rig.app.report().sleep_time_ms, 0);

    // Accrual resumes from the reset instant.
    rig.tick();
    assert_eq!(rig.app.report().sleep_time_ms, STEP_MS);
    assert_eq!(rig.app.report().play_time_ms, 0);
}

#[test]
fn config_update_retunes_controller_and_auto_saves() {
    let mut rig = Rig::new(ToyConfig::default());
    let store = MemConfigStore::default();

    rig.command(AppCommand::UpdateConfig(ToyConfig {
        idle_to_hunt_ms: 5_000,
        ..Default::default()
    }));
    assert!(rig.app.is_config_dirty());

    // 5 s of quiet now starts a hunt.
    rig.ticks(19);
    assert_eq!(rig.app.mode(), Mode::Play);
    assert_eq!(rig.tick(), Mode::Hunting);

    assert!(rig.app.auto_save_if_needed(rig.clock.now_ms(), &store));
    assert_eq!(store.saves.get(), 1);
    assert_eq!(store.saved.borrow().as_ref().map(|c| c.idle_to_hunt_ms), Some(5_000));
    assert!(!rig.app.auto_save_if_needed(rig.clock.now_ms() + 10_000, &store));
}

#[test]
fn telemetry_interval_throttles_posts() {
    let mut rig = Rig::new(ToyConfig {
        telemetry_interval_ms: 1_000,
        ..Default::default()
    });
    rig.ticks(12);
    let at: Vec<u64> = rig.telemetry.reports.iter().map(|r| r.play_time_ms).collect();
    assert_eq!(at, [250, 1_250, 2_250]);
}

#[test]
fn console_lines_retune_the_running_toy() {
    let mut rig = Rig::new(ToyConfig::default());
    let mut queued: Vec<Event> = Vec::new();
    let n = pump_lines(
        std::io::Cursor::new("set idle_to_hunt_ms 5000\nset play_rounds 0\nsave\n"),
        |e| {
            queued.push(e);
            true
        },
    );
    assert_eq!(n, 3);

    for event in queued {
        let cmd = event.into_command(rig.app.current_config());
        rig.command(cmd);
    }
    // Zero rounds fails validation; only the first edit landed.
    assert_eq!(rig.app.config_revision(), 1);
    assert_eq!(rig.app.current_config().idle_to_hunt_ms, 5_000);
    assert_eq!(rig.app.current_config().play_rounds, 1);

    let store = MemConfigStore::default();
    assert!(rig.app.auto_save_if_needed(rig.clock.now_ms(), &store));
    assert_eq!(store.saved.borrow().as_ref().map(|c| c.idle_to_hunt_ms), Some(5_000));

    rig.ticks(19);
    assert_eq!(rig.app.mode(), Mode::Play);
    assert_eq!(rig.tick(), Mode::Hunting);

    let sleep = Event::Console(console::parse_line("mode sleep").unwrap());
    let cmd = sleep.into_command(rig.app.current_config());
    rig.command(cmd);
    assert_eq!(rig.app.mode(), Mode::Sleep);
}

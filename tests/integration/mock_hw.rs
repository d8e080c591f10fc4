//! Mock adapters for integration tests.
//!
//! Records every actuation call, telemetry report and app event so tests
//! can assert on the full history without touching GPIO, LEDC or sockets.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use cattoy::app::events::AppEvent;
use cattoy::app::ports::{
    ActuationSink, Clock, ConfigError, ConfigPort, DeliveryReceipt, EventSink, MotionSensor,
    TelemetrySink,
};
use cattoy::config::ToyConfig;
use cattoy::error::{SensorError, TelemetryError};
use cattoy::ledger::TelemetryReport;
use cattoy::motion::MotionSample;

// ── Clock ─────────────────────────────────────────────────────

/// Hand-driven clock.  Clones share the same reading.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self(Rc::new(Cell::new(ms)))
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ── Actuation call record ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Play,
    Hunting,
    Quiescent,
}

// ── ScriptedToy ───────────────────────────────────────────────

/// Motion from a script (zero once exhausted); every actuation call is
/// recorded and advances the shared clock by `actuation_ms`, standing in
/// for the blocking play/hunting sequences.
pub struct ScriptedToy {
    pub clock: ManualClock,
    pub script: VecDeque<Result<MotionSample, SensorError>>,
    pub calls: Vec<Actuation>,
    pub actuation_ms: u64,
}

#[allow(dead_code)]
impl ScriptedToy {
    pub fn new(clock: ManualClock, actuation_ms: u64) -> Self {
        Self {
            clock,
            script: VecDeque::new(),
            calls: Vec::new(),
            actuation_ms,
        }
    }

    pub fn push_motion(&mut self, magnitude: f32) {
        self.script.push_back(Ok(MotionSample::new(magnitude, 0.0)));
    }

    pub fn push_fault(&mut self, e: SensorError) {
        self.script.push_back(Err(e));
    }

    pub fn push_raw(&mut self, sample: MotionSample) {
        self.script.push_back(Ok(sample));
    }

    pub fn count(&self, kind: Actuation) -> usize {
        self.calls.iter().filter(|c| **c == kind).count()
    }

    fn record(&mut self, kind: Actuation) {
        self.calls.push(kind);
        self.clock.advance(self.actuation_ms);
    }
}

impl MotionSensor for ScriptedToy {
    fn read_axes(&mut self) -> Result<MotionSample, SensorError> {
        self.script.pop_front().unwrap_or(Ok(MotionSample::ZERO))
    }
}

impl ActuationSink for ScriptedToy {
    fn run_play_actuation(&mut self) {
        self.record(Actuation::Play);
    }

    fn run_hunting_actuation(&mut self) {
        self.record(Actuation::Hunting);
    }

    fn enter_quiescent(&mut self) {
        self.record(Actuation::Quiescent);
    }
}

// ── Telemetry ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingTelemetry {
    pub reports: Vec<TelemetryReport>,
    pub fail_with: Option<TelemetryError>,
}

impl TelemetrySink for RecordingTelemetry {
    fn send(&mut self, report: &TelemetryReport) -> Result<DeliveryReceipt, TelemetryError> {
        self.reports.push(*report);
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(DeliveryReceipt {
                status: 200,
                body: "{\"message\": \"Data received successfully\"}".into(),
            }),
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn mode_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::ModeChanged { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config store ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemConfigStore {
    pub saved: RefCell<Option<ToyConfig>>,
    pub saves: Cell<u32>,
}

impl ConfigPort for MemConfigStore {
    fn load(&self) -> Result<ToyConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &ToyConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.saved.borrow_mut() = Some(config.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

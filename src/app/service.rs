//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the mode [`Controller`], the single
//! [`ControllerState`] value and the live configuration.  All I/O flows
//! through port traits injected at call sites, so the whole per-tick flow
//! runs against mock adapters in tests.
//!
//! ```text
//!  MotionSensor ──▶ ┌──────────────────────┐ ──▶ TelemetrySink
//!         Clock ──▶ │      AppService      │ ──▶ EventSink
//! ActuationSink ◀── │  Controller · Ledger │
//!                   └──────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::ToyConfig;
use crate::fsm::context::ControllerState;
use crate::fsm::{Controller, Mode, TickOutcome};
use crate::ledger::TelemetryReport;
use crate::motion::MotionSample;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuationSink, Clock, ConfigPort, EventSink, MotionSensor, TelemetrySink};

/// Quiet period after the last config change before it is written to NVS.
const AUTO_SAVE_DEBOUNCE_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    controller: Controller,
    state: ControllerState,
    config: ToyConfig,
    last_outcome: Option<TickOutcome>,
    last_telemetry_at: Option<u64>,
    tick_count: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
    save_requested: bool,
    config_revision: u32,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the controller; call [`start`](Self::start) next.
    pub fn new(config: ToyConfig) -> Self {
        let controller = Controller::new(config.controller());
        Self {
            controller,
            state: ControllerState::boot(0),
            config,
            last_outcome: None,
            last_telemetry_at: None,
            tick_count: 0,
            config_dirty: false,
            dirty_since_ms: 0,
            save_requested: false,
            config_revision: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter Play with zeroed counters at the current clock reading.
    pub fn start(&mut self, clock: &impl Clock, sink: &mut impl EventSink) {
        self.state = self.controller.start(clock.now_ms());
        sink.emit(&AppEvent::Started(self.state.mode()));
        info!("AppService started in {:?}", self.state.mode());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle:
    /// read motion → actuate current mode → read clock → controller tick
    /// → emit mode change → publish telemetry.
    ///
    /// The `hw` parameter satisfies **both** [`MotionSensor`] and
    /// [`ActuationSink`] so one value can be borrowed mutably for both.
    pub fn tick(
        &mut self,
        hw: &mut (impl MotionSensor + ActuationSink),
        clock: &impl Clock,
        telemetry: &mut impl TelemetrySink,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        self.tick_count += 1;

        // 1. Motion.  Any failure degrades to zero motion for this tick only.
        let sample = match hw.read_axes() {
            Ok(s) => s,
            Err(e) => {
                warn!("Motion read failed ({}), treating as no motion", e);
                sink.emit(&AppEvent::SensorFault(e));
                MotionSample::ZERO
            }
        };
        if !sample.is_valid() {
            warn!("Motion sample not finite ({:?}), treating as no motion", sample);
            sink.emit(&AppEvent::InvalidSample);
        }

        // 2. Actuation for the mode we are in.  Blocks for its full sequence.
        match self.state.mode() {
            Mode::Play => hw.run_play_actuation(),
            Mode::Hunting => hw.run_hunting_actuation(),
            Mode::Sleep => hw.enter_quiescent(),
        }

        // 3–4. Accrue and evaluate guards at the post-actuation time.
        let now = clock.now_ms();
        let (state, outcome) = self.controller.tick(self.state, now, sample);
        self.state = state;
        self.last_outcome = Some(outcome);

        // 5. Mode change
        if let Some(t) = outcome.transition {
            sink.emit(&AppEvent::ModeChanged {
                from: t.from,
                to: t.to,
                at_ms: t.at_ms,
            });
        }

        // 6. Telemetry, best effort
        if self.telemetry_due(now) {
            self.last_telemetry_at = Some(now);
            self.publish(outcome.report, telemetry, sink);
        }

        outcome
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (button, serial, remote).
    pub fn handle_command(&mut self, cmd: AppCommand, clock: &impl Clock, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::ResetCounters => {
                let now = clock.now_ms();
                self.state = self.controller.reset_accumulators(self.state, now);
                info!("Counters reset at {}ms", now);
                sink.emit(&AppEvent::CountersReset { at_ms: now });
            }
            AppCommand::ForceMode(target) => {
                let now = clock.now_ms();
                let (state, transition) = self.controller.force_mode(self.state, target, now);
                self.state = state;
                if let Some(t) = transition {
                    sink.emit(&AppEvent::ModeChanged {
                        from: t.from,
                        to: t.to,
                        at_ms: t.at_ms,
                    });
                }
            }
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Rejected config update: {}", e);
                    return;
                }
                self.controller.set_config(new_config.controller());
                self.config = new_config;
                self.config_revision = self.config_revision.wrapping_add(1);
                self.mark_config_dirty(clock.now_ms());
                info!("Configuration updated at runtime (rev {})", self.config_revision);
            }
            AppCommand::SaveConfig => {
                self.config_dirty = true;
                self.save_requested = true;
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Copy of the controller state (counters, timers, live segment).
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Current counters as they would be reported now.
    pub fn report(&self) -> TelemetryReport {
        self.state.report()
    }

    pub fn last_outcome(&self) -> Option<TickOutcome> {
        self.last_outcome
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn current_config(&self) -> &ToyConfig {
        &self.config
    }

    /// Bumped on every accepted config update.  Adapters that cache
    /// settings compare it to know when to reload.
    pub fn config_revision(&self) -> u32 {
        self.config_revision
    }

    // ── Internal ──────────────────────────────────────────────

    fn telemetry_due(&self, now: u64) -> bool {
        let interval = u64::from(self.config.telemetry_interval_ms);
        match self.last_telemetry_at {
            _ if interval == 0 => true,
            None => true,
            Some(last) => now.saturating_sub(last) >= interval,
        }
    }

    fn publish(
        &self,
        report: TelemetryReport,
        telemetry: &mut impl TelemetrySink,
        sink: &mut impl EventSink,
    ) {
        match telemetry.send(&report) {
            Ok(receipt) => {
                debug!(
                    "Telemetry delivered: status={} body={:?}",
                    receipt.status, receipt.body
                );
                if !receipt.is_success() {
                    warn!("Telemetry endpoint answered {}", receipt.status);
                }
                sink.emit(&AppEvent::Telemetry {
                    report,
                    status: receipt.status,
                });
            }
            Err(error) => {
                warn!("Telemetry delivery failed: {}", error);
                sink.emit(&AppEvent::TelemetryDeliveryFailed { report, error });
            }
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    fn mark_config_dirty(&mut self, now_ms: u64) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = now_ms;
        }
    }

    /// Persist the config once it has been stable for 5 s, or at once
    /// after [`AppCommand::SaveConfig`].  Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if !self.save_requested && now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DEBOUNCE_MS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                self.save_requested = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

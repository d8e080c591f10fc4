//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Each line starts
//! with a fixed tag so serial captures can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | initial_mode={:?}", mode);
            }
            AppEvent::ModeChanged { from, to, at_ms } => {
                info!("MODE  | {:?} -> {:?} @ {}ms", from, to, at_ms);
            }
            AppEvent::Telemetry { report, status } => {
                info!(
                    "TELEM | play={}ms sleep={}ms | http={}",
                    report.play_time_ms, report.sleep_time_ms, status
                );
            }
            AppEvent::TelemetryDeliveryFailed { report, error } => {
                warn!(
                    "TELEM | play={}ms sleep={}ms | undelivered: {}",
                    report.play_time_ms, report.sleep_time_ms, error
                );
            }
            AppEvent::CountersReset { at_ms } => {
                info!("RESET | counters zeroed @ {}ms", at_ms);
            }
            AppEvent::SensorFault(e) => {
                warn!("FAULT | accelerometer: {}", e);
            }
            AppEvent::InvalidSample => {
                warn!("FAULT | non-finite accelerometer sample");
            }
        }
    }
}

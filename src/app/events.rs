//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.

use crate::error::{SensorError, TelemetryError};
use crate::fsm::Mode;
use crate::ledger::TelemetryReport;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial mode).
    Started(Mode),

    /// The controller changed mode.
    ModeChanged { from: Mode, to: Mode, at_ms: u64 },

    /// A report was delivered; carries the HTTP status.
    Telemetry { report: TelemetryReport, status: u16 },

    /// A report could not be delivered.  Counters are unaffected.
    TelemetryDeliveryFailed { report: TelemetryReport, error: TelemetryError },

    /// The accelerometer read failed; the tick ran with zero motion.
    SensorFault(SensorError),

    /// The sample was NaN/infinite and was treated as zero motion.
    InvalidSample,

    /// Both counters were zeroed by an operator command.
    CountersReset { at_ms: u64 },
}

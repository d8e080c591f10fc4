//! Unified error types for the CatToy firmware.
//!
//! Every subsystem converts into [`Error`] so the composition root can
//! report failures uniformly.  None of these are fatal to the control
//! loop: the application service degrades sensor faults to a zero-motion
//! sample and logs telemetry faults, then keeps cycling modes.
//! All variants are `Copy` so they can travel inside
//! [`AppEvent`](crate::app::events::AppEvent)s without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The accelerometer could not be read or identified.
    Sensor(SensorError),
    /// A motor, pixel or buzzer command failed.
    Actuator(ActuatorError),
    /// The analytics endpoint could not be reached.
    Telemetry(TelemetryError),
    /// The Wi-Fi link could not be configured or brought up.
    Comms(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::Comms(msg) => write!(f, "comms: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I²C transaction failed (NACK, arbitration loss, timeout).
    BusFailed,
    /// `WHO_AM_I` returned an unexpected identity byte.
    WrongDevice(u8),
    /// The IMU was never brought up successfully.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "I2C bus transaction failed"),
            Self::WrongDevice(id) => write!(f, "unexpected WHO_AM_I 0x{id:02X}"),
            Self::NotInitialised => write!(f, "IMU not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// RMT transmission to the pixel strip failed.
    PixelWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PixelWriteFailed => write!(f, "pixel strip write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Telemetry errors
// ---------------------------------------------------------------------------

/// Failures delivering a play/sleep report.  Purely observational: the
/// controller never retries and never alters its counters because of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// Host/port did not resolve to a socket address.
    InvalidAddress,
    /// TCP connect was refused or timed out.
    ConnectFailed,
    /// Request could not be written in full.
    WriteFailed,
    /// Response could not be read before the timeout.
    ReadFailed,
    /// Response did not start with an HTTP status line.
    MalformedResponse,
    /// Report could not be encoded as JSON.
    EncodeFailed,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress => write!(f, "endpoint address did not resolve"),
            Self::ConnectFailed => write!(f, "connection failed"),
            Self::WriteFailed => write!(f, "request write failed"),
            Self::ReadFailed => write!(f, "response read failed"),
            Self::MalformedResponse => write!(f, "malformed HTTP response"),
            Self::EncodeFailed => write!(f, "report encoding failed"),
        }
    }
}

impl From<TelemetryError> for Error {
    fn from(e: TelemetryError) -> Self {
        Self::Telemetry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

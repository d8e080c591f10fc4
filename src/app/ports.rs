//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (clock, accelerometer, actuators, telemetry, event sinks,
//! storage) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the controller never touches hardware or
//! sockets directly and runs unchanged against test fakes.
//!
//! ## Contracts
//!
//! - **ActuationSink** calls are blocking and run to completion; their
//!   wall-clock cost shows up in the next clock reading.
//! - **TelemetrySink** is best-effort.  Errors are reported, never retried here.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::config::ToyConfig;
use crate::error::{SensorError, TelemetryError};
use crate::ledger::TelemetryReport;
use crate::motion::MotionSample;

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond counter that never resets during a run.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Motion sensor (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Latest acceleration, in g.  No buffering or filtering is expected.
pub trait MotionSensor {
    fn read_axes(&mut self) -> Result<MotionSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuation sink (driven adapter: domain → motor / pixels / buzzer)
// ───────────────────────────────────────────────────────────────

/// Mode-scoped actuation.  Each call blocks until its sequence finishes.
pub trait ActuationSink {
    /// Randomised motor runs, chirps and colour cycling.
    fn run_play_actuation(&mut self);

    /// Chirp and flash to lure the cat back.
    fn run_hunting_actuation(&mut self);

    /// Motor stopped, lights off, buzzer silent.
    fn enter_quiescent(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: domain → analytics endpoint)
// ───────────────────────────────────────────────────────────────

/// What came back from a successful delivery.  Logged only; the body is
/// never parsed for control decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: String,
}

impl DeliveryReceipt {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait TelemetrySink {
    fn send(&mut self, report: &TelemetryReport) -> Result<DeliveryReceipt, TelemetryError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists toy configuration.
///
/// Implementations MUST call [`ToyConfig::validate`] before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ToyConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ToyConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ToyConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage, namespaced per subsystem.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Credential port (read-only; provisioning happens elsewhere)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

pub trait CredentialPort {
    /// `Ok(None)` when nothing has been provisioned yet.
    fn wifi_credentials(&self) -> Result<Option<WifiCredentials>, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Stored value is larger than the caller's buffer or type.
    TooLarge,
    /// Stored value is not valid UTF-8 where a string was expected.
    InvalidData,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::TooLarge => write!(f, "value too large"),
            Self::InvalidData => write!(f, "invalid data"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}

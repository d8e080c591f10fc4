//! Inbound commands to the application service.
//!
//! Origin-agnostic: button gestures and serial console lines both map
//! onto the same variants (see [`Event::into_command`](crate::events::Event::into_command)).

use crate::config::ToyConfig;
use crate::fsm::Mode;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Zero both play/sleep counters without changing mode.
    ResetCounters,

    /// Jump straight to a mode (wake the toy, put it to sleep).
    ForceMode(Mode),

    /// Hot-reload configuration.  Rejected if it fails validation; on
    /// success it bumps [`AppService::config_revision`](super::service::AppService::config_revision).
    UpdateConfig(ToyConfig),

    /// Persist the current config on the next auto-save check, without
    /// waiting out the debounce.
    SaveConfig,
}

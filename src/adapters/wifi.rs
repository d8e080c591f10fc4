//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] so the main loop can bring the link up
//! from stored credentials and keep it alive between control ticks.
//! Telemetry only ever *uses* the link; when it is down, delivery fails
//! and the toy keeps playing.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp-idf-svc`.
//! - **all other targets**: in-memory link for host-side tests.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.  Retries only happen from
//! [`ConnectivityPort::poll`], never from inside a control tick.

use core::fmt;
use log::{error, info, warn};

use crate::adapters::utils::is_printable_ascii;
use crate::app::ports::WifiCredentials;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl From<ConnectivityError> for crate::error::Error {
    fn from(e: ConnectivityError) -> Self {
        match e {
            ConnectivityError::NoCredentials => Self::Comms("no credentials"),
            ConnectivityError::InvalidSsid | ConnectivityError::InvalidPassword => {
                Self::Comms("invalid credentials")
            }
            ConnectivityError::ConnectionFailed | ConnectivityError::AlreadyConnected => {
                Self::Comms("connect failed")
            }
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Drive reconnects.  Call once per main-loop iteration.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32, retry_at_ms: u64 },
}

const INITIAL_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    creds: Option<WifiCredentials>,
    backoff_ms: u64,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_refuse: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            state: WifiState::Disconnected,
            creds: None,
            backoff_ms: INITIAL_BACKOFF_MS,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            creds: None,
            backoff_ms: INITIAL_BACKOFF_MS,
            sim_link_up: false,
            sim_refuse: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    fn schedule_retry(&mut self, attempt: u32, now_ms: u64) {
        let retry_at_ms = now_ms.saturating_add(self.backoff_ms);
        info!("WiFi: retry {} in {}ms", attempt, self.backoff_ms);
        self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
        self.state = WifiState::Reconnecting { attempt, retry_at_ms };
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let Some(creds) = self.creds.as_ref() else {
            return Err(ConnectivityError::NoCredentials);
        };
        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let wifi = &mut self.wifi;
        let result = (|| {
            wifi.set_configuration(&config)?;
            if !wifi.is_started()? {
                wifi.start()?;
            }
            wifi.connect()?;
            wifi.wait_netif_up()
        })();

        result.map_err(|e| {
            warn!("WiFi(espidf): connect failed: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_refuse {
            warn!("WiFi(sim): AP refused connection");
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_up = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi(espidf): disconnect: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    /// Drop the simulated link, as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_link_loss(&mut self) {
        self.sim_link_up = false;
    }

    /// Make the simulated AP refuse (or accept again) connections.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_refusal(&mut self, refuse: bool) {
        self.sim_refuse = refuse;
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        let Some(ssid) = self.creds.as_ref().map(|c| c.ssid.clone()) else {
            return Err(ConnectivityError::NoCredentials);
        };
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.on_connected();
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.schedule_retry(1, now_ms);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Reconnecting { attempt, retry_at_ms } if now_ms >= retry_at_ms => {
                info!("WiFi: reconnect attempt {}", attempt);
                match self.platform_connect() {
                    Ok(()) => {
                        self.on_connected();
                        info!("WiFi: reconnected");
                    }
                    Err(_) => self.schedule_retry(attempt + 1, now_ms),
                }
            }
            WifiState::Connected if !self.platform_is_connected() => {
                warn!("WiFi: connection lost, entering reconnect");
                self.schedule_retry(1, now_ms);
            }
            _ => {}
        }
    }

    fn set_credentials(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError> {
        validate_ssid(&creds.ssid)?;
        validate_password(&creds.password)?;
        self.creds = Some(creds.clone());
        info!("WiFi: credentials set (SSID='{}')", creds.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(ssid: &str, pass: &str) -> WifiCredentials {
        let mut c = WifiCredentials {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        c.ssid.push_str(ssid).unwrap();
        c.password.push_str(pass).unwrap();
        c
    }

    #[test]
    fn rejects_empty_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials(&creds("", "password123")), Err(ConnectivityError::InvalidSsid));
    }

    #[test]
    fn rejects_short_password() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials(&creds("MyNet", "short")), Err(ConnectivityError::InvalidPassword));
    }

    #[test]
    fn accepts_open_network() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials(&creds("OpenCafe", "")).is_ok());
    }

    #[test]
    fn errors_fold_into_comms() {
        let e: crate::error::Error = ConnectivityError::InvalidPassword.into();
        assert_eq!(e, crate::error::Error::Comms("invalid credentials"));
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(0), Err(ConnectivityError::NoCredentials));
    }

    #[test]
    fn connect_disconnect_roundtrip() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("TestNet", "password1")).unwrap();
        a.connect(0).unwrap();
        assert!(a.is_connected());
        assert_eq!(a.connect(10), Err(ConnectivityError::AlreadyConnected));
        a.disconnect();
        assert!(!a.is_connected());
    }

    #[test]
    fn link_loss_retries_after_backoff() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("TestNet", "password1")).unwrap();
        a.connect(0).unwrap();

        a.simulate_link_loss();
        a.poll(1_000);
        assert_eq!(a.state(), WifiState::Reconnecting { attempt: 1, retry_at_ms: 3_000 });

        a.poll(2_999);
        assert!(!a.is_connected());
        a.poll(3_000);
        assert!(a.is_connected());
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut a = WifiAdapter::new();
        a.set_credentials(&creds("TestNet", "password1")).unwrap();
        a.simulate_refusal(true);
        assert_eq!(a.connect(0), Err(ConnectivityError::ConnectionFailed));

        let mut now = 0;
        let mut gaps = Vec::new();
        for _ in 0..7 {
            let WifiState::Reconnecting { retry_at_ms, .. } = a.state() else {
                panic!("expected reconnecting");
            };
            gaps.push(retry_at_ms - now);
            now = retry_at_ms;
            a.poll(now);
        }
        assert_eq!(gaps, [2_000, 4_000, 8_000, 16_000, 32_000, 60_000, 60_000]);

        a.simulate_refusal(false);
        let WifiState::Reconnecting { retry_at_ms, .. } = a.state() else {
            panic!("expected reconnecting");
        };
        a.poll(retry_at_ms);
        assert!(a.is_connected());
    }
}

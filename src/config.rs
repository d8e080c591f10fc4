//! Toy configuration parameters
//!
//! All tunable parameters for the cat toy.  Transition thresholds live
//! here rather than in the state handlers so they can be retuned from NVS
//! without a reflash.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::drivers::patterns::{hunting_round_max_ms, play_round_max_ms};
use crate::fsm::context::ControllerConfig;

/// Default analytics endpoint (the team's Flask collector).
pub const DEFAULT_TELEMETRY_HOST: &str = "3.85.208.114";
pub const DEFAULT_TELEMETRY_PATH: &str = "/send-time";

/// Core toy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToyConfig {
    // --- Behaviour ---
    /// Horizontal acceleration (g) above which the cat is considered to be playing
    pub motion_threshold_g: f32,
    /// Sustained quiet time in Play before switching to Hunting (ms)
    pub idle_to_hunt_ms: u32,
    /// Time in Hunting without motion before going to Sleep (ms)
    pub hunt_to_sleep_ms: u32,

    // --- Loop timing ---
    /// Pause between control ticks (ms)
    pub control_loop_interval_ms: u32,
    /// Delay after power-on so the ball can be closed and put down (ms)
    pub boot_settle_ms: u32,
    /// Task watchdog timeout; must exceed [`Self::worst_case_tick_ms`] (ms)
    pub watchdog_timeout_ms: u32,

    // --- Telemetry ---
    pub telemetry_host: heapless::String<64>,
    pub telemetry_port: u16,
    pub telemetry_path: heapless::String<32>,
    /// Connect/read/write timeout for one delivery attempt (ms)
    pub telemetry_timeout_ms: u32,
    /// Minimum spacing between reports (ms). 0 = every tick
    pub telemetry_interval_ms: u32,

    // --- Actuation ---
    /// Motor/chirp/light rounds per Play actuation
    pub play_rounds: u8,
    /// Chirp/flash rounds per Hunting actuation
    pub hunting_rounds: u8,
    /// Light hold after the colour cycle in Play (ms)
    pub play_led_hold_ms: u32,
    /// Light hold after the colour cycle in Hunting (ms)
    pub hunting_led_hold_ms: u32,
    /// Motor PWM duty range (0-255), lower bound inclusive
    pub motor_speed_min: u8,
    /// Motor PWM duty range (0-255), upper bound exclusive
    pub motor_speed_max: u8,
    /// Chance of a chirp after each Play round (0-100%)
    pub chirp_chance_percent: u8,
}

impl Default for ToyConfig {
    fn default() -> Self {
        let mut telemetry_host = heapless::String::new();
        let _ = telemetry_host.push_str(DEFAULT_TELEMETRY_HOST);
        let mut telemetry_path = heapless::String::new();
        let _ = telemetry_path.push_str(DEFAULT_TELEMETRY_PATH);

        Self {
            // Behaviour
            motion_threshold_g: 0.5,
            idle_to_hunt_ms: 30_000,
            hunt_to_sleep_ms: 60_000,

            // Loop timing
            control_loop_interval_ms: 250,
            boot_settle_ms: 30_000,
            watchdog_timeout_ms: 60_000,

            // Telemetry
            telemetry_host,
            telemetry_port: 5000,
            telemetry_path,
            telemetry_timeout_ms: 5_000,
            telemetry_interval_ms: 0,

            // Actuation
            play_rounds: 1,
            hunting_rounds: 1,
            play_led_hold_ms: 3_000,
            hunting_led_hold_ms: 1_000,
            motor_speed_min: 100,
            motor_speed_max: 200,
            chirp_chance_percent: 40,
        }
    }
}

impl ToyConfig {
    /// Transition thresholds handed to the controller.
    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            motion_threshold_g: self.motion_threshold_g,
            idle_to_hunt_ms: u64::from(self.idle_to_hunt_ms),
            hunt_to_sleep_ms: u64::from(self.hunt_to_sleep_ms),
        }
    }

    /// Longest blocking stretch of one control tick: the slower actuation
    /// routine at its worst-case random draws, up to three telemetry
    /// timeouts (connect, write, read) and the loop pause.
    pub fn worst_case_tick_ms(&self) -> u64 {
        let play = u64::from(self.play_rounds)
            * play_round_max_ms(self.chirp_chance_percent > 0, self.play_led_hold_ms);
        let hunting = u64::from(self.hunting_rounds) * hunting_round_max_ms(self.hunting_led_hold_ms);
        play.max(hunting)
            + 3 * u64::from(self.telemetry_timeout_ms)
            + u64::from(self.control_loop_interval_ms)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.motion_threshold_g.is_finite() || !(0.05..=8.0).contains(&self.motion_threshold_g)
        {
            return Err(ConfigError::ValidationFailed(
                "motion_threshold_g must be 0.05–8.0",
            ));
        }
        if !(1_000..=3_600_000).contains(&self.idle_to_hunt_ms) {
            return Err(ConfigError::ValidationFailed(
                "idle_to_hunt_ms must be 1000–3600000",
            ));
        }
        if !(1_000..=3_600_000).contains(&self.hunt_to_sleep_ms) {
            return Err(ConfigError::ValidationFailed(
                "hunt_to_sleep_ms must be 1000–3600000",
            ));
        }
        if !(10..=10_000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 10–10000",
            ));
        }
        if self.boot_settle_ms > 120_000 {
            return Err(ConfigError::ValidationFailed(
                "boot_settle_ms must be 0–120000",
            ));
        }
        if !(10_000..=300_000).contains(&self.watchdog_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must be 10000–300000",
            ));
        }
        if self.telemetry_host.is_empty() {
            return Err(ConfigError::ValidationFailed("telemetry_host must not be empty"));
        }
        if self.telemetry_port == 0 {
            return Err(ConfigError::ValidationFailed("telemetry_port must be non-zero"));
        }
        if !self.telemetry_path.starts_with('/') {
            return Err(ConfigError::ValidationFailed(
                "telemetry_path must start with '/'",
            ));
        }
        if !(100..=30_000).contains(&self.telemetry_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_timeout_ms must be 100–30000",
            ));
        }
        if self.play_rounds == 0 || self.hunting_rounds == 0 {
            return Err(ConfigError::ValidationFailed("actuation rounds must be >= 1"));
        }
        if self.play_led_hold_ms > 60_000 || self.hunting_led_hold_ms > 60_000 {
            return Err(ConfigError::ValidationFailed("LED hold must be 0–60000"));
        }
        if self.motor_speed_min >= self.motor_speed_max {
            return Err(ConfigError::ValidationFailed(
                "motor_speed_min must be < motor_speed_max",
            ));
        }
        if self.chirp_chance_percent > 100 {
            return Err(ConfigError::ValidationFailed(
                "chirp_chance_percent must be 0–100",
            ));
        }
        // The watchdog is only fed between ticks.
        if self.worst_case_tick_ms() >= u64::from(self.watchdog_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed the worst-case tick",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ToyConfig::default().validate().is_ok());
    }

    #[test]
    fn default_thresholds() {
        let c = ToyConfig::default();
        assert!((c.motion_threshold_g - 0.5).abs() < f32::EPSILON);
        assert_eq!(c.idle_to_hunt_ms, 30_000);
        assert_eq!(c.hunt_to_sleep_ms, 60_000);
        assert_eq!(c.telemetry_host.as_str(), "3.85.208.114");
        assert_eq!(c.telemetry_port, 5000);
        assert_eq!(c.telemetry_path.as_str(), "/send-time");
    }

    #[test]
    fn controller_view_widens_thresholds() {
        let c = ToyConfig {
            idle_to_hunt_ms: 10_000,
            ..Default::default()
        };
        let cc = c.controller();
        assert_eq!(cc.idle_to_hunt_ms, 10_000);
        assert_eq!(cc.hunt_to_sleep_ms, 60_000);
    }

    #[test]
    fn rejects_nan_threshold() {
        let c = ToyConfig {
            motion_threshold_g: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_inverted_motor_range() {
        let c = ToyConfig {
            motor_speed_min: 200,
            motor_speed_max: 100,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_relative_path() {
        let mut c = ToyConfig::default();
        c.telemetry_path.clear();
        c.telemetry_path.push_str("send-time").unwrap();
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_chirp_chance_over_100() {
        let c = ToyConfig {
            chirp_chance_percent: 101,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn default_tick_fits_watchdog() {
        let c = ToyConfig::default();
        // 23 972 ms play round + 15 000 ms telemetry + 250 ms pause.
        assert_eq!(c.worst_case_tick_ms(), 39_222);
        assert!(c.worst_case_tick_ms() < u64::from(c.watchdog_timeout_ms));
    }

    #[test]
    fn rejects_rounds_that_outlast_watchdog() {
        let c = ToyConfig {
            play_rounds: 10,
            ..Default::default()
        };
        assert!(c.worst_case_tick_ms() > 200_000);
        assert_eq!(
            c.validate(),
            Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed the worst-case tick"
            ))
        );

        // Extra rounds fit once the watchdog is raised to cover them.
        let c = ToyConfig {
            hunting_rounds: 4,
            watchdog_timeout_ms: 60_000,
            ..Default::default()
        };
        assert!(c.validate().is_err());
        let c = ToyConfig {
            hunting_rounds: 4,
            watchdog_timeout_ms: 90_000,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn serde_roundtrip() {
        let c = ToyConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: ToyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = ToyConfig {
            hunt_to_sleep_ms: 90_000,
            ..Default::default()
        };
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: ToyConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c2.hunt_to_sleep_ms, 90_000);
        assert_eq!(c2.telemetry_host, c.telemetry_host);
    }
}

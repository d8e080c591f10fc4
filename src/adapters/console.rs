//! Serial console: line commands typed on the USB/UART console.
//!
//! A reader thread turns each line into an [`Event::Console`] on the
//! shared event queue; the control loop maps it to an
//! [`AppCommand`] between ticks, the same way it handles button gestures.
//!
//! ```text
//! reset                      zero the play/sleep counters
//! mode play|hunting|sleep    force a mode
//! set <key> <value>          retune one setting (applied at once)
//! save                       persist the live config to NVS
//! ```
//!
//! `set` keys are the [`ToyConfig`] field names listed in [`ConfigSetting`].

use std::io::{BufRead, ErrorKind};
use std::time::Duration;

use log::{info, warn};

use crate::app::commands::AppCommand;
use crate::config::ToyConfig;
use crate::events::Event;
use crate::fsm::Mode;

/// Pause between stdin polls when nothing is pending.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STACK_BYTES: usize = 4 * 1024;

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    ResetCounters,
    Mode(Mode),
    Set(ConfigSetting),
    Save,
}

/// A single runtime-tunable setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigSetting {
    MotionThreshold(f32),
    IdleToHunt(u32),
    HuntToSleep(u32),
    LoopInterval(u32),
    TelemetryInterval(u32),
    PlayRounds(u8),
    HuntingRounds(u8),
    ChirpChance(u8),
}

impl ConfigSetting {
    fn parse(key: &str, value: &str) -> Result<Self, ConsoleError> {
        fn num<T: core::str::FromStr>(v: &str) -> Result<T, ConsoleError> {
            v.parse().map_err(|_| ConsoleError::BadValue)
        }
        Ok(match key {
            "motion_threshold_g" => Self::MotionThreshold(num(value)?),
            "idle_to_hunt_ms" => Self::IdleToHunt(num(value)?),
            "hunt_to_sleep_ms" => Self::HuntToSleep(num(value)?),
            "control_loop_interval_ms" => Self::LoopInterval(num(value)?),
            "telemetry_interval_ms" => Self::TelemetryInterval(num(value)?),
            "play_rounds" => Self::PlayRounds(num(value)?),
            "hunting_rounds" => Self::HuntingRounds(num(value)?),
            "chirp_chance_percent" => Self::ChirpChance(num(value)?),
            _ => return Err(ConsoleError::UnknownKey),
        })
    }

    /// Write this setting into `config`.  Range checks happen when the
    /// result is handed to the service.
    pub fn apply(self, config: &mut ToyConfig) {
        match self {
            Self::MotionThreshold(g) => config.motion_threshold_g = g,
            Self::IdleToHunt(ms) => config.idle_to_hunt_ms = ms,
            Self::HuntToSleep(ms) => config.hunt_to_sleep_ms = ms,
            Self::LoopInterval(ms) => config.control_loop_interval_ms = ms,
            Self::TelemetryInterval(ms) => config.telemetry_interval_ms = ms,
            Self::PlayRounds(n) => config.play_rounds = n,
            Self::HuntingRounds(n) => config.hunting_rounds = n,
            Self::ChirpChance(pct) => config.chirp_chance_percent = pct,
        }
    }
}

impl ConsoleCommand {
    /// Command for the service, with `set` applied on top of `current`.
    pub fn into_app_command(self, current: &ToyConfig) -> AppCommand {
        match self {
            Self::ResetCounters => AppCommand::ResetCounters,
            Self::Mode(mode) => AppCommand::ForceMode(mode),
            Self::Set(setting) => {
                let mut next = current.clone();
                setting.apply(&mut next);
                AppCommand::UpdateConfig(next)
            }
            Self::Save => AppCommand::SaveConfig,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    Empty,
    UnknownCommand,
    UnknownKey,
    MissingArgument,
    BadValue,
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::UnknownKey => write!(f, "unknown setting"),
            Self::MissingArgument => write!(f, "missing argument"),
            Self::BadValue => write!(f, "bad value"),
        }
    }
}

/// Parse one console line.  Words are whitespace-separated and
/// case-sensitive; extra trailing words are rejected.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let mut words = line.split_whitespace();
    let cmd = match words.next() {
        None => return Err(ConsoleError::Empty),
        Some("reset") => ConsoleCommand::ResetCounters,
        Some("save") => ConsoleCommand::Save,
        Some("mode") => match words.next() {
            Some("play") => ConsoleCommand::Mode(Mode::Play),
            Some("hunting") => ConsoleCommand::Mode(Mode::Hunting),
            Some("sleep") => ConsoleCommand::Mode(Mode::Sleep),
            Some(_) => return Err(ConsoleError::BadValue),
            None => return Err(ConsoleError::MissingArgument),
        },
        Some("set") => match (words.next(), words.next()) {
            (Some(key), Some(value)) => ConsoleCommand::Set(ConfigSetting::parse(key, value)?),
            _ => return Err(ConsoleError::MissingArgument),
        },
        Some(_) => return Err(ConsoleError::UnknownCommand),
    };
    if words.next().is_some() {
        return Err(ConsoleError::BadValue);
    }
    Ok(cmd)
}

/// Read lines until EOF or until the reader has nothing pending, pushing
/// one event per valid line.  Returns the number of events accepted.
pub fn pump_lines(reader: impl BufRead, mut push: impl FnMut(Event) -> bool) -> usize {
    let mut accepted = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        };
        match parse_line(&line) {
            Ok(cmd) => {
                info!("Console: {:?}", cmd);
                if push(Event::Console(cmd)) {
                    accepted += 1;
                }
            }
            Err(ConsoleError::Empty) => {}
            Err(e) => warn!("Console: {} in {:?}", e, line.trim()),
        }
    }
    accepted
}

/// Start the stdin reader thread feeding the global event queue.
pub fn spawn_reader() -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(STACK_BYTES)
        .spawn(|| {
            loop {
                pump_lines(std::io::stdin().lock(), crate::events::push_event);
                std::thread::sleep(POLL_INTERVAL);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_every_command() {
        assert_eq!(parse_line("reset"), Ok(ConsoleCommand::ResetCounters));
        assert_eq!(parse_line("  save \r"), Ok(ConsoleCommand::Save));
        assert_eq!(parse_line("mode hunting"), Ok(ConsoleCommand::Mode(Mode::Hunting)));
        assert_eq!(
            parse_line("set idle_to_hunt_ms 5000"),
            Ok(ConsoleCommand::Set(ConfigSetting::IdleToHunt(5_000)))
        );
        assert_eq!(
            parse_line("set motion_threshold_g 0.8"),
            Ok(ConsoleCommand::Set(ConfigSetting::MotionThreshold(0.8)))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_line(""), Err(ConsoleError::Empty));
        assert_eq!(parse_line("dance"), Err(ConsoleError::UnknownCommand));
        assert_eq!(parse_line("mode"), Err(ConsoleError::MissingArgument));
        assert_eq!(parse_line("mode zoomies"), Err(ConsoleError::BadValue));
        assert_eq!(parse_line("set idle_to_hunt_ms"), Err(ConsoleError::MissingArgument));
        assert_eq!(parse_line("set idle_to_hunt_ms -1"), Err(ConsoleError::BadValue));
        assert_eq!(parse_line("set play_rounds 300"), Err(ConsoleError::BadValue));
        assert_eq!(parse_line("set telemetry_host x"), Err(ConsoleError::UnknownKey));
        assert_eq!(parse_line("reset now"), Err(ConsoleError::BadValue));
    }

    #[test]
    fn set_builds_config_update_from_current() {
        let current = ToyConfig {
            hunt_to_sleep_ms: 90_000,
            ..Default::default()
        };
        let cmd = ConsoleCommand::Set(ConfigSetting::IdleToHunt(5_000)).into_app_command(&current);
        match cmd {
            AppCommand::UpdateConfig(next) => {
                assert_eq!(next.idle_to_hunt_ms, 5_000);
                assert_eq!(next.hunt_to_sleep_ms, 90_000);
            }
            other => panic!("expected UpdateConfig, got {other:?}"),
        }
        assert!(matches!(
            ConsoleCommand::Save.into_app_command(&current),
            AppCommand::SaveConfig
        ));
    }

    #[test]
    fn pump_pushes_valid_lines_only() {
        let input = Cursor::new("mode sleep\n\nbogus\nset chirp_chance_percent 0\nreset");
        let mut got = Vec::new();
        let n = pump_lines(input, |e| {
            got.push(e);
            true
        });
        assert_eq!(n, 3);
        assert_eq!(
            got,
            [
                Event::Console(ConsoleCommand::Mode(Mode::Sleep)),
                Event::Console(ConsoleCommand::Set(ConfigSetting::ChirpChance(0))),
                Event::Console(ConsoleCommand::ResetCounters),
            ]
        );
    }

    #[test]
    fn full_queue_is_not_counted() {
        let n = pump_lines(Cursor::new("save\nsave\n"), |_| false);
        assert_eq!(n, 0);
    }
}

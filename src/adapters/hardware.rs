//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the accelerometer and all actuator drivers, exposing them through
//! [`MotionSensor`] and [`ActuationSink`].  This is the only module in the
//! system that sequences actual hardware.  On non-espidf targets the
//! drivers use cfg-gated simulation stubs, and the delay and RNG are
//! injected so the sequences run instantly and deterministically in tests.
//!
//! ## Play round
//!
//! 1. Random speed in `motor_speed_min..motor_speed_max`
//! 2. Forward 0.5–2 s, pause 0.5–1 s, reverse 0.5–2 s, pause 0.5–1 s
//! 3. Chirp with `chirp_chance_percent` probability
//! 4. Colour cycle, then lights off for `play_led_hold_ms`
//! 5. Pause 0.5–1 s
//!
//! ## Hunting round
//!
//! Chirp and flash in random order, 0.3–0.7 s apart, then 1 s.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};
use rand::{Rng, RngCore};

use crate::app::ports::{ActuationSink, MotionSensor};
use crate::config::ToyConfig;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::motor::{Direction, MotorDriver};
use crate::drivers::patterns::{
    COLOUR_PASSES, COLOUR_STEP_MS, HUNT_GAP_MS, HUNT_ROUND_TAIL_MS, MOTOR_REST_MS, MOTOR_RUN_MS,
    PALETTE, PASS_GAP_MS, PLAY_ROUND_GAP_MS,
};
use crate::drivers::pixels::PixelStrip;
use crate::error::SensorError;
use crate::motion::MotionSample;
use crate::sensors::Lsm6dso;

/// Actuation knobs, copied out of [`ToyConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationSettings {
    pub play_rounds: u8,
    pub hunting_rounds: u8,
    pub play_led_hold_ms: u32,
    pub hunting_led_hold_ms: u32,
    pub motor_speed_min: u8,
    pub motor_speed_max: u8,
    pub chirp_chance_percent: u8,
}

impl From<&ToyConfig> for ActuationSettings {
    fn from(c: &ToyConfig) -> Self {
        Self {
            play_rounds: c.play_rounds,
            hunting_rounds: c.hunting_rounds,
            play_led_hold_ms: c.play_led_hold_ms,
            hunting_led_hold_ms: c.hunting_led_hold_ms,
            motor_speed_min: c.motor_speed_min,
            motor_speed_max: c.motor_speed_max,
            chirp_chance_percent: c.chirp_chance_percent,
        }
    }
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct ToyHardware<I, D, R>
where
    I: I2c,
    D: DelayNs,
    R: RngCore,
{
    imu: Lsm6dso<I>,
    motor: MotorDriver,
    pixels: PixelStrip,
    buzzer: Buzzer,
    delay: D,
    rng: R,
    settings: ActuationSettings,
}

impl<I, D, R> ToyHardware<I, D, R>
where
    I: I2c,
    D: DelayNs,
    R: RngCore,
{
    pub fn new(
        imu: Lsm6dso<I>,
        pixels: PixelStrip,
        delay: D,
        rng: R,
        config: &ToyConfig,
    ) -> Self {
        Self {
            imu,
            motor: MotorDriver::new(),
            pixels,
            buzzer: Buzzer::new(),
            delay,
            rng,
            settings: ActuationSettings::from(config),
        }
    }

    /// Bring up the accelerometer and park every actuator.
    pub fn init(&mut self) -> crate::error::Result<()> {
        self.imu.init()?;
        self.enter_quiescent();
        info!("ToyHardware ready");
        Ok(())
    }

    /// Pick up new actuation settings after a config change.
    pub fn apply_config(&mut self, config: &ToyConfig) {
        self.settings = ActuationSettings::from(config);
    }

    pub fn settings(&self) -> ActuationSettings {
        self.settings
    }

    pub fn motor(&self) -> &MotorDriver {
        &self.motor
    }

    pub fn pixels(&self) -> &PixelStrip {
        &self.pixels
    }

    pub fn buzzer(&self) -> &Buzzer {
        &self.buzzer
    }

    // ── Building blocks ───────────────────────────────────────

    fn pause_between(&mut self, lo_ms: u32, hi_ms: u32) {
        let ms = self.rng.gen_range(lo_ms..hi_ms);
        self.delay.delay_ms(ms);
    }

    fn show(&mut self) {
        if let Err(e) = self.pixels.show() {
            warn!("Light ring write failed: {}", e);
        }
    }

    fn motor_run(&mut self, speed: u8, dir: Direction) {
        self.motor.run(speed, dir);
        self.pause_between(MOTOR_RUN_MS.0, MOTOR_RUN_MS.1);
        self.motor.stop();
        self.pause_between(MOTOR_REST_MS.0, MOTOR_REST_MS.1);
    }

    fn colour_cycle(&mut self, hold_ms: u32) {
        for _ in 0..COLOUR_PASSES {
            for colour in PALETTE {
                self.pixels.fill(colour);
                self.show();
                self.delay.delay_ms(COLOUR_STEP_MS);
            }
            self.pixels.clear();
            self.show();
            self.delay.delay_ms(PASS_GAP_MS);
        }
        self.delay.delay_ms(hold_ms);
    }

    fn chirp(&mut self) {
        self.buzzer.chirp(&mut self.delay);
    }

    fn play_round(&mut self) {
        let s = self.settings;
        let speed = self.rng.gen_range(s.motor_speed_min..s.motor_speed_max);
        debug!("Play round: speed={}", speed);

        self.motor_run(speed, Direction::Forward);
        self.motor_run(speed, Direction::Reverse);

        if self.rng.gen_range(0..100u8) < s.chirp_chance_percent {
            self.chirp();
        }

        self.colour_cycle(s.play_led_hold_ms);
        self.pause_between(PLAY_ROUND_GAP_MS.0, PLAY_ROUND_GAP_MS.1);
    }

    fn hunting_round(&mut self) {
        let hold = self.settings.hunting_led_hold_ms;
        if self.rng.gen_bool(0.5) {
            self.chirp();
            self.pause_between(HUNT_GAP_MS.0, HUNT_GAP_MS.1);
            self.colour_cycle(hold);
        } else {
            self.colour_cycle(hold);
            self.pause_between(HUNT_GAP_MS.0, HUNT_GAP_MS.1);
            self.chirp();
        }
        self.delay.delay_ms(HUNT_ROUND_TAIL_MS);
    }
}

// ── MotionSensor implementation ───────────────────────────────

impl<I, D, R> MotionSensor for ToyHardware<I, D, R>
where
    I: I2c,
    D: DelayNs,
    R: RngCore,
{
    fn read_axes(&mut self) -> Result<MotionSample, SensorError> {
        self.imu.read_axes()
    }
}

// ── ActuationSink implementation ──────────────────────────────

impl<I, D, R> ActuationSink for ToyHardware<I, D, R>
where
    I: I2c,
    D: DelayNs,
    R: RngCore,
{
    fn run_play_actuation(&mut self) {
        for _ in 0..self.settings.play_rounds {
            self.play_round();
        }
    }

    fn run_hunting_actuation(&mut self) {
        for _ in 0..self.settings.hunting_rounds {
            self.hunting_round();
        }
    }

    fn enter_quiescent(&mut self) {
        self.motor.stop();
        self.buzzer.silence();
        self.pixels.clear();
        self.show();
    }
}

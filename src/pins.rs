//! GPIO / peripheral pin assignments for the CatToy ball (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Drive motor (L298N H-bridge)
// ---------------------------------------------------------------------------

/// Digital output: HIGH with IN2 LOW = forward.
pub const MOTOR_IN1_GPIO: i32 = 5;
/// Digital output: HIGH with IN1 LOW = reverse.
pub const MOTOR_IN2_GPIO: i32 = 6;
/// LEDC PWM on the L298N enable pin sets speed.
pub const MOTOR_EN_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Light ring (WS2812, GRB, 800 kHz)
// ---------------------------------------------------------------------------

pub const PIXEL_GPIO: i32 = 15;
pub const NUM_PIXELS: usize = 7;

// ---------------------------------------------------------------------------
// Piezo buzzer
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// I²C bus (LSM6DSO accelerometer)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 11;
pub const I2C_SCL_GPIO: i32 = 12;
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// Motor enable PWM (20 kHz, above hearing so the cat isn't spooked).
pub const MOTOR_PWM_FREQ_HZ: u32 = 20_000;
/// Initial buzzer frequency; retuned per note.
pub const BUZZER_BASE_FREQ_HZ: u32 = 2_000;

// ---------------------------------------------------------------------------
// User button (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button on the ball's seam.
pub const BUTTON_GPIO: i32 = 4;

//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod button;
pub mod buzzer;
pub mod hw_init;
pub mod motor;
pub mod patterns;
pub mod pixels;
pub mod watchdog;

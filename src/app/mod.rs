//! Application core: pure domain logic, zero I/O.
//!
//! Per-tick orchestration of the mode controller, telemetry publishing and
//! operator commands.  All interaction with hardware and the network happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

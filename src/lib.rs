//! CatToy firmware library.
//!
//! Exposes the pure-logic modules (mode controller, duration ledger,
//! telemetry encoding) for integration testing. All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod ledger;
pub mod motion;

pub mod pins;

// Hardware-facing modules compile on the host with in-memory simulations.
pub mod adapters;
pub mod drivers;
pub mod sensors;

//! Sensor drivers.
//!
//! Only the accelerometer lives here today.  Drivers are generic over
//! `embedded-hal` 1.0 traits so they run against fake buses in tests.

pub mod lsm6dso;

pub use lsm6dso::Lsm6dso;

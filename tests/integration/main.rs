//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock adapters.  All tests run on the host with no hardware attached.

mod app_service_tests;
mod controller_scenarios;
mod mock_hw;
mod telemetry_http_tests;

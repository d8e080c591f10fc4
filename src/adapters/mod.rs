//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                    |
//! |-------------|--------------------|--------------------------------|
//! | `console`   | (event producer)   | stdin line commands            |
//! | `hardware`  | MotionSensor       | LSM6DSO over I²C               |
//! |             | ActuationSink      | Motor, light ring, buzzer      |
//! | `log_sink`  | EventSink          | Serial log output              |
//! | `nvs`       | ConfigPort         | NVS / in-memory store          |
//! |             | StoragePort        |                                |
//! |             | CredentialPort     |                                |
//! | `telemetry` | TelemetrySink      | HTTP collector (esp_http / TCP)|
//! | `time`      | Clock              | ESP32 system timer             |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA               |

pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod telemetry;
pub mod time;
pub(super) mod utils;
pub mod wifi;

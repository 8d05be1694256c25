//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements   | Connects to              |
//! |-----------------|--------------|--------------------------|
//! | `hardware`      | SensorDriver | ESP32 ADC1, ranger GPIO  |
//! | `log_publisher` | PublishPort  | Serial log output        |
//! | `nvs`           | ConfigPort   | NVS / in-memory store    |
//! | `time`          | ClockPort    | ESP32 system timer       |

pub mod hardware;
pub mod log_publisher;
pub mod nvs;
pub mod time;

//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to               |
//! |----------------|--------------------|---------------------------|
//! | `blackbox`     | EventSink          | NVS ring of log entries   |
//! | `console`      | —                  | UART0 line input          |
//! | `hardware`     | SensorPort         | DHT11, IR ADC             |
//! |                | ActuatorPort       | Relay, buzzer, LED, LCD   |
//! | `log_sink`     | EventSink          | Serial log output         |
//! | `network`      | ConnectivityPort   | ESP-IDF WiFi STA + MQTT   |
//! | `nvs`          | ConfigPort         | NVS / in-memory store     |
//! |                | StoragePort        |                           |
//! | `time`         | —                  | ESP32 system timer        |

pub mod blackbox;
pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod network;
pub mod nvs;
pub mod time;

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                 |
//! |------------|---------------------|-----------------------------|
//! | `hardware` | PinPort, TimerPort  | ESP32 GPIO, esp_timer       |
//! | `i2c`      | BusPort             | ESP-IDF legacy I2C master   |
//! | `mqtt`     | MessageTransport    | ESP-IDF MQTT client         |
//! | `time`     | (clock)             | ESP32 high-resolution timer |
//! | `wifi`     | (station bring-up)  | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod i2c;
pub mod mqtt;
pub mod time;
pub mod wifi;

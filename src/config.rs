//! Gateway configuration parameters
//!
//! All tunable parameters for the gateway.  The firmware starts from
//! [`GatewayConfig::default`] and overlays an optional JSON document.

use serde::{Deserialize, Serialize};

use crate::drivers::i2c::MAX_READ_LEN;
use crate::error::ConfigError;
use crate::pins;

/// Core gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    // --- Link ---
    /// Topic carrying inbound command envelopes
    pub sub_topic: String,
    /// Topic receiving replies and click notifications
    pub pub_topic: String,
    /// MQTT broker URL, e.g. `mqtt://192.168.1.10:1883`
    pub broker_url: String,
    /// MQTT client identifier
    pub client_id: String,
    /// WiFi station SSID
    pub wifi_ssid: String,
    /// WiFi station password (empty for open networks)
    pub wifi_password: String,

    // --- Timing ---
    /// Delay before a pin set by a `gpio` command flips back (milliseconds)
    pub reversion_delay_ms: u32,
    /// Minimum spacing between two reported clicks on one pin (milliseconds)
    pub debounce_window_ms: u32,
    /// ISR-side pre-filter for raw edges on watched pins (milliseconds)
    pub edge_prefilter_ms: u32,

    // --- Bus ---
    /// Largest accepted `i2c_read` length (bytes)
    pub read_limit: usize,
    pub i2c: I2cConfig,
}

/// I2C master wiring and clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I2cConfig {
    /// Set to `false` to leave the bus unconfigured.
    pub enabled: bool,
    pub sda_gpio: i32,
    pub scl_gpio: i32,
    pub frequency_hz: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sda_gpio: pins::I2C_SDA_GPIO,
            scl_gpio: pins::I2C_SCL_GPIO,
            frequency_hz: pins::I2C_FREQ_HZ,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            // Link
            sub_topic: "hwbridge/request".into(),
            pub_topic: "hwbridge/response".into(),
            broker_url: "mqtt://broker.local:1883".into(),
            client_id: "hwbridge".into(),
            wifi_ssid: String::new(),
            wifi_password: String::new(),

            // Timing
            reversion_delay_ms: 2000,
            debounce_window_ms: 200,
            edge_prefilter_ms: 50,

            // Bus
            read_limit: MAX_READ_LEN,
            i2c: I2cConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Overlay a JSON document onto the defaults and validate the result.
    /// Fields missing from the document keep their default value.
    pub fn from_json(doc: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(doc).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sub_topic.is_empty() || self.pub_topic.is_empty() {
            return Err(ConfigError::MissingTopic);
        }
        if self.reversion_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("reversion_delay_ms must be > 0"));
        }
        if self.debounce_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("debounce_window_ms must be > 0"));
        }
        if self.read_limit == 0 || self.read_limit > MAX_READ_LEN {
            return Err(ConfigError::ValidationFailed("read_limit must be 1..=100"));
        }
        if self.i2c.enabled && (!pins::is_valid_gpio(self.i2c.sda_gpio) || !pins::is_valid_gpio(self.i2c.scl_gpio)) {
            return Err(ConfigError::ValidationFailed("i2c pins must be valid GPIOs"));
        }
        Ok(())
    }
}

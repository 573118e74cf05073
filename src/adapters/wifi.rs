//! WiFi station-mode bring-up.
//!
//! The broker link needs an IP connection before the MQTT client can be
//! started.  Credentials come from [`GatewayConfig`](crate::config::GatewayConfig)
//! and are validated here before they reach the driver.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: validation only.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Station credentials in driver-sized buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF driver
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn connect_station(
    modem: esp_idf_svc::hal::modem::Modem,
    sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
    nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
    creds: &WifiCredentials,
) -> Result<esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>, esp_idf_svc::sys::EspError> {
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::info;

    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), nvs)?, sysloop)?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: creds.ssid.clone(),
        password: creds.password.clone(),
        auth_method: if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("WiFi: connecting to '{}'", creds.ssid);
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("WiFi: connected");
    Ok(wifi)
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

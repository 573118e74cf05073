//! hwbridge firmware: main entry point.
//!
//! Event-driven MQTT ⇄ GPIO/I2C gateway.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        I2cBus          MqttLink               │
//! │  (PinPort+TimerPort)    (BusPort)       (MessageTransport)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           GatewayService (pure logic)                  │    │
//! │  │  CommandDispatcher · ResponsePublisher                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISR / esp_timer ──▶ HW_EVENTS    MQTT task ──▶ LINK_EVENTS│
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use hwbridge::adapters::hardware::HardwareAdapter;
use hwbridge::adapters::i2c::I2cBus;
use hwbridge::adapters::mqtt::MqttLink;
use hwbridge::adapters::time::MonotonicClock;
use hwbridge::adapters::wifi::{self, WifiCredentials};
use hwbridge::app::ports::BusPort;
use hwbridge::app::service::GatewayService;
use hwbridge::config::GatewayConfig;
use hwbridge::drivers::hw_init;
use hwbridge::events::{self, LinkEvent};

/// Main loop idle period between queue drains.
const LOOP_PERIOD_MS: u32 = 10;

/// Build-time JSON overlay for [`GatewayConfig`].
const CONFIG_JSON: Option<&str> = option_env!("HWBRIDGE_CONFIG");

fn load_config() -> GatewayConfig {
    let Some(doc) = CONFIG_JSON else {
        info!("No HWBRIDGE_CONFIG, using defaults");
        return GatewayConfig::default();
    };
    match GatewayConfig::from_json(doc.as_bytes()) {
        Ok(cfg) => {
            info!("Config loaded from HWBRIDGE_CONFIG");
            cfg
        }
        Err(e) => {
            warn!("HWBRIDGE_CONFIG rejected ({}), using defaults", e);
            GatewayConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  hwbridge v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}; pin watchers will not fire", e);
    }
    let mut bus = I2cBus::install(&config.i2c);
    let mut hw = HardwareAdapter::new();
    let clock = MonotonicClock::new();

    // ── 3. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    let creds = WifiCredentials::new(&config.wifi_ssid, &config.wifi_password)
        .map_err(|e| anyhow::anyhow!("WiFi credentials: {e}"))?;
    let _wifi = wifi::connect_station(peripherals.modem, sysloop, nvs, &creds)?;

    let mut link = MqttLink::connect(&config)?;

    // ── 4. Service ────────────────────────────────────────────
    let mut service = GatewayService::new(config);
    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        events::drain_link_events(|event| match event {
            LinkEvent::Connected => {
                info!("MQTT connected");
                if let Err(e) = service.on_connected(&mut link) {
                    error!("Run with HWBRIDGE_CONFIG setting sub_topic and pub_topic ({})", e);
                }
            }
            LinkEvent::Disconnected => warn!("MQTT disconnected"),
            LinkEvent::Message(raw) => {
                let bus = bus.as_mut().map(|b| b as &mut dyn BusPort);
                service.handle_message(&raw, clock.uptime_ms(), &mut hw, bus, &mut link);
            }
        });

        events::drain_events(|event| service.on_hw_event(event, &mut hw, &mut link));

        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}

//! MQTT link adapter.
//!
//! Implements [`MessageTransport`] over the ESP-IDF MQTT client.  The
//! client runs its own task; its callback never touches gateway state and
//! only forwards [`LinkEvent`]s into the link channel:
//!
//! ```text
//!  esp-mqtt task ──▶ callback ──▶ LINK_EVENTS ──▶ main loop ──▶ GatewayService
//! ```
//!
//! Session state is mirrored in an atomic so `is_connected` can be
//! answered from the main loop without locking.
//!
//! On non-espidf targets [`NullLink`] stands in: never connected, every
//! publish fails with `NotConnected`.

use crate::app::ports::MessageTransport;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use core::sync::atomic::{AtomicBool, Ordering};

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use esp_idf_svc::sys::EspError;
    use log::{info, warn};

    use crate::app::ports::MessageTransport;
    use crate::config::GatewayConfig;
    use crate::error::CommsError;
    use crate::events::{push_link_event, push_message, LinkEvent};

    /// Set by the client callback on CONNACK, cleared on disconnect.
    static LINK_UP: AtomicBool = AtomicBool::new(false);

    pub struct MqttLink {
        client: EspMqttClient<'static>,
    }

    impl MqttLink {
        /// Start the client.  Connection happens in the background and is
        /// reported as [`LinkEvent::Connected`].
        pub fn connect(config: &GatewayConfig) -> Result<Self, EspError> {
            let conf = MqttClientConfiguration {
                client_id: Some(config.client_id.as_str()),
                ..Default::default()
            };
            let client = EspMqttClient::new_cb(&config.broker_url, &conf, |event| {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        LINK_UP.store(true, Ordering::Release);
                        push_link_event(LinkEvent::Connected);
                    }
                    EventPayload::Disconnected => {
                        LINK_UP.store(false, Ordering::Release);
                        push_link_event(LinkEvent::Disconnected);
                    }
                    EventPayload::Received { data, .. } => {
                        if !push_message(data) {
                            warn!("mqtt: inbound message dropped");
                        }
                    }
                    EventPayload::Error(e) => warn!("mqtt: {:?}", e),
                    _ => {}
                }
            })?;
            info!("mqtt: client started for {}", config.broker_url);
            Ok(Self { client })
        }
    }

    impl MessageTransport for MqttLink {
        fn is_connected(&self) -> bool {
            LINK_UP.load(Ordering::Acquire)
        }

        fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
            self.client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|e| {
                    warn!("mqtt: subscribe {} failed: {}", topic, e);
                    CommsError::SubscribeFailed
                })
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
            if !self.is_connected() {
                return Err(CommsError::NotConnected);
            }
            self.client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|_| CommsError::PublishFailed)
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::MqttLink;

// ───────────────────────────────────────────────────────────────
// Simulation stand-in
// ───────────────────────────────────────────────────────────────

/// Transport with no broker behind it.
#[derive(Debug, Default)]
pub struct NullLink;

impl MessageTransport for NullLink {
    fn is_connected(&self) -> bool {
        false
    }

    fn subscribe(&mut self, _topic: &str) -> Result<(), CommsError> {
        Err(CommsError::NotConnected)
    }

    fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), CommsError> {
        Err(CommsError::NotConnected)
    }
}

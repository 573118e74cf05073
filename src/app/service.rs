//! Gateway service, the hexagonal core.
//!
//! [`GatewayService`] owns the dispatcher and publisher and reacts to the
//! three kinds of input the main loop drains: broker session changes,
//! inbound command messages, and hardware events.  All I/O flows through
//! port traits injected at call sites, so the whole service runs against
//! mock adapters in tests.
//!
//! ```text
//!  LinkEvent ──▶ ┌─────────────────────────────┐ ──▶ MessageTransport
//!                │        GatewayService        │
//!  HwEvent   ──▶ │  Dispatcher · Publisher      │ ──▶ PinPort / BusPort / TimerPort
//!                └─────────────────────────────┘
//! ```

use log::{error, info, warn};

use crate::config::GatewayConfig;
use crate::error::{ConfigError, Result};
use crate::events::HwEvent;

use super::dispatcher::CommandDispatcher;
use super::events::Reply;
use super::ports::{BusPort, MessageTransport, PinPort, TimerPort};
use super::publisher::ResponsePublisher;

// ───────────────────────────────────────────────────────────────
// GatewayService
// ───────────────────────────────────────────────────────────────

pub struct GatewayService {
    config: GatewayConfig,
    dispatcher: CommandDispatcher,
    publisher: ResponsePublisher,
    handled: u64,
}

impl GatewayService {
    pub fn new(config: GatewayConfig) -> Self {
        let dispatcher = CommandDispatcher::new(&config);
        let publisher = ResponsePublisher::new(config.pub_topic.clone());
        Self {
            config,
            dispatcher,
            publisher,
            handled: 0,
        }
    }

    // ── Link lifecycle ────────────────────────────────────────

    /// Broker session established: subscribe to the command topic.
    ///
    /// Without both topics configured the gateway cannot be driven, so
    /// nothing is subscribed and the misconfiguration is logged.
    pub fn on_connected(&mut self, transport: &mut impl MessageTransport) -> Result<()> {
        if self.config.sub_topic.is_empty() || self.config.pub_topic.is_empty() {
            error!("sub_topic and pub_topic must both be configured; not subscribing");
            return Err(ConfigError::MissingTopic.into());
        }
        transport.subscribe(&self.config.sub_topic)?;
        info!("Subscribed to {}", self.config.sub_topic);
        Ok(())
    }

    // ── Command handling ──────────────────────────────────────

    /// Handle one inbound command and publish its reply.
    ///
    /// The reply is returned as well so callers and tests can inspect it.
    pub fn handle_message(
        &mut self,
        raw: &[u8],
        now_ms: u64,
        hw: &mut (impl PinPort + TimerPort),
        bus: Option<&mut dyn BusPort>,
        transport: &mut impl MessageTransport,
    ) -> Reply {
        self.handled += 1;
        info!("got command: {}", String::from_utf8_lossy(raw));

        let reply = self.dispatcher.handle(raw, now_ms, hw, bus);
        if let Err(e) = self.publisher.publish(transport, &reply) {
            warn!("reply not published: {}", e);
        }
        reply
    }

    // ── Asynchronous hardware events ──────────────────────────

    /// Route a drained hardware event.
    pub fn on_hw_event(
        &mut self,
        event: HwEvent,
        hw: &mut (impl PinPort + TimerPort),
        transport: &mut impl MessageTransport,
    ) {
        match event {
            HwEvent::Edge { pin, at_ms } => {
                if let Some(click) = self.dispatcher.on_edge(pin, at_ms) {
                    self.publisher.notify(transport, &click);
                }
            }
            HwEvent::TimerFired(id) => {
                self.dispatcher.on_timer_fired(id, hw);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Command messages handled since startup.
    pub fn handled_count(&self) -> u64 {
        self.handled
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }
}

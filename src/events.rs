//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - GPIO ISRs (accepted edges on watched pins)
//! - Timer callbacks (reversion timers expiring)
//! - The MQTT client task (connect, disconnect, inbound messages)
//!
//! Events are consumed by the main loop, which processes them one at a
//! time.  Producers never touch gateway state directly; the per-pin
//! tables are only written from the consumer side.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISR    │────▶│  HW_EVENTS   │────▶│              │
//! │ Timer cb    │────▶│              │     │  Main Loop   │
//! └─────────────┘     └──────────────┘     │  (consumer)  │
//! ┌─────────────┐     ┌──────────────┐     │              │
//! │ MQTT task   │────▶│ LINK_EVENTS  │────▶│              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use crate::app::ports::{PinId, TimerId};

/// Largest inbound MQTT payload accepted as a command.
pub const MAX_MESSAGE_LEN: usize = 512;

/// Channel depth for hardware events.
const HW_DEPTH: usize = 32;

/// Channel depth for link events.
const LINK_DEPTH: usize = 8;

/// Asynchronous hardware events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEvent {
    /// A watched pin saw an edge that passed the ISR pre-filter.
    Edge { pin: PinId, at_ms: u64 },
    /// A one-shot timer expired.
    TimerFired(TimerId),
}

/// Broker session events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// CONNACK received.
    Connected,
    Disconnected,
    /// A message arrived on a subscribed topic.
    Message(Vec<u8, MAX_MESSAGE_LEN>),
}

/// ISR / timer callbacks → main loop.
static HW_EVENTS: Channel<CriticalSectionRawMutex, HwEvent, HW_DEPTH> = Channel::new();

/// MQTT client task → main loop.
static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, LINK_DEPTH> = Channel::new();

/// Push a hardware event.
/// Safe to call from ISR context (never blocks).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: HwEvent) -> bool {
    HW_EVENTS.try_send(event).is_ok()
}

/// Drain all pending hardware events into a callback, in FIFO order.
pub fn drain_events(mut handler: impl FnMut(HwEvent)) {
    while let Ok(event) = HW_EVENTS.try_receive() {
        handler(event);
    }
}

/// Push a link event.  Payloads longer than [`MAX_MESSAGE_LEN`] are
/// rejected.  Returns `false` if the event was dropped.
pub fn push_link_event(event: LinkEvent) -> bool {
    LINK_EVENTS.try_send(event).is_ok()
}

/// Convenience for the MQTT callback: copy `payload` and queue it.
pub fn push_message(payload: &[u8]) -> bool {
    match Vec::from_slice(payload) {
        Ok(buf) => push_link_event(LinkEvent::Message(buf)),
        Err(()) => {
            log::warn!("dropping {}-byte message (limit {})", payload.len(), MAX_MESSAGE_LEN);
            false
        }
    }
}

/// Drain all pending link events into a callback, in FIFO order.
pub fn drain_link_events(mut handler: impl FnMut(LinkEvent)) {
    while let Ok(event) = LINK_EVENTS.try_receive() {
        handler(event);
    }
}

/// Check if the hardware event queue is empty.
pub fn queue_is_empty() -> bool {
    HW_EVENTS.is_empty()
}

/// Number of pending hardware events.
pub fn queue_len() -> usize {
    HW_EVENTS.len()
}

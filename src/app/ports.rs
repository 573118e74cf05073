//! Port traits: the hexagonal boundary between gateway logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CommandDispatcher / GatewayService
//! ```
//!
//! Driven adapters (GPIO, I2C, timers, MQTT link) implement these traits.
//! The dispatcher consumes them via generics or trait objects, so the
//! command logic never touches hardware directly and runs unchanged
//! against the mocks in `tests/integration/mock_hw.rs`.

use embedded_hal::digital::PinState;

use crate::error::{CommsError, TimerError};

/// GPIO number, as used by the ESP-IDF GPIO driver.
pub type PinId = i32;

/// Opaque handle returned by [`TimerPort::schedule_once`].
pub type TimerId = u32;

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// Internal pull resistor selection for watched inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
    Floating,
}

/// Which transition raises an edge interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Any,
}

/// Input configuration for an edge-watched pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeWatch {
    pub pull: Pull,
    pub edge: Edge,
    /// Raw edges closer together than this are dropped before they
    /// reach the event queue.
    pub debounce_ms: u32,
}

/// Write-side and configuration access to GPIO.
pub trait PinPort {
    /// Switch `pin` to push-pull output.
    fn set_output(&mut self, pin: PinId);

    /// Drive an output pin.
    fn write(&mut self, pin: PinId, state: PinState);

    /// Configure `pin` as an interrupt-driven input.  Accepted edges are
    /// delivered asynchronously through [`crate::events`].
    fn watch_edges(&mut self, pin: PinId, watch: EdgeWatch);
}

// ───────────────────────────────────────────────────────────────
// Bus port (driven adapter: domain → I2C master)
// ───────────────────────────────────────────────────────────────

/// Sampled acknowledgement of one bus step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AckStatus {
    Ack = 0,
    Nack = 1,
}

impl AckStatus {
    pub const fn is_ack(self) -> bool {
        matches!(self, Self::Ack)
    }

    /// Numeric status carried in result envelopes.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Transfer direction selected by the address byte's R/W bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDirection {
    Read,
    Write,
}

/// Bit-level I2C master primitives.
///
/// Callers must pair every [`start`](Self::start) with exactly one
/// [`stop`](Self::stop); [`BusTransaction`](crate::drivers::i2c::BusTransaction)
/// enforces this.
pub trait BusPort {
    /// Issue START and the address byte; returns the address ACK.
    fn start(&mut self, address: u8, direction: BusDirection) -> AckStatus;

    /// Clock out one data byte; returns the peripheral's ACK.
    fn send_byte(&mut self, byte: u8) -> AckStatus;

    /// Clock in `buf.len()` bytes, NACKing the last one.
    fn read_bytes(&mut self, buf: &mut [u8]) -> AckStatus;

    /// Issue STOP and release the bus.
    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain → one-shot timers)
// ───────────────────────────────────────────────────────────────

/// One-shot timers.  Expiry is delivered asynchronously as
/// [`HwEvent::TimerFired`](crate::events::HwEvent::TimerFired).
pub trait TimerPort {
    /// Arm a timer that fires once after `delay_ms`.
    fn schedule_once(&mut self, delay_ms: u32) -> Result<TimerId, TimerError>;

    /// Disarm (if still pending) and release a timer.  Unknown ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Message transport (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Publish/subscribe transport.
pub trait MessageTransport {
    /// Whether a broker session is currently established.
    fn is_connected(&self) -> bool;

    /// Subscribe to `topic` at most-once delivery.
    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Publish `payload` to `topic` at most-once delivery.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}

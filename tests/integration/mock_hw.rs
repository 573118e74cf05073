//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full command
//! history without touching real GPIO, I2C or a broker.

use embedded_hal::digital::PinState;
use hwbridge::app::ports::{
    AckStatus, BusDirection, BusPort, EdgeWatch, MessageTransport, PinId, PinPort, TimerId, TimerPort,
};
use hwbridge::error::{CommsError, TimerError};

// ── Pin + timer calls ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinCall {
    SetOutput(PinId),
    Write(PinId, PinState),
    Watch(PinId, EdgeWatch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCall {
    Schedule { id: TimerId, delay_ms: u32 },
    Cancel(TimerId),
}

/// GPIO and one-shot timers.
#[derive(Default)]
pub struct MockHw {
    pub pins: Vec<PinCall>,
    pub timers: Vec<TimerCall>,
    next_timer: TimerId,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every level written to `pin`, oldest first.
    pub fn writes_to(&self, pin: PinId) -> Vec<PinState> {
        self.pins
            .iter()
            .filter_map(|c| match c {
                PinCall::Write(p, s) if *p == pin => Some(*s),
                _ => None,
            })
            .collect()
    }

    /// Ids scheduled and not yet cancelled.
    pub fn live_timers(&self) -> Vec<TimerId> {
        let cancelled: Vec<TimerId> = self
            .timers
            .iter()
            .filter_map(|c| match c {
                TimerCall::Cancel(id) => Some(*id),
                _ => None,
            })
            .collect();
        self.timers
            .iter()
            .filter_map(|c| match c {
                TimerCall::Schedule { id, .. } if !cancelled.contains(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn last_scheduled(&self) -> Option<TimerId> {
        self.timers.iter().rev().find_map(|c| match c {
            TimerCall::Schedule { id, .. } => Some(*id),
            _ => None,
        })
    }
}

impl PinPort for MockHw {
    fn set_output(&mut self, pin: PinId) {
        self.pins.push(PinCall::SetOutput(pin));
    }

    fn write(&mut self, pin: PinId, state: PinState) {
        self.pins.push(PinCall::Write(pin, state));
    }

    fn watch_edges(&mut self, pin: PinId, watch: EdgeWatch) {
        self.pins.push(PinCall::Watch(pin, watch));
    }
}

impl TimerPort for MockHw {
    fn schedule_once(&mut self, delay_ms: u32) -> Result<TimerId, TimerError> {
        self.next_timer += 1;
        self.timers.push(TimerCall::Schedule {
            id: self.next_timer,
            delay_ms,
        });
        Ok(self.next_timer)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.push(TimerCall::Cancel(id));
    }
}

// ── Bus ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    Start(u8, BusDirection),
    Send(u8),
    Read(usize),
    Stop,
}

/// I2C master that Acks everything except where told not to.
pub struct MockBus {
    pub calls: Vec<BusCall>,
    pub start_ack: AckStatus,
    /// Zero-based index of the first Send to Nack.
    pub nack_send_at: Option<usize>,
    /// Byte returned for every read position.
    pub read_fill: u8,
    sends: usize,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            start_ack: AckStatus::Ack,
            nack_send_at: None,
            read_fill: 0x5a,
            sends: 0,
        }
    }

    pub fn nacking_start() -> Self {
        Self {
            start_ack: AckStatus::Nack,
            ..Self::new()
        }
    }

    pub fn nacking_send(at: usize) -> Self {
        Self {
            nack_send_at: Some(at),
            ..Self::new()
        }
    }

    pub fn count(&self, pred: impl Fn(&BusCall) -> bool) -> usize {
        self.calls.iter().filter(|&c| pred(c)).count()
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, BusCall::Start(..)))
    }

    pub fn sends(&self) -> usize {
        self.count(|c| matches!(c, BusCall::Send(_)))
    }

    pub fn stops(&self) -> usize {
        self.count(|c| matches!(c, BusCall::Stop))
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusPort for MockBus {
    fn start(&mut self, address: u8, direction: BusDirection) -> AckStatus {
        self.calls.push(BusCall::Start(address, direction));
        self.start_ack
    }

    fn send_byte(&mut self, byte: u8) -> AckStatus {
        self.calls.push(BusCall::Send(byte));
        let idx = self.sends;
        self.sends += 1;
        if self.nack_send_at == Some(idx) {
            AckStatus::Nack
        } else {
            AckStatus::Ack
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> AckStatus {
        self.calls.push(BusCall::Read(buf.len()));
        buf.fill(self.read_fill);
        AckStatus::Ack
    }

    fn stop(&mut self) {
        self.calls.push(BusCall::Stop);
    }
}

// ── Transport ─────────────────────────────────────────────────

/// Broker stand-in that keeps every published payload as a string.
pub struct MockTransport {
    pub connected: bool,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, String)>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn connected() -> Self {
        Self {
            connected: true,
            subscriptions: Vec::new(),
            published: Vec::new(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    pub fn payloads(&self) -> Vec<&str> {
        self.published.iter().map(|(_, p)| p.as_str()).collect()
    }
}

impl MessageTransport for MockTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        let text = String::from_utf8(payload.to_vec()).map_err(|_| CommsError::EncodeFailed)?;
        self.published.push((topic.to_string(), text));
        Ok(())
    }
}

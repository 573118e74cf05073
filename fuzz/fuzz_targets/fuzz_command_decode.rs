//! Fuzz target: `CommandDispatcher::handle`
//!
//! Feeds arbitrary bytes as an inbound command envelope and asserts that
//! every input yields exactly one reply that serialises, and that bus
//! transactions always close.
//!
//! cargo fuzz run fuzz_command_decode

#![no_main]

use embedded_hal::digital::PinState;
use hwbridge::app::dispatcher::CommandDispatcher;
use hwbridge::app::ports::{
    AckStatus, BusDirection, BusPort, EdgeWatch, PinId, PinPort, TimerId, TimerPort,
};
use hwbridge::config::GatewayConfig;
use hwbridge::error::TimerError;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Sink {
    timers: TimerId,
}

impl PinPort for Sink {
    fn set_output(&mut self, _pin: PinId) {}
    fn write(&mut self, _pin: PinId, _state: PinState) {}
    fn watch_edges(&mut self, _pin: PinId, _watch: EdgeWatch) {}
}

impl TimerPort for Sink {
    fn schedule_once(&mut self, _delay_ms: u32) -> Result<TimerId, TimerError> {
        self.timers = self.timers.wrapping_add(1);
        Ok(self.timers)
    }
    fn cancel(&mut self, _id: TimerId) {}
}

#[derive(Default)]
struct Bus {
    open: u32,
    read_total: usize,
}

impl BusPort for Bus {
    fn start(&mut self, _address: u8, _direction: BusDirection) -> AckStatus {
        self.open += 1;
        AckStatus::Ack
    }
    fn send_byte(&mut self, _byte: u8) -> AckStatus {
        assert_eq!(self.open, 1, "send outside a transaction");
        AckStatus::Ack
    }
    fn read_bytes(&mut self, buf: &mut [u8]) -> AckStatus {
        assert_eq!(self.open, 1, "read outside a transaction");
        self.read_total += buf.len();
        AckStatus::Ack
    }
    fn stop(&mut self) {
        self.open -= 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let mut dispatcher = CommandDispatcher::new(&GatewayConfig::default());
    let mut hw = Sink::default();
    let mut bus = Bus::default();

    let reply = dispatcher.handle(data, 0, &mut hw, Some(&mut bus as &mut dyn BusPort));

    assert_eq!(bus.open, 0, "every Start must be paired with a Stop");
    assert!(bus.read_total <= 100, "read above the limit reached the bus");
    let _ = serde_json::to_vec(&reply).expect("reply must serialise");
});

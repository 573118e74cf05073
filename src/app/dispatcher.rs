//! Command dispatcher.
//!
//! Turns one raw envelope into exactly one [`Reply`].  All side effects
//! go through the ports passed to [`CommandDispatcher::handle`]; the only
//! state the dispatcher keeps is the two per-pin tables it owns (pending
//! reversions and debounce records).
//!
//! ```text
//!   raw ──▶ Command::decode ──┬─ PinSet   ──▶ PinPort + StateReverter
//!                             ├─ WatchPin ──▶ PinPort + EdgeNotifier
//!                             ├─ BusRead  ──▶ BusTransaction ──▶ hex::encode
//!                             └─ BusWrite ──▶ hex::decode ──▶ BusTransaction
//! ```

use embedded_hal::digital::PinState;
use log::{debug, warn};

use crate::config::GatewayConfig;
use crate::drivers::button::EdgeNotifier;
use crate::drivers::i2c::{BusTransaction, MAX_READ_LEN};
use crate::hex;
use crate::scheduler::StateReverter;

use super::commands::Command;
use super::events::{ErrorCode, Reply};
use super::ports::{BusDirection, BusPort, Edge, EdgeWatch, PinId, PinPort, Pull, TimerId, TimerPort};

pub struct CommandDispatcher {
    reverter: StateReverter,
    notifier: EdgeNotifier,
    reversion_delay_ms: u32,
    edge_prefilter_ms: u32,
    read_limit: usize,
}

impl CommandDispatcher {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            reverter: StateReverter::new(),
            notifier: EdgeNotifier::new(config.debounce_window_ms),
            reversion_delay_ms: config.reversion_delay_ms,
            edge_prefilter_ms: config.edge_prefilter_ms,
            // Reads can never exceed the transaction buffer.
            read_limit: config.read_limit.min(MAX_READ_LEN),
        }
    }

    /// Decode and execute one command envelope.
    ///
    /// `bus` is `None` when no I2C master is installed.
    pub fn handle(
        &mut self,
        raw: &[u8],
        now_ms: u64,
        hw: &mut (impl PinPort + TimerPort),
        bus: Option<&mut dyn BusPort>,
    ) -> Reply {
        let Some(cmd) = Command::decode(raw) else {
            return Reply::error(ErrorCode::UnknownCommand);
        };
        self.execute(cmd, now_ms, hw, bus)
    }

    /// Execute an already-decoded command.
    pub fn execute(
        &mut self,
        cmd: Command,
        now_ms: u64,
        hw: &mut (impl PinPort + TimerPort),
        bus: Option<&mut dyn BusPort>,
    ) -> Reply {
        debug!("dispatch {}", cmd.name());
        match cmd {
            Command::PinSet { pin, state } => self.pin_set(pin, state, now_ms, hw),
            Command::WatchPin { pin } => self.watch_pin(pin, hw),
            Command::BusRead { address, length } => self.bus_read(address, length, bus),
            Command::BusWrite { payload } => Self::bus_write(&payload, bus),
        }
    }

    fn pin_set(&mut self, pin: PinId, state: PinState, now_ms: u64, hw: &mut (impl PinPort + TimerPort)) -> Reply {
        hw.set_output(pin);
        hw.write(pin, state);
        if let Err(e) = self
            .reverter
            .schedule(pin, state, !state, self.reversion_delay_ms, now_ms, hw)
        {
            warn!("pin {}: reversion not scheduled: {}", pin, e);
        }
        Reply::pin_set(pin, state)
    }

    fn watch_pin(&mut self, pin: PinId, hw: &mut impl PinPort) -> Reply {
        hw.watch_edges(
            pin,
            EdgeWatch {
                pull: Pull::Up,
                edge: Edge::Rising,
                debounce_ms: self.edge_prefilter_ms,
            },
        );
        if let Err(e) = self.notifier.arm(pin) {
            warn!("pin {}: watcher not armed: {}", pin, e);
        }
        Reply::watch(pin)
    }

    fn bus_read(&self, address: u8, length: i64, bus: Option<&mut dyn BusPort>) -> Reply {
        let Some(n) = usize::try_from(length)
            .ok()
            .filter(|&n| n > 0 && n <= self.read_limit)
        else {
            return Reply::error(ErrorCode::ReadLimitExceeded);
        };
        let Some(bus) = bus else {
            return Reply::error(ErrorCode::BusNotConfigured);
        };

        let mut txn = BusTransaction::start(bus, address, BusDirection::Read);
        let status = txn.start_status();
        let data = if status.is_ack() {
            let (_, buf) = txn.read_bytes(n);
            hex::encode(&buf)
        } else {
            String::new()
        };
        txn.stop();
        Reply::bus_read(status, data)
    }

    fn bus_write(payload: &str, bus: Option<&mut dyn BusPort>) -> Reply {
        let Some(bus) = bus else {
            return Reply::error(ErrorCode::BusNotConfigured);
        };
        let bytes = match hex::decode(payload) {
            Ok(b) => b,
            Err(e) => {
                warn!("i2c_write: {}", e);
                return Reply::error(ErrorCode::InvalidHex);
            }
        };
        // First byte is the peripheral address.
        let Some((&address, data)) = bytes.split_first() else {
            return Reply::error(ErrorCode::InvalidHex);
        };
        let mut txn = BusTransaction::start(bus, address, BusDirection::Write);
        if txn.start_status().is_ack() {
            for &b in data {
                debug!("i2c -> {:02x}", b);
                if !txn.send_byte(b).is_ack() {
                    break;
                }
            }
        }
        let status = txn.last_status();
        txn.stop();
        Reply::bus_write(status)
    }

    // ── Asynchronous inputs ───────────────────────────────────

    /// Feed a raw edge from the event queue to the notifier.
    pub fn on_edge(&mut self, pin: PinId, at_ms: u64) -> Option<Reply> {
        self.notifier.on_edge(pin, at_ms)
    }

    /// Feed a timer expiry from the event queue to the reverter.
    pub fn on_timer_fired(&mut self, id: TimerId, hw: &mut (impl PinPort + TimerPort)) -> Option<PinId> {
        self.reverter.on_fired(id, hw)
    }

    pub fn reverter(&self) -> &StateReverter {
        &self.reverter
    }

    pub fn notifier(&self) -> &EdgeNotifier {
        &self.notifier
    }
}

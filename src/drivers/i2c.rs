//! I2C transaction guard.
//!
//! ## Lifecycle
//!
//! ```text
//!   start(addr, dir) ──▶ send_byte / read_bytes … ──▶ stop()
//!         │                                            ▲
//!         └──────────── dropped on any path ───────────┘
//! ```
//!
//! [`BusTransaction::start`] issues START and holds the `&mut` borrow of
//! the bus until STOP, so no second transaction can interleave.  STOP is
//! issued exactly once: by [`BusTransaction::stop`] or, on every other exit
//! path, by `Drop`.  A Nacked START still gets its STOP.

use heapless::Vec;
use log::warn;

use crate::app::ports::{AckStatus, BusDirection, BusPort};

/// Largest single read, in bytes.
pub const MAX_READ_LEN: usize = 100;

/// Bytes returned by [`BusTransaction::read_bytes`].
pub type ReadBuf = Vec<u8, MAX_READ_LEN>;

pub struct BusTransaction<'a, B: BusPort + ?Sized> {
    bus: &'a mut B,
    start_status: AckStatus,
    last_status: AckStatus,
    stopped: bool,
}

impl<'a, B: BusPort + ?Sized> BusTransaction<'a, B> {
    /// Acquire the bus: START + address byte.
    pub fn start(bus: &'a mut B, address: u8, direction: BusDirection) -> Self {
        let start_status = bus.start(address, direction);
        Self {
            bus,
            start_status,
            last_status: start_status,
            stopped: false,
        }
    }

    /// ACK status of the address byte.
    pub fn start_status(&self) -> AckStatus {
        self.start_status
    }

    /// Status of the most recent step (START, or the last send/read).
    pub fn last_status(&self) -> AckStatus {
        self.last_status
    }

    /// Send one byte.  Without an acknowledged START nothing is clocked out.
    pub fn send_byte(&mut self, byte: u8) -> AckStatus {
        if !self.start_status.is_ack() {
            return AckStatus::Nack;
        }
        self.last_status = self.bus.send_byte(byte);
        self.last_status
    }

    /// Read `n` bytes (clamped to [`MAX_READ_LEN`]).
    ///
    /// Without an acknowledged START the buffer is `n` zero bytes and the
    /// bus is not touched.
    pub fn read_bytes(&mut self, n: usize) -> (AckStatus, ReadBuf) {
        let n = n.min(MAX_READ_LEN);
        let mut buf = ReadBuf::new();
        // Capacity is MAX_READ_LEN and n is clamped to it.
        let _ = buf.resize_default(n);
        if !self.start_status.is_ack() {
            return (AckStatus::Nack, buf);
        }
        self.last_status = self.bus.read_bytes(&mut buf);
        if !self.last_status.is_ack() {
            warn!("i2c: read of {} bytes not acknowledged", n);
        }
        (self.last_status, buf)
    }

    /// Release the bus.
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.bus.stop();
        }
    }
}

impl<B: BusPort + ?Sized> Drop for BusTransaction<'_, B> {
    fn drop(&mut self) {
        self.release();
    }
}

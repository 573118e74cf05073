//! I2C master adapter.
//!
//! Implements [`BusPort`] on top of the ESP-IDF legacy I2C driver.  Each
//! bus step is queued on its own command link and executed immediately,
//! so the ACK of every step is observed before the next one is issued.
//! The driver keeps the bus claimed between links until a STOP is sent.
//!
//! On non-espidf targets no master can be installed:
//! [`I2cBus::install`] returns `None` and the gateway reports the bus as
//! not configured.

use log::{info, warn};

use crate::app::ports::{AckStatus, BusDirection, BusPort};
use crate::config::I2cConfig;
use crate::drivers::hw_init;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Per-step timeout, in RTOS ticks.
#[cfg(target_os = "espidf")]
const STEP_TIMEOUT_TICKS: TickType_t = 100;

pub struct I2cBus {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    port: i32,
}

impl I2cBus {
    /// Install the master driver as configured.  `None` when the bus is
    /// disabled or the driver could not be installed.
    pub fn install(cfg: &I2cConfig) -> Option<Self> {
        if !cfg.enabled {
            info!("I2C disabled by configuration");
            return None;
        }
        match hw_init::init_i2c_master(cfg) {
            Ok(()) => Some(Self {
                port: crate::pins::I2C_PORT,
            }),
            Err(e) => {
                warn!("I2C unavailable: {}", e);
                None
            }
        }
    }
}

fn address_byte(address: u8, direction: BusDirection) -> u8 {
    let rw = match direction {
        BusDirection::Write => 0,
        BusDirection::Read => 1,
    };
    (address << 1) | rw
}

#[cfg(target_os = "espidf")]
impl I2cBus {
    /// Build a command link with `queue`, run it and map the result.
    fn run(&mut self, queue: impl FnOnce(i2c_cmd_handle_t)) -> AckStatus {
        // SAFETY: the link is created, executed and deleted here; the driver
        // was installed by `install`.  Only the main loop touches the bus.
        unsafe {
            let cmd = i2c_cmd_link_create();
            if cmd.is_null() {
                warn!("i2c: out of memory for command link");
                return AckStatus::Nack;
            }
            queue(cmd);
            let ret = i2c_master_cmd_begin(self.port, cmd, STEP_TIMEOUT_TICKS);
            i2c_cmd_link_delete(cmd);
            if ret == ESP_OK { AckStatus::Ack } else { AckStatus::Nack }
        }
    }
}

#[cfg(target_os = "espidf")]
impl BusPort for I2cBus {
    fn start(&mut self, address: u8, direction: BusDirection) -> AckStatus {
        let byte = address_byte(address, direction);
        self.run(|cmd| unsafe {
            i2c_master_start(cmd);
            i2c_master_write_byte(cmd, byte, true);
        })
    }

    fn send_byte(&mut self, byte: u8) -> AckStatus {
        self.run(|cmd| unsafe {
            i2c_master_write_byte(cmd, byte, true);
        })
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> AckStatus {
        if buf.is_empty() {
            return AckStatus::Ack;
        }
        let (ptr, len) = (buf.as_mut_ptr(), buf.len());
        self.run(|cmd| unsafe {
            i2c_master_read(cmd, ptr, len, i2c_ack_type_t_I2C_MASTER_LAST_NACK);
        })
    }

    fn stop(&mut self) {
        if !self.run(|cmd| unsafe {
            i2c_master_stop(cmd);
        })
        .is_ack()
        {
            warn!("i2c: STOP failed");
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl BusPort for I2cBus {
    fn start(&mut self, address: u8, direction: BusDirection) -> AckStatus {
        log::debug!("i2c(sim): start {:02x}", address_byte(address, direction));
        AckStatus::Nack
    }

    fn send_byte(&mut self, _byte: u8) -> AckStatus {
        AckStatus::Nack
    }

    fn read_bytes(&mut self, _buf: &mut [u8]) -> AckStatus {
        AckStatus::Nack
    }

    fn stop(&mut self) {}
}

//! Outbound envelopes.
//!
//! The dispatcher produces one [`Reply`] per handled command, and the
//! notifier produces one per accepted edge.  The
//! [`ResponsePublisher`](super::publisher::ResponsePublisher) serialises
//! them to JSON:
//!
//! ```text
//! {"type":"gpio","pin":2,"state":1}
//! {"type":"button","pin":0}
//! {"type":"click","pin":0}
//! {"type":"i2c_read","status":0,"data":"0a0b"}
//! {"type":"i2c_write","status":1}
//! {"error":{"code":-1,"message":"unknown command"}}
//! ```

use embedded_hal::digital::PinState;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::ports::{AckStatus, PinId};

/// Command-level failures reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The envelope matched none of the command schemas.
    UnknownCommand,
    /// No I2C master is installed.
    BusNotConfigured,
    /// `i2c_read` length is zero, negative, or above the read limit.
    ReadLimitExceeded,
    /// `i2c_write` data is not a hex string of at least one byte.
    InvalidHex,
}

impl ErrorCode {
    pub const fn code(self) -> i32 {
        match self {
            Self::UnknownCommand => -1,
            Self::BusNotConfigured => -2,
            Self::ReadLimitExceeded => -3,
            Self::InvalidHex => -4,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown command",
            Self::BusNotConfigured => "I2C is not enabled",
            Self::ReadLimitExceeded => "Too long read",
            Self::InvalidHex => "invalid hex data",
        }
    }
}

/// Structured replies and notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    PinSetAck { pin: PinId, state: PinState },
    WatchAck { pin: PinId },
    BusReadResult { status: AckStatus, data: String },
    BusWriteResult { status: AckStatus },
    Error(ErrorCode),
    ClickNotification { pin: PinId },
}

impl Reply {
    pub fn pin_set(pin: PinId, state: PinState) -> Self {
        Self::PinSetAck { pin, state }
    }

    pub fn watch(pin: PinId) -> Self {
        Self::WatchAck { pin }
    }

    pub fn bus_read(status: AckStatus, data: String) -> Self {
        Self::BusReadResult { status, data }
    }

    pub fn bus_write(status: AckStatus) -> Self {
        Self::BusWriteResult { status }
    }

    pub fn error(code: ErrorCode) -> Self {
        Self::Error(code)
    }

    pub fn click(pin: PinId) -> Self {
        Self::ClickNotification { pin }
    }

    /// The `type` tag, or `None` for error envelopes.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Self::PinSetAck { .. } => Some("gpio"),
            Self::WatchAck { .. } => Some("button"),
            Self::BusReadResult { .. } => Some("i2c_read"),
            Self::BusWriteResult { .. } => Some("i2c_write"),
            Self::ClickNotification { .. } => Some("click"),
            Self::Error(_) => None,
        }
    }
}

fn level(state: PinState) -> u8 {
    match state {
        PinState::Low => 0,
        PinState::High => 1,
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    code: i32,
    message: &'static str,
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Self::Error(code) = self {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(
                "error",
                &ErrorBody {
                    code: code.code(),
                    message: code.message(),
                },
            )?;
            return map.end();
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind())?;
        match self {
            Self::PinSetAck { pin, state } => {
                map.serialize_entry("pin", pin)?;
                map.serialize_entry("state", &level(*state))?;
            }
            Self::WatchAck { pin } | Self::ClickNotification { pin } => {
                map.serialize_entry("pin", pin)?;
            }
            Self::BusReadResult { status, data } => {
                map.serialize_entry("status", &status.code())?;
                map.serialize_entry("data", data)?;
            }
            Self::BusWriteResult { status } => {
                map.serialize_entry("status", &status.code())?;
            }
            Self::Error(_) => {}
        }
        map.end()
    }
}

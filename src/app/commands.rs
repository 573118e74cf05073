//! Inbound command envelopes.
//!
//! Each MQTT message on the command topic is a JSON object keyed by the
//! command name:
//!
//! ```text
//! {"gpio":{"pin":2,"state":1}}
//! {"button":{"pin":0}}
//! {"i2c_read":{"addr":80,"len":4}}
//! {"i2c_write":{"data":"50deadbeef"}}
//! ```
//!
//! Schemas are tried in that order and the first one whose required
//! fields are present and well-typed wins.  Extra keys are ignored.

use embedded_hal::digital::PinState;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use super::ports::PinId;

/// A decoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Drive `pin` to `state`; it flips back after the reversion delay.
    PinSet { pin: PinId, state: PinState },
    /// Report rising edges on `pin` as clicks.
    WatchPin { pin: PinId },
    /// Read `length` bytes from the peripheral at `address`.
    /// `length` is range-checked by the dispatcher, not here.
    BusRead { address: u8, length: i64 },
    /// Hex payload: address byte followed by the bytes to write.
    BusWrite { payload: String },
}

#[derive(Deserialize)]
struct PinSetArgs {
    pin: PinId,
    state: Level,
}

#[derive(Deserialize)]
struct WatchArgs {
    pin: PinId,
}

#[derive(Deserialize)]
struct BusReadArgs {
    addr: u8,
    len: Length,
}

/// Integer read length.  Integers outside `i64` saturate so they still
/// reach the dispatcher's range check.
#[derive(Deserialize)]
#[serde(try_from = "Number")]
struct Length(i64);

impl TryFrom<Number> for Length {
    type Error = &'static str;

    fn try_from(n: Number) -> Result<Self, Self::Error> {
        if let Some(v) = n.as_i64() {
            return Ok(Self(v));
        }
        if n.is_u64() {
            return Ok(Self(i64::MAX));
        }
        // serde_json parses integers past u64 as f64.
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 => Ok(Self(if f > 0.0 { i64::MAX } else { i64::MIN })),
            _ => Err("len must be an integer"),
        }
    }
}

#[derive(Deserialize)]
struct BusWriteArgs {
    data: String,
}

/// `0`/`1` or `false`/`true`.
#[derive(Deserialize)]
#[serde(try_from = "RawLevel")]
struct Level(PinState);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Int(u64),
    Bool(bool),
}

impl TryFrom<RawLevel> for Level {
    type Error = &'static str;

    fn try_from(raw: RawLevel) -> Result<Self, Self::Error> {
        match raw {
            RawLevel::Int(0) | RawLevel::Bool(false) => Ok(Self(PinState::Low)),
            RawLevel::Int(1) | RawLevel::Bool(true) => Ok(Self(PinState::High)),
            RawLevel::Int(_) => Err("state must be 0 or 1"),
        }
    }
}

impl Command {
    /// Decode a raw MQTT payload.  Returns `None` for anything that is not
    /// a JSON object matching one of the schemas.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        let envelope: Value = serde_json::from_slice(raw).ok()?;
        Self::from_value(&envelope)
    }

    /// Decode an already-parsed envelope.
    pub fn from_value(envelope: &Value) -> Option<Self> {
        if !envelope.is_object() {
            return None;
        }
        if let Some(args) = section::<PinSetArgs>(envelope, "gpio") {
            return Some(Self::PinSet {
                pin: args.pin,
                state: args.state.0,
            });
        }
        if let Some(args) = section::<WatchArgs>(envelope, "button") {
            return Some(Self::WatchPin { pin: args.pin });
        }
        if let Some(args) = section::<BusReadArgs>(envelope, "i2c_read") {
            return Some(Self::BusRead {
                address: args.addr,
                length: args.len.0,
            });
        }
        if let Some(args) = section::<BusWriteArgs>(envelope, "i2c_write") {
            return Some(Self::BusWrite { payload: args.data });
        }
        None
    }

    /// Command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PinSet { .. } => "gpio",
            Self::WatchPin { .. } => "button",
            Self::BusRead { .. } => "i2c_read",
            Self::BusWrite { .. } => "i2c_write",
        }
    }
}

fn section<T: DeserializeOwned>(envelope: &Value, key: &str) -> Option<T> {
    envelope.get(key).and_then(|v| T::deserialize(v).ok())
}

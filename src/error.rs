//! Unified error types for the gateway.
//!
//! Every subsystem has its own small `Copy` error enum; all of them convert
//! into [`Error`] so the service layer can log one type.  None of these ever
//! reach the wire: command-level failures are reported as error envelopes
//! (see [`ErrorCode`](crate::app::events::ErrorCode)) instead.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level gateway error
// ---------------------------------------------------------------------------

/// Every fallible operation in the gateway funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is missing or out of range.
    Config(ConfigError),
    /// The message transport refused an operation.
    Comms(CommsError),
    /// A hex payload could not be decoded.
    Hex(HexError),
    /// The timer capability could not arm or release a timer.
    Timer(TimerError),
    /// A fixed-capacity per-pin table is full.
    Capacity(CapacityError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Hex(e) => write!(f, "hex: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Capacity(e) => write!(f, "capacity: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The inbound or outbound topic is empty.
    MissingTopic,
    /// A field failed range validation.  The string names the field.
    ValidationFailed(&'static str),
    /// The JSON document could not be parsed.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTopic => write!(f, "sub_topic and pub_topic must both be set"),
            Self::ValidationFailed(field) => write!(f, "validation failed: {field}"),
            Self::Malformed => write!(f, "malformed config document"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// No broker connection is currently established.
    NotConnected,
    /// The client rejected the subscribe request.
    SubscribeFailed,
    /// The client rejected the publish request.
    PublishFailed,
    /// The envelope could not be serialised.
    EncodeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "transport not connected"),
            Self::SubscribeFailed => write!(f, "MQTT subscribe failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::EncodeFailed => write!(f, "envelope encoding failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Hex codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    /// The character at `position` is not a hex digit.
    InvalidDigit { position: usize },
    /// The requested byte offset lies past the end of the input.
    OutOfRange { offset: usize },
}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDigit { position } => write!(f, "invalid hex digit at {position}"),
            Self::OutOfRange { offset } => write!(f, "byte offset {offset} out of range"),
        }
    }
}

impl From<HexError> for Error {
    fn from(e: HexError) -> Self {
        Self::Hex(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The platform refused to create the timer.
    CreateFailed(i32),
    /// The platform refused to start the timer.
    StartFailed(i32),
    /// Every timer slot is in use.
    Exhausted,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateFailed(rc) => write!(f, "timer create failed (rc={rc})"),
            Self::StartFailed(rc) => write!(f, "timer start failed (rc={rc})"),
            Self::Exhausted => write!(f, "no free timer slots"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Capacity errors
// ---------------------------------------------------------------------------

/// A per-pin table has no room for another pin.  Carries the table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError(pub &'static str);

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} table full", self.0)
    }
}

impl From<CapacityError> for Error {
    fn from(e: CapacityError) -> Self {
        Self::Capacity(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Gateway-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

//! Application core: pure gateway logic, zero I/O.
//!
//! Command decoding, dispatch, reply encoding and publishing.  All
//! interaction with hardware and the broker happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod publisher;
pub mod service;

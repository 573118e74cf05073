//! Peripheral drivers, hardware initialisation, and bus helpers.

pub mod button;
pub mod hw_init;
pub mod hw_timer;
pub mod i2c;

//! GPIO / peripheral pin assignments for the gateway board.
//!
//! Single source of truth for the fixed wiring.  Pins driven or watched by
//! commands arrive over MQTT and are not listed here.

// ---------------------------------------------------------------------------
// I²C bus
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
/// Standard-mode clock.
pub const I2C_FREQ_HZ: u32 = 100_000;
/// I2C controller used for the command bus.
pub const I2C_PORT: i32 = 0;

// ---------------------------------------------------------------------------
// GPIO range
// ---------------------------------------------------------------------------

/// Number of GPIOs on the ESP32-S3 (GPIO0 – GPIO48).
pub const GPIO_COUNT: usize = 49;

/// Whether `pin` names a GPIO that exists on this chip.
pub const fn is_valid_gpio(pin: i32) -> bool {
    pin >= 0 && (pin as usize) < GPIO_COUNT
}

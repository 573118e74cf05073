//! Hardware peripheral setup and raw GPIO access.
//!
//! Configures GPIO directions and edge interrupts, installs the GPIO ISR
//! service and the I2C master driver using raw ESP-IDF sys calls.  On
//! non-espidf targets every function is a simulation stub.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::{Edge, PinId, Pull};
use crate::config::I2cConfig;

// ── Error type ────────────────────────────────────────────────

/// Errors during peripheral setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    I2cInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::I2cInstallFailed(rc) => write!(f, "I2C master install failed (rc={})", rc),
        }
    }
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn configure_output(pin: PinId) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: gpio_config only touches the pin named in the mask; pins are
    // range-checked by the caller.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_output(_pin: PinId) -> Result<(), HwInitError> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: PinId, high: bool) {
    // SAFETY: register write on a configured output pin; main loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: PinId, _high: bool) {}

// ── GPIO edge inputs ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::prefilter_accepts;
#[cfg(target_os = "espidf")]
use crate::events::{push_event, HwEvent};

/// Shared ISR for every watched pin; the pin number travels in `arg`.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_gpio_isr(arg: *mut core::ffi::c_void) {
    let pin = arg as usize as PinId;
    // SAFETY: esp_timer_get_time is a RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u64;
    if prefilter_accepts(pin, now_ms as u32) {
        push_event(HwEvent::Edge { pin, at_ms: now_ms });
    }
}

/// Configure `pin` as an interrupt-driven input and attach the edge ISR.
/// Requires [`init_isr_service`] to have run.
#[cfg(target_os = "espidf")]
pub fn configure_edge_input(pin: PinId, pull: Pull, edge: Edge) -> Result<(), HwInitError> {
    let (pull_up_en, pull_down_en) = match pull {
        Pull::Up => (gpio_pullup_t_GPIO_PULLUP_ENABLE, gpio_pulldown_t_GPIO_PULLDOWN_DISABLE),
        Pull::Down => (gpio_pullup_t_GPIO_PULLUP_DISABLE, gpio_pulldown_t_GPIO_PULLDOWN_ENABLE),
        Pull::Floating => (gpio_pullup_t_GPIO_PULLUP_DISABLE, gpio_pulldown_t_GPIO_PULLDOWN_DISABLE),
    };
    let intr_type = match edge {
        Edge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
        Edge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
        Edge::Any => gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en,
        pull_down_en,
        intr_type,
    };
    // SAFETY: single-pin config from the main loop.  The handler is a static
    // function that only touches atomics and the event channel.  Removing a
    // previously attached handler first makes re-arming idempotent.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        gpio_isr_handler_remove(pin);
        let ret = gpio_isr_handler_add(pin, Some(edge_gpio_isr), pin as usize as *mut _);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        gpio_intr_enable(pin);
    }
    info!("hw_init: GPIO {} armed for {:?} edges ({:?})", pin, edge, pull);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_edge_input(_pin: PinId, _pull: Pull, _edge: Edge) -> Result<(), HwInitError> {
    Ok(())
}

// ── GPIO ISR service ──────────────────────────────────────────

/// Install the per-pin GPIO ISR service.  Call once before the event loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means it was already installed.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    info!("hw_init: GPIO ISR service installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── I2C master ────────────────────────────────────────────────

/// Install the legacy I2C master driver on [`pins::I2C_PORT`](crate::pins::I2C_PORT).
#[cfg(target_os = "espidf")]
pub fn init_i2c_master(cfg: &I2cConfig) -> Result<(), HwInitError> {
    let mut conf = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: cfg.sda_gpio,
        scl_io_num: cfg.scl_gpio,
        sda_pullup_en: true,
        scl_pullup_en: true,
        ..Default::default()
    };
    conf.__bindgen_anon_1.master.clk_speed = cfg.frequency_hz;

    // SAFETY: called once from main() before the event loop.
    unsafe {
        let ret = i2c_param_config(crate::pins::I2C_PORT, &conf);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::I2cInstallFailed(ret));
        }
        let ret = i2c_driver_install(crate::pins::I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::I2cInstallFailed(ret));
        }
    }
    info!(
        "hw_init: I2C master sda={} scl={} @ {} Hz",
        cfg.sda_gpio, cfg.scl_gpio, cfg.frequency_hz
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_i2c_master(_cfg: &I2cConfig) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): I2C master not installed");
    Err(HwInitError::I2cInstallFailed(-1))
}

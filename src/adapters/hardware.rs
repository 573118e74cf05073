//! Hardware adapter: bridges GPIO and timers to domain port traits.
//!
//! Exposes the raw GPIO helpers in [`hw_init`] through [`PinPort`] and
//! the one-shot [`HwTimer`] through [`TimerPort`], so the dispatcher can
//! take both as a single `&mut (impl PinPort + TimerPort)`.  On
//! non-espidf targets the GPIO helpers are stubs and pin levels are
//! recorded for inspection.

use embedded_hal::digital::PinState;
use log::warn;

use crate::app::ports::{EdgeWatch, PinId, PinPort, TimerId, TimerPort};
use crate::drivers::button::set_prefilter;
use crate::drivers::hw_init;
use crate::drivers::hw_timer::HwTimer;
use crate::error::TimerError;
use crate::pins::{self, GPIO_COUNT};

pub struct HardwareAdapter {
    timer: HwTimer,
    /// Last level written per GPIO.
    levels: [Option<PinState>; GPIO_COUNT],
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self {
            timer: HwTimer::new(),
            levels: [None; GPIO_COUNT],
        }
    }

    /// Last level written to `pin`, if any.
    pub fn level(&self, pin: PinId) -> Option<PinState> {
        usize::try_from(pin).ok().and_then(|i| self.levels.get(i).copied().flatten())
    }

    pub fn timer_mut(&mut self) -> &mut HwTimer {
        &mut self.timer
    }
}

// ── PinPort implementation ────────────────────────────────────

impl PinPort for HardwareAdapter {
    fn set_output(&mut self, pin: PinId) {
        if !pins::is_valid_gpio(pin) {
            warn!("set_output: GPIO {} does not exist", pin);
            return;
        }
        if let Err(e) = hw_init::configure_output(pin) {
            warn!("set_output: {}", e);
        }
    }

    fn write(&mut self, pin: PinId, state: PinState) {
        let Some(slot) = usize::try_from(pin).ok().and_then(|i| self.levels.get_mut(i)) else {
            warn!("write: GPIO {} does not exist", pin);
            return;
        };
        *slot = Some(state);
        hw_init::gpio_write(pin, state == PinState::High);
    }

    fn watch_edges(&mut self, pin: PinId, watch: EdgeWatch) {
        if !pins::is_valid_gpio(pin) {
            warn!("watch_edges: GPIO {} does not exist", pin);
            return;
        }
        // Window must be in place before the interrupt is enabled.
        set_prefilter(pin, watch.debounce_ms);
        if let Err(e) = hw_init::configure_edge_input(pin, watch.pull, watch.edge) {
            warn!("watch_edges: {}", e);
        }
    }
}

// ── TimerPort implementation ──────────────────────────────────

impl TimerPort for HardwareAdapter {
    fn schedule_once(&mut self, delay_ms: u32) -> Result<TimerId, TimerError> {
        self.timer.schedule_once(delay_ms)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timer.cancel(id);
    }
}

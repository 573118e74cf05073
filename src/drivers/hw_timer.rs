//! One-shot timers using ESP-IDF's esp_timer API.
//!
//! Each [`TimerPort::schedule_once`] creates an esp_timer whose callback
//! pushes [`HwEvent::TimerFired`] into the event channel; the timer id
//! travels in the callback argument.  The handle lives until
//! [`TimerPort::cancel`] releases it, which the reverter does both for
//! superseded and for expired timers.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call `push_event()`.
//!
//! On simulation targets the table only records the requested delay;
//! nothing expires, and tests inject `TimerFired` themselves.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::FnvIndexMap;
use log::warn;

use crate::app::ports::{TimerId, TimerPort};
use crate::error::TimerError;
use crate::events::{push_event, HwEvent};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Expiries dropped because the event channel was full.
static LOST_EXPIRIES: AtomicU32 = AtomicU32::new(0);

/// Queue a timer expiry for the main loop.  A full channel loses the
/// expiry; the handle stays live until the pin's next `gpio` command
/// replaces it.
pub fn deliver_expiry(id: TimerId) -> bool {
    if push_event(HwEvent::TimerFired(id)) {
        return true;
    }
    record_lost(id);
    false
}

pub fn lost_expiries() -> u32 {
    LOST_EXPIRIES.load(Ordering::Relaxed)
}

fn record_lost(id: TimerId) {
    LOST_EXPIRIES.fetch_add(1, Ordering::Relaxed);
    warn!("hw_timer: event queue full, expiry of timer {} lost", id);
}

/// Upper bound on live timer handles.
pub const MAX_TIMERS: usize = 64;

#[cfg(target_os = "espidf")]
type Slot = esp_timer_handle_t;

/// Simulation slot: requested delay.
#[cfg(not(target_os = "espidf"))]
type Slot = u32;

pub struct HwTimer {
    next_id: TimerId,
    live: FnvIndexMap<TimerId, Slot, MAX_TIMERS>,
}

impl Default for HwTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl HwTimer {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            live: FnvIndexMap::new(),
        }
    }

    /// Number of handles not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn alloc_id(&mut self) -> TimerId {
        // Zero is never handed out.
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn one_shot_cb(arg: *mut core::ffi::c_void) {
    deliver_expiry(arg as usize as TimerId);
}

#[cfg(target_os = "espidf")]
impl TimerPort for HwTimer {
    fn schedule_once(&mut self, delay_ms: u32) -> Result<TimerId, TimerError> {
        if self.live.len() == MAX_TIMERS {
            return Err(TimerError::Exhausted);
        }
        let id = self.alloc_id();
        let args = esp_timer_create_args_t {
            callback: Some(one_shot_cb),
            arg: id as usize as *mut _,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"revert\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: `handle` is written by esp_timer_create and owned by this
        // table until cancel() deletes it.  The callback only pushes to the
        // event channel.
        unsafe {
            let ret = esp_timer_create(&args, &mut handle);
            if ret != ESP_OK {
                return Err(TimerError::CreateFailed(ret));
            }
            let ret = esp_timer_start_once(handle, u64::from(delay_ms) * 1_000);
            if ret != ESP_OK {
                esp_timer_delete(handle);
                return Err(TimerError::StartFailed(ret));
            }
        }
        if self.live.insert(id, handle).is_err() {
            // SAFETY: handle was created above and is not shared.
            unsafe {
                esp_timer_stop(handle);
                esp_timer_delete(handle);
            }
            return Err(TimerError::Exhausted);
        }
        Ok(id)
    }

    fn cancel(&mut self, id: TimerId) {
        let Some(handle) = self.live.remove(&id) else {
            return;
        };
        // SAFETY: handle came from esp_timer_create and is removed from the
        // table before deletion, so it is deleted exactly once.  Stopping an
        // expired one-shot returns ESP_ERR_INVALID_STATE, which is fine.
        unsafe {
            esp_timer_stop(handle);
            let ret = esp_timer_delete(handle);
            if ret != ESP_OK {
                warn!("hw_timer: delete of timer {} failed (rc={})", id, ret);
            }
        }
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl TimerPort for HwTimer {
    fn schedule_once(&mut self, delay_ms: u32) -> Result<TimerId, TimerError> {
        if self.live.len() == MAX_TIMERS {
            return Err(TimerError::Exhausted);
        }
        let id = self.alloc_id();
        self.live
            .insert(id, delay_ms)
            .map_err(|_| TimerError::Exhausted)?;
        Ok(id)
    }

    fn cancel(&mut self, id: TimerId) {
        self.live.remove(&id);
    }
}

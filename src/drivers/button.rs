//! Debounced edge notifier for watched ("button") pins.
//!
//! ## Two stages
//!
//! 1. **ISR pre-filter**: the GPIO ISR records the raw edge time per pin
//!    in an atomic and drops edges that arrive within the pin's
//!    pre-filter window.  Surviving edges go to the event queue.
//! 2. **Notifier**: the main loop feeds each queued edge to
//!    [`EdgeNotifier::on_edge`], which accepts it only if more than the
//!    debounce window has passed since the last *accepted* edge on that
//!    pin.  Accepted edges become click notifications.
//!
//! | State      | Condition                               | Output             |
//! |------------|-----------------------------------------|--------------------|
//! | Idle       | never accepted, or `now - last > window`| `ClickNotification`|
//! | Suppressed | `now - last <= window`                  | none, no update    |
//!
//! This is a rate limiter, not a counting debounce: suppressed edges do
//! not extend the window.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use heapless::FnvIndexMap;
use log::{debug, info};

use crate::app::events::Reply;
use crate::app::ports::PinId;
use crate::error::CapacityError;
use crate::pins::GPIO_COUNT;

/// Upper bound on simultaneously watched pins.
pub const MAX_WATCHED_PINS: usize = 64;

// ── ISR pre-filter ────────────────────────────────────────────

/// Raw ISR timestamp of the last edge per GPIO (milliseconds since boot,
/// truncated to u32).  Written by the ISR only.
static LAST_RAW_EDGE_MS: [AtomicU32; GPIO_COUNT] = [const { AtomicU32::new(0) }; GPIO_COUNT];
static SEEN_RAW_EDGE: [AtomicBool; GPIO_COUNT] = [const { AtomicBool::new(false) }; GPIO_COUNT];
/// Pre-filter window per GPIO, set when the pin is armed.
static PREFILTER_MS: [AtomicU32; GPIO_COUNT] = [const { AtomicU32::new(0) }; GPIO_COUNT];

/// Configure the pre-filter window for `pin` and forget its edge history.
/// Call before enabling the pin's interrupt.
pub fn set_prefilter(pin: PinId, window_ms: u32) {
    let Some(idx) = gpio_index(pin) else { return };
    PREFILTER_MS[idx].store(window_ms, Ordering::Relaxed);
    SEEN_RAW_EDGE[idx].store(false, Ordering::Release);
}

/// ISR-side filter.  Returns `true` if the edge should be queued.
/// Safe to call from interrupt context (lock-free atomics only).
pub fn prefilter_accepts(pin: PinId, now_ms: u32) -> bool {
    let Some(idx) = gpio_index(pin) else { return false };
    let window = PREFILTER_MS[idx].load(Ordering::Relaxed);
    let last = LAST_RAW_EDGE_MS[idx].load(Ordering::Acquire);
    let seen = SEEN_RAW_EDGE[idx].load(Ordering::Acquire);

    LAST_RAW_EDGE_MS[idx].store(now_ms, Ordering::Release);
    SEEN_RAW_EDGE[idx].store(true, Ordering::Release);

    !seen || now_ms.wrapping_sub(last) >= window
}

fn gpio_index(pin: PinId) -> Option<usize> {
    usize::try_from(pin).ok().filter(|&i| i < GPIO_COUNT)
}

// ── Notifier ──────────────────────────────────────────────────

/// Per-pin debounce record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceState {
    /// `None` until the first edge is accepted.
    pub last_accepted_ms: Option<u64>,
}

/// Observable notifier state for one pin at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Idle,
    Suppressed,
}

pub struct EdgeNotifier {
    window_ms: u64,
    watched: FnvIndexMap<PinId, DebounceState, MAX_WATCHED_PINS>,
}

impl EdgeNotifier {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: u64::from(window_ms),
            watched: FnvIndexMap::new(),
        }
    }

    /// Start watching `pin`.  Re-arming resets its history to "never".
    pub fn arm(&mut self, pin: PinId) -> Result<(), CapacityError> {
        self.watched
            .insert(pin, DebounceState::default())
            .map(|_| ())
            .map_err(|_| CapacityError("watcher"))
    }

    pub fn is_armed(&self, pin: PinId) -> bool {
        self.watched.contains_key(&pin)
    }

    pub fn debounce_state(&self, pin: PinId) -> Option<DebounceState> {
        self.watched.get(&pin).copied()
    }

    /// Whether an edge on `pin` at `now_ms` would be accepted.
    pub fn state(&self, pin: PinId, now_ms: u64) -> NotifierState {
        match self.watched.get(&pin) {
            Some(s) if !self.window_elapsed(s, now_ms) => NotifierState::Suppressed,
            _ => NotifierState::Idle,
        }
    }

    /// Feed one raw edge.  Returns the click notification if accepted.
    pub fn on_edge(&mut self, pin: PinId, at_ms: u64) -> Option<Reply> {
        let window_ms = self.window_ms;
        let Some(state) = self.watched.get_mut(&pin) else {
            debug!("edge on unwatched pin {} ignored", pin);
            return None;
        };

        let accept = match state.last_accepted_ms {
            None => true,
            Some(last) => at_ms.saturating_sub(last) > window_ms,
        };
        if !accept {
            return None;
        }

        state.last_accepted_ms = Some(at_ms);
        info!("Click! pin={}", pin);
        Some(Reply::click(pin))
    }

    fn window_elapsed(&self, state: &DebounceState, now_ms: u64) -> bool {
        state
            .last_accepted_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > self.window_ms)
    }
}

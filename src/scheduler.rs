//! One-shot pin reversion scheduler.
//!
//! Every `gpio` command drives a pin and then asks this scheduler to flip
//! it back to the complement after a fixed delay.  The scheduler owns the
//! only record of pending reversions; at most one exists per pin.
//!
//! ```text
//!   gpio{pin, state} ──▶ schedule(pin, !state, delay)
//!                              │  cancels the pin's previous timer
//!                              ▼
//!                      TimerPort::schedule_once ──▶ … ──▶ HwEvent::TimerFired(id)
//!                                                                │
//!   PinPort::write(pin, !state) ◀── on_fired(id) ◀───────────────┘
//! ```
//!
//! Timer expiry arrives through the event queue, so a timer that was
//! cancelled after its callback already queued the event can still show
//! up.  Such stale ids no longer match a pending entry and are ignored.

use embedded_hal::digital::PinState;
use heapless::FnvIndexMap;
use log::{info, warn};

use crate::app::ports::{PinId, PinPort, TimerId, TimerPort};
use crate::error::{CapacityError, Result};

/// Upper bound on pins with a pending reversion.
pub const MAX_PENDING: usize = 64;

/// A scheduled future write of `target` to `pin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReversion {
    pub pin: PinId,
    /// Level written by the command that scheduled this reversion.
    pub initial: PinState,
    /// Level written when the timer fires.
    pub target: PinState,
    pub deadline_ms: u64,
    timer: TimerId,
}

impl PendingReversion {
    pub fn timer(&self) -> TimerId {
        self.timer
    }
}

/// Owner of every pending reversion.
pub struct StateReverter {
    pending: FnvIndexMap<PinId, PendingReversion, MAX_PENDING>,
}

impl Default for StateReverter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateReverter {
    pub fn new() -> Self {
        Self {
            pending: FnvIndexMap::new(),
        }
    }

    /// Replace any pending reversion for `pin` with a new one firing after
    /// `delay_ms`.
    pub fn schedule(
        &mut self,
        pin: PinId,
        initial: PinState,
        target: PinState,
        delay_ms: u32,
        now_ms: u64,
        timer: &mut impl TimerPort,
    ) -> Result<()> {
        self.cancel(pin, timer);

        if self.pending.len() == MAX_PENDING {
            return Err(CapacityError("reversion").into());
        }

        let id = timer.schedule_once(delay_ms)?;
        let entry = PendingReversion {
            pin,
            initial,
            target,
            deadline_ms: now_ms + u64::from(delay_ms),
            timer: id,
        };
        if self.pending.insert(pin, entry).is_err() {
            timer.cancel(id);
            return Err(CapacityError("reversion").into());
        }
        Ok(())
    }

    /// Drop the pending reversion for `pin` without firing it.
    /// Returns `true` if one existed.
    pub fn cancel(&mut self, pin: PinId, timer: &mut impl TimerPort) -> bool {
        match self.pending.remove(&pin) {
            Some(old) => {
                timer.cancel(old.timer);
                true
            }
            None => false,
        }
    }

    /// Handle a timer expiry.  Returns the pin that was reverted, or `None`
    /// if `id` does not belong to a pending reversion.
    pub fn on_fired(&mut self, id: TimerId, hw: &mut (impl PinPort + TimerPort)) -> Option<PinId> {
        let Some(pin) = self
            .pending
            .iter()
            .find(|(_, p)| p.timer == id)
            .map(|(pin, _)| *pin)
        else {
            warn!("reversion timer {} fired with no pending entry", id);
            return None;
        };

        let entry = self.pending.remove(&pin)?;
        info!(
            "Set pin [{}] state from [{}] to [{}]",
            pin,
            level(entry.initial),
            level(entry.target)
        );
        hw.write(pin, entry.target);
        // Release the expired one-shot handle.
        hw.cancel(id);
        Some(pin)
    }

    pub fn pending(&self, pin: PinId) -> Option<&PendingReversion> {
        self.pending.get(&pin)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn level(state: PinState) -> u8 {
    match state {
        PinState::Low => 0,
        PinState::High => 1,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

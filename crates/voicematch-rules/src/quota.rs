//! Per-cycle action quota.
//!
//! ## State machine
//!
//! ```text
//! FreshCycle  --action-->   WithinLimit | AtLimit
//! WithinLimit --action-->   WithinLimit | AtLimit
//! AtLimit     --attempt-->  AtLimit      (denied, no write)
//! AtLimit     --expiry-->   FreshCycle
//! ```
//!
//! The action that triggers a rollover is the first action of the new
//! cycle, so the count restarts at 1, never 0.

use serde::{Deserialize, Serialize};
use voicematch_types::{TimestampMs, UserQuotaState, CYCLE_WINDOW_MS};

use crate::cycle;

/// Where a quota document currently sits in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPhase {
    /// No cycle running; the next action opens a new one.
    FreshCycle,
    /// Cycle running with allowance left.
    WithinLimit,
    /// Cycle running and exhausted.
    AtLimit,
}

/// Admit/deny decisions over a fixed rolling window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaTracker {
    window_ms: u64,
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(CYCLE_WINDOW_MS)
    }
}

impl QuotaTracker {
    /// Create a tracker with the given window length in milliseconds.
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    fn is_expired(&self, state: &UserQuotaState, now: TimestampMs) -> bool {
        cycle::is_window_expired(state.cycle_start, now, self.window_ms)
    }

    /// Whether one more action may be admitted at `now`.
    pub fn can_admit(&self, state: &UserQuotaState, now: TimestampMs) -> bool {
        self.is_expired(state, now) || state.count < state.limit
    }

    /// Record one action.
    ///
    /// Unconditional: gate with [`QuotaTracker::can_admit`] first.
    pub fn admit(&self, state: &UserQuotaState, now: TimestampMs) -> UserQuotaState {
        if self.is_expired(state, now) {
            UserQuotaState {
                count: 1,
                cycle_start: Some(now),
                limit: state.limit,
            }
        } else {
            UserQuotaState {
                count: state.count.saturating_add(1),
                cycle_start: state.cycle_start,
                limit: state.limit,
            }
        }
    }

    /// Actions left in the cycle, in `[0, limit]`.
    pub fn remaining(&self, state: &UserQuotaState, now: TimestampMs) -> u32 {
        if self.is_expired(state, now) {
            state.limit
        } else {
            state.limit.saturating_sub(state.count)
        }
    }

    pub fn phase(&self, state: &UserQuotaState, now: TimestampMs) -> QuotaPhase {
        if self.is_expired(state, now) {
            QuotaPhase::FreshCycle
        } else if state.count >= state.limit {
            QuotaPhase::AtLimit
        } else {
            QuotaPhase::WithinLimit
        }
    }

    /// When the running cycle rolls over. `None` if no cycle is running.
    pub fn resets_at(&self, state: &UserQuotaState, now: TimestampMs) -> Option<TimestampMs> {
        if self.is_expired(state, now) {
            None
        } else {
            cycle::window_resets_at(state.cycle_start, self.window_ms)
        }
    }
}

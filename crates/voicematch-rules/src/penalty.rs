//! Report accumulation and automatic account lock.
//!
//! Each report raises `report_count` by one. Reaching the threshold locks
//! the account; the lock is sticky on this path and only an admin override
//! clears it. The override never touches `report_count`.
//!
//! The accumulator assumes a valid, distinct target. Self-reports and
//! reports against unknown users are rejected before they get here.

use voicematch_types::{PenaltyState, LOCK_THRESHOLD};

/// Applies reports and admin overrides to a [`PenaltyState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PenaltyAccumulator {
    lock_threshold: u32,
}

impl Default for PenaltyAccumulator {
    fn default() -> Self {
        Self::new(LOCK_THRESHOLD)
    }
}

impl PenaltyAccumulator {
    pub fn new(lock_threshold: u32) -> Self {
        Self { lock_threshold }
    }

    pub fn lock_threshold(&self) -> u32 {
        self.lock_threshold
    }

    /// Count one more report and lock the account if it reaches the threshold.
    pub fn apply_report(&self, state: &PenaltyState) -> PenaltyState {
        let report_count = state.report_count.saturating_add(1);
        PenaltyState {
            report_count,
            is_account_locked: state.is_account_locked || report_count >= self.lock_threshold,
        }
    }

    /// Whether applying one more report would flip the lock on.
    pub fn would_lock(&self, state: &PenaltyState) -> bool {
        !state.is_account_locked && self.apply_report(state).is_account_locked
    }
}

/// Admin override of the lock flag. `report_count` is left alone.
pub fn admin_set_lock(state: &PenaltyState, locked: bool) -> PenaltyState {
    PenaltyState {
        report_count: state.report_count,
        is_account_locked: locked,
    }
}

/// Admin reset of the report counter. The lock flag is left alone.
pub fn admin_reset_reports(state: &PenaltyState) -> PenaltyState {
    PenaltyState {
        report_count: 0,
        is_account_locked: state.is_account_locked,
    }
}

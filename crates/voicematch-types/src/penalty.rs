//! Report penalties and the account lock flag.

use serde::{Deserialize, Serialize};

use crate::{TimestampMs, UserId};

/// Trust state of a single user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyState {
    /// Distinct reports against the user. Only an admin reset lowers it.
    pub report_count: u32,
    /// Trust gate. Set automatically at the lock threshold, cleared only by
    /// an admin override.
    pub is_account_locked: bool,
}

/// One report submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub reporter_id: UserId,
    pub target_id: UserId,
    pub reason: String,
    pub created_at: TimestampMs,
}

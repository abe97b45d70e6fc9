//! Per-cycle action quota documents.

use serde::{Deserialize, Serialize};

use crate::TimestampMs;

/// The persisted part of a quota document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaCycle {
    /// Actions taken in the current cycle.
    pub count: u32,
    /// Start of the current rolling window. `None` = never started.
    pub cycle_start: Option<TimestampMs>,
}

/// A quota document together with the limit of the owner's tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuotaState {
    pub count: u32,
    pub cycle_start: Option<TimestampMs>,
    /// Max actions per cycle. Always > 0.
    pub limit: u32,
}

impl UserQuotaState {
    /// A quota that has never been used.
    pub fn fresh(limit: u32) -> Self {
        Self {
            count: 0,
            cycle_start: None,
            limit,
        }
    }

    pub fn from_cycle(cycle: QuotaCycle, limit: u32) -> Self {
        Self {
            count: cycle.count,
            cycle_start: cycle.cycle_start,
            limit,
        }
    }

    /// The part of the state that gets persisted.
    pub fn cycle(&self) -> QuotaCycle {
        QuotaCycle {
            count: self.count,
            cycle_start: self.cycle_start,
        }
    }
}

//! # voicematch-types
//!
//! Shared domain types used across the VoiceMatch workspace: user profiles
//! and subscription tiers, per-cycle action quotas, report penalties and
//! voice-message engagement counters.
//!
//! All timestamps are Unix epoch milliseconds (`u64`).

pub mod engagement;
pub mod penalty;
pub mod profile;
pub mod quota;

pub use engagement::{EngagementCounter, VoiceMessage};
pub use penalty::{PenaltyState, Report};
pub use profile::{ParseError, Profile, QuotaKind, Tier};
pub use quota::{QuotaCycle, UserQuotaState};

/// Common type aliases.
pub type UserId = String;
pub type MessageId = String;
pub type TimestampMs = u64;

/// Milliseconds per hour.
pub const MILLIS_PER_HOUR: u64 = 60 * 60 * 1000;

/// Rolling quota window (12 hours).
pub const CYCLE_WINDOW_MS: u64 = 12 * MILLIS_PER_HOUR;

/// Cumulative report count at which an account is locked automatically.
pub const LOCK_THRESHOLD: u32 = 10;

/// Actions per cycle on the free tier.
pub const FREE_TIER_LIMIT: u32 = 5;

/// Actions per cycle on the Plus tier.
pub const PLUS_TIER_LIMIT: u32 = 50;

/// Actions per cycle on the Premium tier.
pub const PREMIUM_TIER_LIMIT: u32 = 100;

/// A document paired with its optimistic concurrency version.
///
/// Every successful write bumps `version` by one; a writer holding a stale
/// version loses the compare-and-swap and must re-read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }

    /// Map the inner value, keeping the version.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            value: f(self.value),
            version: self.version,
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> TimestampMs {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_window_is_twelve_hours() {
        assert_eq!(CYCLE_WINDOW_MS, 43_200_000);
    }

    #[test]
    fn test_versioned_map_keeps_version() {
        let v = Versioned::new(41u64, 7).map(|n| n + 1);
        assert_eq!(v.value, 42);
        assert_eq!(v.version, 7);
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}

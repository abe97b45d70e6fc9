//! Rolling cycle clock.
//!
//! A cycle starts at the first admitted action and stays open for the
//! window duration. Expiry is evaluated lazily on the next access; there is
//! no timer.
//!
//! ## Boundary
//!
//! ```text
//! expired  <=>  cycle_start is None  ||  now - cycle_start > window
//! ```
//!
//! The comparison is strict: a reading taken exactly `window` after the
//! start is still inside the cycle.

use voicematch_types::TimestampMs;

/// Whether the window that began at `cycle_start` has elapsed at `now`.
///
/// A `cycle_start` in the future (clock skew) is not expired.
pub fn is_window_expired(cycle_start: Option<TimestampMs>, now: TimestampMs, window_ms: u64) -> bool {
    match cycle_start {
        None => true,
        Some(start) => now.saturating_sub(start) > window_ms,
    }
}

/// First instant at which the window opened at `cycle_start` counts as
/// expired, or `None` for a cycle that never started.
pub fn window_resets_at(cycle_start: Option<TimestampMs>, window_ms: u64) -> Option<TimestampMs> {
    cycle_start.map(|start| start.saturating_add(window_ms).saturating_add(1))
}

//! Listen counter step.
//!
//! The step itself is trivial. What matters is where it runs: inside a
//! read-compute-write transaction that re-reads the latest value on every
//! attempt, so concurrent listens combine instead of overwriting each other.

use voicematch_types::EngagementCounter;

/// `current + 1`, saturating.
pub fn increment(current: u64) -> u64 {
    current.saturating_add(1)
}

/// Apply one listen to a counter.
pub fn record_listen(counter: &EngagementCounter) -> EngagementCounter {
    EngagementCounter {
        listen_count: increment(counter.listen_count),
    }
}

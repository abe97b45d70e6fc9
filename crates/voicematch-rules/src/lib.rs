//! # voicematch-rules
//!
//! Pure business rules for action quotas and trust penalties. Nothing in
//! this crate touches storage or the clock; callers pass `now` in and
//! persist whatever state comes back.
//!
//! ## Modules
//!
//! - [`cycle`] - rolling window expiry
//! - [`quota`] - per-cycle admit/deny and remaining allowance
//! - [`penalty`] - report accumulation and sticky auto-lock
//! - [`counter`] - the "+1" step applied inside a store transaction

pub mod counter;
pub mod cycle;
pub mod penalty;
pub mod quota;

pub use penalty::PenaltyAccumulator;
pub use quota::{QuotaPhase, QuotaTracker};

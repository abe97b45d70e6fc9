//! Engine error types.

use voicematch_types::{QuotaKind, TimestampMs, UserId};

use crate::store::StoreError;

/// Errors returned by engine operations.
///
/// Every failure comes back as a value; the engine never substitutes a
/// default. User-facing wording is the caller's job.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The cycle allowance is used up. Not retryable until `resets_at`.
    #[error("{kind} limit reached, resets at {resets_at}")]
    QuotaExceeded {
        /// Which metered action was denied.
        kind: QuotaKind,
        /// First instant at which the cycle rolls over.
        resets_at: TimestampMs,
    },

    /// The acting account is locked.
    #[error("account '{0}' is locked")]
    AccountLocked(UserId),

    /// Optimistic writes kept losing to concurrent writers.
    #[error("transaction conflict after {attempts} attempt(s), try again")]
    TransactionConflict {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Report or message aimed at oneself or at an unknown user.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The store could not be reached. Propagated as-is, never queued.
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether the caller may simply try the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::TransactionConflict { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            StoreError::AlreadyExists(what) => EngineError::AlreadyExists(what),
            StoreError::Conflict(_) => EngineError::TransactionConflict { attempts: 1 },
            StoreError::InvalidReference(what) => EngineError::InvalidTarget(what),
            StoreError::Unavailable(why) => EngineError::PersistenceUnavailable(why),
        }
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

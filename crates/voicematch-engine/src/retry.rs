//! Bounded optimistic retry.
//!
//! Each attempt re-reads the documents it needs, computes the new state and
//! issues a version-checked swap. A lost swap throws the whole attempt away
//! and starts over after an exponential, jittered backoff. Nothing is
//! written by a failed attempt, so dropping the future between attempts
//! leaves the store untouched.

use std::time::Duration;

use crate::error::{EngineError, Result};

/// Retry bounds for conflicted writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always >= 1.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound on any single backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Retry immediately, up to `max_attempts` in total.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Upper bound of the backoff after the given (0-indexed) failed attempt.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Jittered backoff in `[ceiling / 2, ceiling]`.
    fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        ceiling.mul_f64(0.5 + rand::random::<f64>() / 2.0)
    }
}

/// Run `attempt` until it stops reporting a transaction conflict or the
/// policy's attempt budget is spent.
pub(crate) async fn run_optimistic<T, F>(policy: &RetryPolicy, what: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut tries = 0u32;
    loop {
        tries += 1;
        match attempt() {
            Err(EngineError::TransactionConflict { .. }) if tries < policy.max_attempts => {
                let backoff = policy.backoff_for_attempt(tries - 1);
                tracing::debug!(what, attempt = tries, ?backoff, "write conflict, retrying");
                if backoff.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(backoff).await;
                }
            }
            Err(EngineError::TransactionConflict { .. }) => {
                tracing::warn!(what, attempts = tries, "write conflict, retries exhausted");
                return Err(EngineError::TransactionConflict { attempts: tries });
            }
            other => return other,
        }
    }
}

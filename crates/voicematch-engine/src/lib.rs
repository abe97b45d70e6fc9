//! # voicematch-engine
//!
//! Quota & trust-penalty engine for VoiceMatch.
//!
//! An [`Engine`] is built explicitly from an [`EngineConfig`] and a
//! [`DocumentStore`]. Every mutating operation is an optimistic
//! read-compute-swap that is retried on conflict up to the configured bound,
//! and either lands completely or not at all.
//!
//! ## Modules
//!
//! - [`config`] - TOML configuration with defaults
//! - [`store`] - the store seam plus SQLite and in-memory backends
//! - [`retry`] - bounded optimistic retry
//! - [`profiles`] - profile lifecycle and tiers
//! - [`quota`] - admit/deny of approaches and matches
//! - [`penalty`] - report submission and admin overrides
//! - [`engagement`] - voice messages and listen counts

pub mod config;
pub mod engagement;
pub mod error;
pub mod penalty;
pub mod profiles;
pub mod quota;
pub mod retry;
pub mod store;

use voicematch_rules::{PenaltyAccumulator, QuotaTracker};

pub use config::EngineConfig;
pub use engagement::ListenOutcome;
pub use error::{EngineError, Result};
pub use penalty::ReportOutcome;
pub use quota::QuotaStatus;
pub use retry::RetryPolicy;
pub use store::{DocumentStore, MemoryStore, SqliteStore, StoreError};

/// The rule engine bound to one store.
pub struct Engine<S> {
    store: S,
    config: EngineConfig,
    tracker: QuotaTracker,
    penalties: PenaltyAccumulator,
    retry: RetryPolicy,
}

impl<S: DocumentStore> Engine<S> {
    /// Build an engine, validating the configuration first.
    pub fn new(config: EngineConfig, store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracker: config.quota.tracker(),
            penalties: config.penalty.accumulator(),
            retry: config.retry.policy(),
            store,
            config,
        })
    }

    /// Replace the retry policy derived from the configuration.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Result<Self> {
        if retry.max_attempts == 0 {
            return Err(EngineError::Config("retry.max_attempts must be > 0".into()));
        }
        self.retry = retry;
        Ok(self)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

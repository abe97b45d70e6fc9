//! Document store seam.
//!
//! The engine only needs single-document reads and versioned
//! compare-and-swap writes. Anything that offers those (a serializable
//! remote store, SQLite, an in-process map) can back it.
//!
//! ## Implementations
//!
//! - [`sqlite::SqliteStore`] - on-disk or in-memory SQLite via `voicematch-db`
//! - [`memory::MemoryStore`] - in-process maps with conflict and outage injection

pub mod memory;
pub mod sqlite;

use voicematch_types::{
    PenaltyState, Profile, QuotaCycle, QuotaKind, Report, Tier, UserId, Versioned, VoiceMessage,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Store-level failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The expected version was stale, or the write lock could not be had.
    #[error("version conflict on {0}")]
    Conflict(String),

    /// A write referenced a document that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Versioned document storage for profiles, quotas, penalties and messages.
///
/// Every `swap_*` method writes only if the stored version still equals
/// `expected_version`, bumps the version, and returns the new one. A stale
/// version yields [`StoreError::Conflict`] with nothing written.
pub trait DocumentStore: Send + Sync {
    /// Insert a profile together with fresh quota and penalty documents.
    fn insert_profile(&self, profile: &Profile) -> StoreResult<()>;
    fn load_profile(&self, user_id: &str) -> StoreResult<Profile>;
    fn set_tier(&self, user_id: &str, tier: Tier) -> StoreResult<()>;
    /// Delete a profile and every document it owns.
    fn delete_profile(&self, user_id: &str) -> StoreResult<()>;

    fn load_quota(&self, user_id: &str, kind: QuotaKind) -> StoreResult<Versioned<QuotaCycle>>;
    /// Swap a quota document, gated on the owner's penalty document: the
    /// write only lands if the penalty version is still `penalty_version`
    /// and the account is unlocked, checked in the same atomic write.
    fn swap_quota(
        &self,
        user_id: &str,
        kind: QuotaKind,
        expected_version: u64,
        penalty_version: u64,
        next: &QuotaCycle,
    ) -> StoreResult<u64>;

    fn load_penalty(&self, user_id: &str) -> StoreResult<Versioned<PenaltyState>>;
    /// Swap the penalty document. When `report` is given it is recorded in
    /// the same atomic write; if that reporter already reported the target,
    /// [`StoreError::AlreadyExists`] comes back and nothing is written.
    fn swap_penalty(
        &self,
        user_id: &str,
        expected_version: u64,
        next: &PenaltyState,
        report: Option<&Report>,
    ) -> StoreResult<u64>;
    fn has_report(&self, reporter_id: &str, target_id: &str) -> StoreResult<bool>;
    /// Reports against a user, newest first.
    fn list_reports(&self, target_id: &str) -> StoreResult<Vec<Report>>;
    /// Locked accounts, most-reported first.
    fn list_locked(&self) -> StoreResult<Vec<(UserId, PenaltyState)>>;

    fn insert_message(&self, message: &VoiceMessage) -> StoreResult<()>;
    fn load_message(&self, message_id: &str) -> StoreResult<Versioned<VoiceMessage>>;
    fn swap_listen_count(
        &self,
        message_id: &str,
        expected_version: u64,
        listen_count: u64,
    ) -> StoreResult<u64>;
}

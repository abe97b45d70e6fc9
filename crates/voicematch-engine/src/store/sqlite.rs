//! SQLite-backed [`DocumentStore`].
//!
//! Each store owns one connection behind a mutex. Several stores (or
//! processes) may open the same database file; every write runs in an
//! IMMEDIATE transaction with a version check, so SQLite serialises them
//! and a stale writer sees a conflict instead of overwriting.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use voicematch_db::queries::{messages, penalty, profiles, quota, reports};
use voicematch_db::DbError;
use voicematch_types::{
    PenaltyState, Profile, QuotaCycle, QuotaKind, Report, Tier, UserId, Versioned, VoiceMessage,
};

use super::{DocumentStore, StoreError, StoreResult};

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        if err.is_busy() {
            return StoreError::Conflict(err.to_string());
        }
        match err {
            DbError::NotFound(what) => StoreError::NotFound(what),
            DbError::AlreadyExists(what) => StoreError::AlreadyExists(what),
            DbError::Conflict(what) => StoreError::Conflict(what),
            DbError::Constraint(what) => StoreError::InvalidReference(what),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// A [`DocumentStore`] over a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and migrate) the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self::from_connection(voicematch_db::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(voicematch_db::open_memory()?))
    }

    /// Wrap an already-configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> voicematch_db::Result<T>,
    ) -> StoreResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".into()))?;
        Ok(f(&mut conn)?)
    }

    fn write<T>(&self, f: impl FnOnce(&Connection) -> voicematch_db::Result<T>) -> StoreResult<T> {
        self.with_conn(|conn| voicematch_db::with_immediate(conn, f))
    }
}

impl DocumentStore for SqliteStore {
    fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.write(|tx| profiles::insert(tx, &profile.user_id, profile.tier, profile.created_at))
    }

    fn load_profile(&self, user_id: &str) -> StoreResult<Profile> {
        self.with_conn(|conn| profiles::get(conn, user_id))
    }

    fn set_tier(&self, user_id: &str, tier: Tier) -> StoreResult<()> {
        self.write(|tx| profiles::set_tier(tx, user_id, tier))
    }

    fn delete_profile(&self, user_id: &str) -> StoreResult<()> {
        self.write(|tx| profiles::delete(tx, user_id))
    }

    fn load_quota(&self, user_id: &str, kind: QuotaKind) -> StoreResult<Versioned<QuotaCycle>> {
        self.with_conn(|conn| quota::get(conn, user_id, kind))
    }

    fn swap_quota(
        &self,
        user_id: &str,
        kind: QuotaKind,
        expected_version: u64,
        penalty_version: u64,
        next: &QuotaCycle,
    ) -> StoreResult<u64> {
        self.write(|tx| {
            let gate = penalty::get(tx, user_id)?;
            if gate.version != penalty_version || gate.value.is_account_locked {
                return Err(DbError::Conflict(format!("penalty for '{user_id}'")));
            }
            quota::compare_and_swap(tx, user_id, kind, expected_version, next)
        })
    }

    fn load_penalty(&self, user_id: &str) -> StoreResult<Versioned<PenaltyState>> {
        self.with_conn(|conn| penalty::get(conn, user_id))
    }

    fn swap_penalty(
        &self,
        user_id: &str,
        expected_version: u64,
        next: &PenaltyState,
        report: Option<&Report>,
    ) -> StoreResult<u64> {
        self.write(|tx| {
            if let Some(report) = report {
                reports::insert(tx, report)?;
            }
            penalty::compare_and_swap(tx, user_id, expected_version, next)
        })
    }

    fn has_report(&self, reporter_id: &str, target_id: &str) -> StoreResult<bool> {
        self.with_conn(|conn| reports::exists(conn, reporter_id, target_id))
    }

    fn list_reports(&self, target_id: &str) -> StoreResult<Vec<Report>> {
        self.with_conn(|conn| reports::list_for_target(conn, target_id))
    }

    fn list_locked(&self) -> StoreResult<Vec<(UserId, PenaltyState)>> {
        self.with_conn(|conn| penalty::list_locked(conn))
    }

    fn insert_message(&self, message: &VoiceMessage) -> StoreResult<()> {
        self.write(|tx| {
            messages::insert(
                tx,
                &message.message_id,
                &message.author_id,
                &message.recipient_id,
                message.created_at,
            )
        })
    }

    fn load_message(&self, message_id: &str) -> StoreResult<Versioned<VoiceMessage>> {
        self.with_conn(|conn| messages::get(conn, message_id))
    }

    fn swap_listen_count(
        &self,
        message_id: &str,
        expected_version: u64,
        listen_count: u64,
    ) -> StoreResult<u64> {
        self.write(|tx| messages::compare_and_swap_listens(tx, message_id, expected_version, listen_count))
    }
}

//! # voicematch-db
//!
//! SQLite persistence for the VoiceMatch engine.
//!
//! ## Schema
//!
//! - WAL mode mandatory
//! - Foreign keys enforced; deleting a profile cascades to its documents
//! - All timestamps are Unix epoch milliseconds
//! - Every mutable document carries a `version` column for optimistic
//!   compare-and-swap
//! - Schema version stored in `PRAGMA user_version`

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// How long a writer waits on another connection's lock before giving up.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("version conflict on {0}")]
    Conflict(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    /// Another connection held the write lock past the busy timeout.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }

    /// Map a failed INSERT into `AlreadyExists` / `Constraint` where it applies.
    pub(crate) fn from_insert(err: rusqlite::Error, what: impl Into<String>) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            if e.code == ErrorCode::ConstraintViolation {
                let what = what.into();
                return match e.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => DbError::AlreadyExists(what),
                    _ => DbError::Constraint(format!("{what}: {err}")),
                };
            }
        }
        DbError::Sqlite(err)
    }

    /// Map `QueryReturnedNoRows` into `NotFound`.
    pub(crate) fn from_lookup(err: rusqlite::Error, what: impl Into<String>) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(what.into()),
            other => DbError::Sqlite(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the VoiceMatch database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;"
    ))?;
    Ok(())
}

/// Run `f` inside an IMMEDIATE transaction.
///
/// The write lock is taken up front, so concurrent writers on other
/// connections queue on the busy timeout instead of failing mid-way.
/// Any error rolls the whole transaction back.
pub fn with_immediate<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

//! Quota document query functions.

use rusqlite::Connection;
use voicematch_types::{QuotaCycle, QuotaKind, Versioned};

use crate::{DbError, Result};

/// Get the quota document for one user and action kind.
pub fn get(conn: &Connection, user_id: &str, kind: QuotaKind) -> Result<Versioned<QuotaCycle>> {
    conn.query_row(
        "SELECT count, cycle_start, version FROM quota_state WHERE user_id = ?1 AND kind = ?2",
        rusqlite::params![user_id, kind.as_str()],
        |row| {
            Ok(Versioned::new(
                QuotaCycle {
                    count: row.get::<_, i64>(0)? as u32,
                    cycle_start: row.get::<_, Option<i64>>(1)?.map(|t| t as u64),
                },
                row.get::<_, i64>(2)? as u64,
            ))
        },
    )
    .map_err(|e| DbError::from_lookup(e, format!("{kind} quota for '{user_id}'")))
}

/// Write `next` if the stored version still equals `expected_version`.
///
/// Returns the new version. A stale `expected_version` yields
/// [`DbError::Conflict`] and leaves the row untouched.
pub fn compare_and_swap(
    conn: &Connection,
    user_id: &str,
    kind: QuotaKind,
    expected_version: u64,
    next: &QuotaCycle,
) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE quota_state SET count = ?1, cycle_start = ?2, version = version + 1
         WHERE user_id = ?3 AND kind = ?4 AND version = ?5",
        rusqlite::params![
            next.count as i64,
            next.cycle_start.map(|t| t as i64),
            user_id,
            kind.as_str(),
            expected_version as i64,
        ],
    )?;
    if updated == 0 {
        return Err(DbError::Conflict(format!("{kind} quota for '{user_id}'")));
    }
    Ok(expected_version + 1)
}

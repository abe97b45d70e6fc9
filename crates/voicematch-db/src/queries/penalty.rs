//! Penalty document query functions.

use rusqlite::Connection;
use voicematch_types::{PenaltyState, Versioned};

use crate::{DbError, Result};

/// Get the penalty document for a user.
pub fn get(conn: &Connection, user_id: &str) -> Result<Versioned<PenaltyState>> {
    conn.query_row(
        "SELECT report_count, is_account_locked, version FROM penalty_state WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(Versioned::new(
                PenaltyState {
                    report_count: row.get::<_, i64>(0)? as u32,
                    is_account_locked: row.get::<_, bool>(1)?,
                },
                row.get::<_, i64>(2)? as u64,
            ))
        },
    )
    .map_err(|e| DbError::from_lookup(e, format!("penalty for '{user_id}'")))
}

/// Write `next` if the stored version still equals `expected_version`.
pub fn compare_and_swap(
    conn: &Connection,
    user_id: &str,
    expected_version: u64,
    next: &PenaltyState,
) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE penalty_state SET report_count = ?1, is_account_locked = ?2, version = version + 1
         WHERE user_id = ?3 AND version = ?4",
        rusqlite::params![
            next.report_count as i64,
            next.is_account_locked,
            user_id,
            expected_version as i64,
        ],
    )?;
    if updated == 0 {
        return Err(DbError::Conflict(format!("penalty for '{user_id}'")));
    }
    Ok(expected_version + 1)
}

/// List locked accounts, most-reported first.
pub fn list_locked(conn: &Connection) -> Result<Vec<(String, PenaltyState)>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, report_count FROM penalty_state
         WHERE is_account_locked = 1 ORDER BY report_count DESC, user_id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                PenaltyState {
                    report_count: row.get::<_, i64>(1)? as u32,
                    is_account_locked: true,
                },
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

//! Report log query functions.
//!
//! One row per (reporter, target). A second report by the same reporter is
//! rejected with [`DbError::AlreadyExists`].

use rusqlite::Connection;
use voicematch_types::Report;

use crate::{DbError, Result};

/// Record a report.
pub fn insert(conn: &Connection, report: &Report) -> Result<()> {
    conn.execute(
        "INSERT INTO reports (reporter_id, target_id, reason, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            report.reporter_id,
            report.target_id,
            report.reason,
            report.created_at as i64,
        ],
    )
    .map_err(|e| {
        DbError::from_insert(
            e,
            format!("report by '{}' against '{}'", report.reporter_id, report.target_id),
        )
    })?;
    Ok(())
}

/// Whether `reporter_id` has already reported `target_id`.
pub fn exists(conn: &Connection, reporter_id: &str, target_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reports WHERE reporter_id = ?1 AND target_id = ?2",
        [reporter_id, target_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Reports filed against a user, newest first.
pub fn list_for_target(conn: &Connection, target_id: &str) -> Result<Vec<Report>> {
    let mut stmt = conn.prepare(
        "SELECT reporter_id, target_id, reason, created_at
         FROM reports WHERE target_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt
        .query_map([target_id], |row| {
            Ok(Report {
                reporter_id: row.get(0)?,
                target_id: row.get(1)?,
                reason: row.get(2)?,
                created_at: row.get::<_, i64>(3)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

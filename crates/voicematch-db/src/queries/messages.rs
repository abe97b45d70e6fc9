//! Voice message query functions.

use rusqlite::Connection;
use voicematch_types::{Versioned, VoiceMessage};

use crate::{DbError, Result};

/// Insert a new message with a zero listen count.
pub fn insert(
    conn: &Connection,
    message_id: &str,
    author_id: &str,
    recipient_id: &str,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO voice_messages (message_id, author_id, recipient_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![message_id, author_id, recipient_id, created_at as i64],
    )
    .map_err(|e| DbError::from_insert(e, format!("message '{message_id}'")))?;
    Ok(())
}

/// Get a message by ID.
pub fn get(conn: &Connection, message_id: &str) -> Result<Versioned<VoiceMessage>> {
    conn.query_row(
        "SELECT author_id, recipient_id, created_at, listen_count, version
         FROM voice_messages WHERE message_id = ?1",
        [message_id],
        |row| {
            Ok(Versioned::new(
                VoiceMessage {
                    message_id: message_id.to_string(),
                    author_id: row.get(0)?,
                    recipient_id: row.get(1)?,
                    created_at: row.get::<_, i64>(2)? as u64,
                    listen_count: row.get::<_, i64>(3)? as u64,
                },
                row.get::<_, i64>(4)? as u64,
            ))
        },
    )
    .map_err(|e| DbError::from_lookup(e, format!("message '{message_id}'")))
}

/// Write a new listen count if the stored version still equals
/// `expected_version`.
pub fn compare_and_swap_listens(
    conn: &Connection,
    message_id: &str,
    expected_version: u64,
    listen_count: u64,
) -> Result<u64> {
    let updated = conn.execute(
        "UPDATE voice_messages SET listen_count = ?1, version = version + 1
         WHERE message_id = ?2 AND version = ?3",
        rusqlite::params![listen_count as i64, message_id, expected_version as i64],
    )?;
    if updated == 0 {
        return Err(DbError::Conflict(format!("message '{message_id}'")));
    }
    Ok(expected_version + 1)
}

//! Profile query functions.
//!
//! Creating a profile also creates its quota and penalty documents; callers
//! that need the three inserts to land together run this inside
//! [`crate::with_immediate`].

use rusqlite::Connection;
use voicematch_types::{Profile, QuotaKind, Tier};

use crate::{DbError, Result};

/// Insert a new profile with fresh quota and penalty documents.
pub fn insert(conn: &Connection, user_id: &str, tier: Tier, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, tier, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, tier.as_str(), created_at as i64],
    )
    .map_err(|e| DbError::from_insert(e, format!("profile '{user_id}'")))?;

    for kind in QuotaKind::ALL {
        conn.execute(
            "INSERT INTO quota_state (user_id, kind) VALUES (?1, ?2)",
            rusqlite::params![user_id, kind.as_str()],
        )?;
    }

    conn.execute(
        "INSERT INTO penalty_state (user_id) VALUES (?1)",
        [user_id],
    )?;
    Ok(())
}

/// Get a profile by user ID.
pub fn get(conn: &Connection, user_id: &str) -> Result<Profile> {
    let (tier, created_at): (String, i64) = conn
        .query_row(
            "SELECT tier, created_at FROM profiles WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| DbError::from_lookup(e, format!("profile '{user_id}'")))?;

    Ok(Profile {
        user_id: user_id.to_string(),
        tier: tier
            .parse()
            .map_err(|e: voicematch_types::ParseError| DbError::Serialization(e.to_string()))?,
        created_at: created_at as u64,
    })
}

/// Change a profile's subscription tier.
pub fn set_tier(conn: &Connection, user_id: &str, tier: Tier) -> Result<()> {
    let updated = conn.execute(
        "UPDATE profiles SET tier = ?1 WHERE user_id = ?2",
        rusqlite::params![tier.as_str(), user_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("profile '{user_id}'")));
    }
    Ok(())
}

/// Delete a profile. Quota, penalty, report and message rows cascade.
pub fn delete(conn: &Connection, user_id: &str) -> Result<()> {
    let deleted = conn.execute("DELETE FROM profiles WHERE user_id = ?1", [user_id])?;
    if deleted == 0 {
        return Err(DbError::NotFound(format!("profile '{user_id}'")));
    }
    Ok(())
}

//! SQL schema definitions.

/// Complete schema for the VoiceMatch v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Profiles
-- ============================================================

CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    tier TEXT NOT NULL DEFAULT 'free',
    created_at INTEGER NOT NULL
);

-- ============================================================
-- Quotas (one row per user per metered action)
-- ============================================================

CREATE TABLE IF NOT EXISTS quota_state (
    user_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 0,
    cycle_start INTEGER,
    version INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, kind)
);

-- ============================================================
-- Trust penalties
-- ============================================================

CREATE TABLE IF NOT EXISTS penalty_state (
    user_id TEXT PRIMARY KEY REFERENCES profiles(user_id) ON DELETE CASCADE,
    report_count INTEGER NOT NULL DEFAULT 0,
    is_account_locked INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reports (
    reporter_id TEXT NOT NULL,
    target_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    reason TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (reporter_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_reports_target ON reports(target_id);

-- ============================================================
-- Voice messages & engagement
-- ============================================================

CREATE TABLE IF NOT EXISTS voice_messages (
    message_id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    recipient_id TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    listen_count INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_recipient ON voice_messages(recipient_id);
"#;

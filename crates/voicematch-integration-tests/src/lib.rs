//! Integration tests for the VoiceMatch quota & penalty engine.
//!
//! The scenarios under `tests/` drive the engine end to end against real
//! SQLite files, including several connections writing the same database.
//! This library only holds the fixtures they share.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p voicematch-integration-tests
//! ```

use std::path::Path;

use voicematch_engine::{Engine, EngineConfig, RetryPolicy, SqliteStore};
use voicematch_types::{Tier, TimestampMs};

/// Fixed instant the scenarios start from.
pub const T0: TimestampMs = 1_700_000_000_000;

/// Engine over its own connection to the database file at `path`.
pub fn sqlite_engine(path: &Path, retry: RetryPolicy) -> Engine<SqliteStore> {
    let store = SqliteStore::open(path).expect("open database");
    Engine::new(EngineConfig::default(), store)
        .expect("default config is valid")
        .with_retry_policy(retry)
        .expect("retry policy")
}

/// Create each user at `T0` with the given tier.
pub async fn seed_users(engine: &Engine<SqliteStore>, users: &[(&str, Tier)]) {
    for (user, tier) in users {
        engine
            .create_profile(user, *tier, T0)
            .await
            .expect("create profile");
    }
}

//! Integration test: quota cycles against an on-disk database.
//!
//! 1. A free-tier user spends the allowance, is denied, and is admitted
//!    again only strictly after the window has elapsed
//! 2. Quota state survives closing and reopening the database
//! 3. Concurrent admits from several connections never overshoot the limit

use std::sync::Arc;

use voicematch_engine::{EngineError, RetryPolicy};
use voicematch_integration_tests::{seed_users, sqlite_engine, T0};
use voicematch_rules::QuotaPhase;
use voicematch_types::{QuotaKind, Tier, CYCLE_WINDOW_MS, FREE_TIER_LIMIT};

#[tokio::test]
async fn free_tier_cycle_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = sqlite_engine(&dir.path().join("voicematch.db"), RetryPolicy::default());
    seed_users(&engine, &[("alice", Tier::Free)]).await;

    // Step 1: spend the allowance over the first hour.
    for i in 0..u64::from(FREE_TIER_LIMIT) {
        let status = engine
            .try_admit("alice", QuotaKind::Approach, T0 + i * 60_000)
            .await
            .expect("within allowance");
        assert_eq!(u64::from(status.count), i + 1);
    }

    // Step 2: the sixth approach is denied with the rollover instant.
    let denied = engine
        .try_admit("alice", QuotaKind::Approach, T0 + 3_600_000)
        .await
        .expect_err("allowance spent");
    assert!(matches!(
        denied,
        EngineError::QuotaExceeded { kind: QuotaKind::Approach, resets_at }
            if resets_at == T0 + CYCLE_WINDOW_MS + 1
    ));

    // Step 3: exactly at the window boundary the cycle is still running.
    let at_boundary = engine
        .quota_status("alice", QuotaKind::Approach, T0 + CYCLE_WINDOW_MS)
        .await
        .expect("status");
    assert_eq!(at_boundary.phase, QuotaPhase::AtLimit);
    assert!(engine
        .try_admit("alice", QuotaKind::Approach, T0 + CYCLE_WINDOW_MS)
        .await
        .is_err());

    // Step 4: one millisecond later a new cycle starts at count 1.
    let reset = engine
        .try_admit("alice", QuotaKind::Approach, T0 + CYCLE_WINDOW_MS + 1)
        .await
        .expect("new cycle");
    assert_eq!(reset.count, 1);
    assert_eq!(reset.remaining, FREE_TIER_LIMIT - 1);
    assert_eq!(reset.resets_at, Some(T0 + 2 * CYCLE_WINDOW_MS + 2));

    // The match quota was never touched.
    let matches = engine
        .quota_status("alice", QuotaKind::Match, T0 + CYCLE_WINDOW_MS + 1)
        .await
        .expect("status");
    assert_eq!(matches.phase, QuotaPhase::FreshCycle);
}

#[tokio::test]
async fn quota_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("voicematch.db");
    {
        let engine = sqlite_engine(&path, RetryPolicy::default());
        seed_users(&engine, &[("bob", Tier::Free)]).await;
        for _ in 0..3 {
            engine
                .try_admit("bob", QuotaKind::Match, T0)
                .await
                .expect("admit");
        }
    }

    let engine = sqlite_engine(&path, RetryPolicy::default());
    let status = engine
        .quota_status("bob", QuotaKind::Match, T0 + 1)
        .await
        .expect("status");
    assert_eq!(status.count, 3);
    assert_eq!(status.remaining, 2);
    assert_eq!(status.phase, QuotaPhase::WithinLimit);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admits_never_overshoot() {
    const CALLERS: u32 = 12;
    const CONNECTIONS: usize = 4;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("voicematch.db");
    // Each lost swap means another caller's swap landed.
    let retry = RetryPolicy::immediate(CALLERS + 1);
    let engines: Vec<_> = (0..CONNECTIONS)
        .map(|_| Arc::new(sqlite_engine(&path, retry.clone())))
        .collect();
    seed_users(&engines[0], &[("carol", Tier::Free)]).await;

    let mut handles = Vec::new();
    for i in 0..CALLERS {
        let engine = Arc::clone(&engines[i as usize % CONNECTIONS]);
        handles.push(tokio::spawn(async move {
            engine.try_admit("carol", QuotaKind::Approach, T0).await
        }));
    }

    let mut admitted = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(_) => admitted += 1,
            Err(EngineError::QuotaExceeded { .. }) => denied += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(admitted, FREE_TIER_LIMIT);
    assert_eq!(denied, CALLERS - FREE_TIER_LIMIT);

    let status = engines[1]
        .quota_status("carol", QuotaKind::Approach, T0)
        .await
        .expect("status");
    assert_eq!(status.count, FREE_TIER_LIMIT);
}

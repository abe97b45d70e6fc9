//! Admitting approaches and matches against the per-cycle quota.
//!
//! A locked account is refused before its quota is even read. The quota
//! swap is gated on the penalty version that was checked, so a lock landing
//! mid-admit turns into a conflict and the retry sees the lock. A denied
//! admit writes nothing, so the document version only moves on success.

use serde::{Deserialize, Serialize};
use voicematch_rules::QuotaPhase;
use voicematch_types::{QuotaKind, TimestampMs, UserQuotaState, Versioned};

use crate::error::{EngineError, Result};
use crate::retry::run_optimistic;
use crate::store::DocumentStore;
use crate::Engine;

/// Quota snapshot for one user and action kind at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub kind: QuotaKind,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub phase: QuotaPhase,
    /// When the running cycle rolls over; `None` when no cycle is running.
    pub resets_at: Option<TimestampMs>,
}

impl<S: DocumentStore> Engine<S> {
    /// Current quota document with the owner's tier limit applied.
    fn load_quota_state(&self, user_id: &str, kind: QuotaKind) -> Result<Versioned<UserQuotaState>> {
        let profile = self.store.load_profile(user_id)?;
        let limit = self.config.quota.limit_for(profile.tier);
        Ok(self
            .store
            .load_quota(user_id, kind)?
            .map(|cycle| UserQuotaState::from_cycle(cycle, limit)))
    }

    fn quota_snapshot(&self, kind: QuotaKind, state: &UserQuotaState, now: TimestampMs) -> QuotaStatus {
        QuotaStatus {
            kind,
            count: state.count,
            limit: state.limit,
            remaining: self.tracker.remaining(state, now),
            phase: self.tracker.phase(state, now),
            resets_at: self.tracker.resets_at(state, now),
        }
    }

    /// Report a user's quota without changing it.
    pub async fn quota_status(&self, user_id: &str, kind: QuotaKind, now: TimestampMs) -> Result<QuotaStatus> {
        let doc = self.load_quota_state(user_id, kind)?;
        Ok(self.quota_snapshot(kind, &doc.value, now))
    }

    /// Whether `try_admit` would currently succeed.
    pub async fn can_admit(&self, user_id: &str, kind: QuotaKind, now: TimestampMs) -> Result<bool> {
        if self.store.load_penalty(user_id)?.value.is_account_locked {
            return Ok(false);
        }
        let doc = self.load_quota_state(user_id, kind)?;
        Ok(self.tracker.can_admit(&doc.value, now))
    }

    /// Gate and record one action.
    ///
    /// Fails with [`EngineError::AccountLocked`] for locked users and with
    /// [`EngineError::QuotaExceeded`] once the cycle allowance is used up.
    /// Returns the quota status after the action.
    pub async fn try_admit(&self, user_id: &str, kind: QuotaKind, now: TimestampMs) -> Result<QuotaStatus> {
        run_optimistic(&self.retry, "admit", || {
            let penalty = self.store.load_penalty(user_id)?;
            if penalty.value.is_account_locked {
                return Err(EngineError::AccountLocked(user_id.to_string()));
            }

            let doc = self.load_quota_state(user_id, kind)?;
            if !self.tracker.can_admit(&doc.value, now) {
                return Err(EngineError::QuotaExceeded {
                    kind,
                    resets_at: self.tracker.resets_at(&doc.value, now).unwrap_or(now),
                });
            }

            let next = self.tracker.admit(&doc.value, now);
            self.store
                .swap_quota(user_id, kind, doc.version, penalty.version, &next.cycle())?;
            if next.cycle_start != doc.value.cycle_start {
                tracing::debug!(user_id, %kind, now, "quota cycle started");
            }
            Ok(self.quota_snapshot(kind, &next, now))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::store::StoreResult;
    use crate::{EngineConfig, MemoryStore, RetryPolicy};
    use voicematch_types::{
        PenaltyState, Profile, QuotaCycle, Report, Tier, UserId, VoiceMessage, CYCLE_WINDOW_MS,
        MILLIS_PER_HOUR,
    };

    const NOW: TimestampMs = 1_700_000_000_000;

    async fn engine_with(users: &[(&str, Tier)]) -> Engine<MemoryStore> {
        let engine = Engine::new(EngineConfig::default(), MemoryStore::new())
            .expect("engine")
            .with_retry_policy(RetryPolicy::immediate(5))
            .expect("policy");
        for (user, tier) in users {
            engine.create_profile(user, *tier, 0).await.expect("create");
        }
        engine
    }

    #[tokio::test]
    async fn test_fresh_profile_status() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        let status = engine
            .quota_status("alice", QuotaKind::Approach, NOW)
            .await
            .expect("status");
        assert_eq!(status.count, 0);
        assert_eq!(status.remaining, 5);
        assert_eq!(status.phase, QuotaPhase::FreshCycle);
        assert_eq!(status.resets_at, None);
    }

    #[tokio::test]
    async fn test_free_tier_exhausts_after_five() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        let start = NOW - MILLIS_PER_HOUR;
        for i in 1..=5 {
            let status = engine
                .try_admit("alice", QuotaKind::Approach, start + i)
                .await
                .expect("admit");
            assert_eq!(status.count, i as u32);
        }

        let version_before = engine
            .store()
            .load_quota("alice", QuotaKind::Approach)
            .expect("load")
            .version;
        let err = engine
            .try_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect_err("sixth admit denied");
        assert!(matches!(
            err,
            EngineError::QuotaExceeded { kind: QuotaKind::Approach, resets_at }
                if resets_at == start + 1 + CYCLE_WINDOW_MS + 1
        ));
        let version_after = engine
            .store()
            .load_quota("alice", QuotaKind::Approach)
            .expect("load")
            .version;
        assert_eq!(version_before, version_after, "denied admit must not write");
        assert!(!engine
            .can_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect("can_admit"));
    }

    #[tokio::test]
    async fn test_kinds_do_not_share_allowance() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        for _ in 0..5 {
            engine
                .try_admit("alice", QuotaKind::Approach, NOW)
                .await
                .expect("admit");
        }
        let status = engine
            .try_admit("alice", QuotaKind::Match, NOW)
            .await
            .expect("match quota is separate");
        assert_eq!(status.count, 1);
    }

    #[tokio::test]
    async fn test_rollover_after_window() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        for _ in 0..5 {
            engine
                .try_admit("alice", QuotaKind::Approach, NOW)
                .await
                .expect("admit");
        }
        let later = NOW + CYCLE_WINDOW_MS + 1;
        let status = engine
            .try_admit("alice", QuotaKind::Approach, later)
            .await
            .expect("new cycle");
        assert_eq!(status.count, 1);
        assert_eq!(status.remaining, 4);
        assert_eq!(status.resets_at, Some(later + CYCLE_WINDOW_MS + 1));
    }

    #[tokio::test]
    async fn test_tier_upgrade_applies_mid_cycle() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        for _ in 0..5 {
            engine
                .try_admit("alice", QuotaKind::Approach, NOW)
                .await
                .expect("admit");
        }
        engine.set_tier("alice", Tier::Plus).await.expect("upgrade");
        let status = engine
            .try_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect("plus allowance");
        assert_eq!(status.count, 6);
        assert_eq!(status.limit, 50);
        assert_eq!(status.remaining, 44);
    }

    #[tokio::test]
    async fn test_locked_account_refused() {
        let engine = engine_with(&[("alice", Tier::Premium)]).await;
        engine.admin_set_lock("alice", true).await.expect("lock");
        assert!(matches!(
            engine.try_admit("alice", QuotaKind::Approach, NOW).await,
            Err(EngineError::AccountLocked(_))
        ));
        assert!(!engine
            .can_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect("can_admit"));
    }

    #[tokio::test]
    async fn test_conflicts_below_bound_are_absorbed() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        engine.store().inject_conflicts(4);
        let status = engine
            .try_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect("fifth attempt wins");
        assert_eq!(status.count, 1);
    }

    #[tokio::test]
    async fn test_conflicts_at_bound_surface() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        engine.store().inject_conflicts(5);
        let err = engine
            .try_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect_err("budget spent");
        assert!(matches!(err, EngineError::TransactionConflict { attempts: 5 }));
        assert!(err.is_retryable());

        let doc = engine
            .store()
            .load_quota("alice", QuotaKind::Approach)
            .expect("load");
        assert_eq!(doc.value.count, 0);
        assert_eq!(doc.version, 0);
    }

    #[tokio::test]
    async fn test_store_outage_propagates() {
        let engine = engine_with(&[("alice", Tier::Free)]).await;
        engine.store().set_unavailable(true);
        assert!(matches!(
            engine.try_admit("alice", QuotaKind::Approach, NOW).await,
            Err(EngineError::PersistenceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let engine = engine_with(&[]).await;
        assert!(matches!(
            engine.try_admit("ghost", QuotaKind::Approach, NOW).await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_admit_writes_nothing() {
        let engine = Engine::new(EngineConfig::default(), MemoryStore::new())
            .expect("engine")
            .with_retry_policy(RetryPolicy {
                max_attempts: 5,
                initial_backoff: Duration::from_millis(100),
                max_backoff: Duration::from_secs(1),
            })
            .expect("policy");
        engine.create_profile("alice", Tier::Free, 0).await.expect("create");
        engine.store().inject_conflicts(5);

        // The first attempt conflicts and the call parks in its backoff.
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            engine.try_admit("alice", QuotaKind::Approach, NOW),
        )
        .await;
        assert!(abandoned.is_err(), "admit should still be backing off");

        let doc = engine
            .store()
            .load_quota("alice", QuotaKind::Approach)
            .expect("load");
        assert_eq!(doc, Versioned::new(QuotaCycle::default(), 0));

        engine.store().inject_conflicts(0);
        let status = engine
            .try_admit("alice", QuotaKind::Approach, NOW)
            .await
            .expect("admit");
        assert_eq!(status.count, 1);
    }

    /// Commits an admin lock the first time a quota document is read.
    struct LockDuringQuotaLoad {
        inner: MemoryStore,
        armed: AtomicBool,
    }

    impl DocumentStore for LockDuringQuotaLoad {
        fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
            self.inner.insert_profile(profile)
        }
        fn load_profile(&self, user_id: &str) -> StoreResult<Profile> {
            self.inner.load_profile(user_id)
        }
        fn set_tier(&self, user_id: &str, tier: Tier) -> StoreResult<()> {
            self.inner.set_tier(user_id, tier)
        }
        fn delete_profile(&self, user_id: &str) -> StoreResult<()> {
            self.inner.delete_profile(user_id)
        }
        fn load_quota(&self, user_id: &str, kind: QuotaKind) -> StoreResult<Versioned<QuotaCycle>> {
            if self.armed.swap(false, Ordering::SeqCst) {
                let doc = self.inner.load_penalty(user_id)?;
                let locked = voicematch_rules::penalty::admin_set_lock(&doc.value, true);
                self.inner.swap_penalty(user_id, doc.version, &locked, None)?;
            }
            self.inner.load_quota(user_id, kind)
        }
        fn swap_quota(
            &self,
            user_id: &str,
            kind: QuotaKind,
            expected_version: u64,
            penalty_version: u64,
            next: &QuotaCycle,
        ) -> StoreResult<u64> {
            self.inner
                .swap_quota(user_id, kind, expected_version, penalty_version, next)
        }
        fn load_penalty(&self, user_id: &str) -> StoreResult<Versioned<PenaltyState>> {
            self.inner.load_penalty(user_id)
        }
        fn swap_penalty(
            &self,
            user_id: &str,
            expected_version: u64,
            next: &PenaltyState,
            report: Option<&Report>,
        ) -> StoreResult<u64> {
            self.inner.swap_penalty(user_id, expected_version, next, report)
        }
        fn has_report(&self, reporter_id: &str, target_id: &str) -> StoreResult<bool> {
            self.inner.has_report(reporter_id, target_id)
        }
        fn list_reports(&self, target_id: &str) -> StoreResult<Vec<Report>> {
            self.inner.list_reports(target_id)
        }
        fn list_locked(&self) -> StoreResult<Vec<(UserId, PenaltyState)>> {
            self.inner.list_locked()
        }
        fn insert_message(&self, message: &VoiceMessage) -> StoreResult<()> {
            self.inner.insert_message(message)
        }
        fn load_message(&self, message_id: &str) -> StoreResult<Versioned<VoiceMessage>> {
            self.inner.load_message(message_id)
        }
        fn swap_listen_count(
            &self,
            message_id: &str,
            expected_version: u64,
            listen_count: u64,
        ) -> StoreResult<u64> {
            self.inner
                .swap_listen_count(message_id, expected_version, listen_count)
        }
    }

    #[tokio::test]
    async fn test_lock_landing_mid_admit_is_honoured() {
        let store = LockDuringQuotaLoad {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
        };
        let engine = Engine::new(EngineConfig::default(), store)
            .expect("engine")
            .with_retry_policy(RetryPolicy::immediate(5))
            .expect("policy");
        engine.create_profile("alice", Tier::Free, 0).await.expect("create");
        engine.store().armed.store(true, Ordering::SeqCst);

        assert!(matches!(
            engine.try_admit("alice", QuotaKind::Approach, NOW).await,
            Err(EngineError::AccountLocked(_))
        ));
        let doc = engine
            .store()
            .load_quota("alice", QuotaKind::Approach)
            .expect("load");
        assert_eq!(doc.value.count, 0);
        assert!(matches!(
            engine.store().load_penalty("alice"),
            Ok(Versioned { value: PenaltyState { is_account_locked: true, .. }, .. })
        ));
    }
}

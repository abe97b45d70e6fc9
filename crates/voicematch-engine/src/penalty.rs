//! Report submission and admin overrides.
//!
//! Reports are validated here (no self-reports, target must exist) before
//! the accumulator sees them. Each reporter counts once per target; the
//! report row and the incremented counter are written in the same swap, so
//! a lost race can neither double-count nor drop a report.

use serde::{Deserialize, Serialize};
use voicematch_rules::penalty;
use voicematch_types::{PenaltyState, Report, TimestampMs, UserId};

use crate::error::{EngineError, Result};
use crate::retry::run_optimistic;
use crate::store::{DocumentStore, StoreError};
use crate::Engine;

/// Result of a report submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    /// Target's penalty state after the submission.
    pub penalty: PenaltyState,
    /// False when this reporter had already reported the target.
    pub counted: bool,
    /// True when this report flipped the account lock on.
    pub locked_now: bool,
}

impl ReportOutcome {
    fn duplicate(penalty: PenaltyState) -> Self {
        Self {
            penalty,
            counted: false,
            locked_now: false,
        }
    }
}

impl<S: DocumentStore> Engine<S> {
    /// File a report by `reporter_id` against `target_id`.
    pub async fn submit_report(
        &self,
        reporter_id: &str,
        target_id: &str,
        reason: &str,
        now: TimestampMs,
    ) -> Result<ReportOutcome> {
        if reporter_id == target_id {
            return Err(EngineError::InvalidTarget("users cannot report themselves".into()));
        }
        match self.store.load_profile(target_id) {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(EngineError::InvalidTarget(format!("unknown user '{target_id}'")));
            }
            Err(e) => return Err(e.into()),
        }

        let report = Report {
            reporter_id: reporter_id.to_string(),
            target_id: target_id.to_string(),
            reason: reason.to_string(),
            created_at: now,
        };

        run_optimistic(&self.retry, "report", || {
            let doc = self.store.load_penalty(target_id)?;
            if self.store.has_report(reporter_id, target_id)? {
                return Ok(ReportOutcome::duplicate(doc.value));
            }

            let locked_now = self.penalties.would_lock(&doc.value);
            let next = self.penalties.apply_report(&doc.value);
            match self
                .store
                .swap_penalty(target_id, doc.version, &next, Some(&report))
            {
                Ok(_) => {}
                Err(StoreError::AlreadyExists(_)) => {
                    let current = self.store.load_penalty(target_id)?;
                    return Ok(ReportOutcome::duplicate(current.value));
                }
                Err(e) => return Err(e.into()),
            }

            if locked_now {
                tracing::info!(
                    target_id,
                    report_count = next.report_count,
                    "account locked automatically"
                );
            }
            Ok(ReportOutcome {
                penalty: next,
                counted: true,
                locked_now,
            })
        })
        .await
    }

    pub async fn penalty_status(&self, user_id: &str) -> Result<PenaltyState> {
        Ok(self.store.load_penalty(user_id)?.value)
    }

    /// Reports filed against a user, newest first.
    pub async fn reports_against(&self, user_id: &str) -> Result<Vec<Report>> {
        self.store.load_profile(user_id)?;
        Ok(self.store.list_reports(user_id)?)
    }

    /// Locked accounts, most-reported first.
    pub async fn locked_accounts(&self) -> Result<Vec<(UserId, PenaltyState)>> {
        Ok(self.store.list_locked()?)
    }

    /// Admin override of the lock flag. `report_count` is untouched.
    pub async fn admin_set_lock(&self, user_id: &str, locked: bool) -> Result<PenaltyState> {
        let next = self
            .update_penalty(user_id, "admin_set_lock", |s| penalty::admin_set_lock(s, locked))
            .await?;
        tracing::info!(user_id, locked, "account lock overridden by admin");
        Ok(next)
    }

    /// Admin reset of the report counter. The lock flag is untouched.
    pub async fn admin_reset_reports(&self, user_id: &str) -> Result<PenaltyState> {
        let next = self
            .update_penalty(user_id, "admin_reset_reports", penalty::admin_reset_reports)
            .await?;
        tracing::info!(user_id, "report count reset by admin");
        Ok(next)
    }

    async fn update_penalty(
        &self,
        user_id: &str,
        what: &str,
        f: impl Fn(&PenaltyState) -> PenaltyState,
    ) -> Result<PenaltyState> {
        run_optimistic(&self.retry, what, || {
            let doc = self.store.load_penalty(user_id)?;
            let next = f(&doc.value);
            self.store.swap_penalty(user_id, doc.version, &next, None)?;
            Ok(next)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{EngineConfig, MemoryStore, RetryPolicy};
    use voicematch_types::Tier;

    async fn engine() -> Engine<MemoryStore> {
        let engine = Engine::new(EngineConfig::default(), MemoryStore::new())
            .expect("engine")
            .with_retry_policy(RetryPolicy::immediate(5))
            .expect("policy");
        engine
            .create_profile("target", Tier::Free, 0)
            .await
            .expect("create");
        engine
    }

    async fn report_from(engine: &Engine<MemoryStore>, reporter: &str) -> ReportOutcome {
        engine
            .submit_report(reporter, "target", "spam", 1)
            .await
            .expect("report")
    }

    #[tokio::test]
    async fn test_tenth_distinct_report_locks() {
        let engine = engine().await;
        for i in 1..=9 {
            let outcome = report_from(&engine, &format!("r{i}")).await;
            assert!(outcome.counted);
            assert!(!outcome.penalty.is_account_locked);
        }

        let tenth = report_from(&engine, "r10").await;
        assert!(tenth.locked_now);
        assert_eq!(tenth.penalty.report_count, 10);

        let eleventh = report_from(&engine, "r11").await;
        assert!(!eleventh.locked_now);
        assert!(eleventh.penalty.is_account_locked);
        assert_eq!(eleventh.penalty.report_count, 11);

        let unlocked = engine.admin_set_lock("target", false).await.expect("unlock");
        assert!(!unlocked.is_account_locked);
        assert_eq!(unlocked.report_count, 11);
    }

    #[tokio::test]
    async fn test_repeat_reporter_counts_once() {
        let engine = engine().await;
        assert!(report_from(&engine, "bob").await.counted);
        let again = report_from(&engine, "bob").await;
        assert!(!again.counted);
        assert_eq!(again.penalty.report_count, 1);
        assert_eq!(engine.reports_against("target").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_self_report_rejected() {
        let engine = engine().await;
        assert!(matches!(
            engine.submit_report("target", "target", "x", 1).await,
            Err(EngineError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_target_rejected() {
        let engine = engine().await;
        assert!(matches!(
            engine.submit_report("bob", "ghost", "x", 1).await,
            Err(EngineError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_reports_keeps_lock() {
        let engine = engine().await;
        engine.admin_set_lock("target", true).await.expect("lock");
        report_from(&engine, "bob").await;
        let reset = engine.admin_reset_reports("target").await.expect("reset");
        assert_eq!(reset.report_count, 0);
        assert!(reset.is_account_locked);
        assert_eq!(
            engine.locked_accounts().await.expect("locked"),
            vec![("target".to_string(), reset)]
        );
    }

    #[tokio::test]
    async fn test_conflicted_report_is_not_recorded() {
        let engine = engine().await;
        engine.store().inject_conflicts(5);
        let err = engine
            .submit_report("bob", "target", "spam", 1)
            .await
            .expect_err("budget spent");
        assert!(matches!(err, EngineError::TransactionConflict { .. }));
        assert!(!engine.store().has_report("bob", "target").expect("has_report"));

        // The same reporter can try again once the contention clears.
        assert!(report_from(&engine, "bob").await.counted);
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(ReportOutcome::duplicate(PenaltyState {
            report_count: 3,
            is_account_locked: false,
        }))
        .expect("serialize");
        assert_eq!(json["penalty"]["reportCount"], 3);
        assert_eq!(json["penalty"]["isAccountLocked"], false);
        assert_eq!(json["lockedNow"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_report_writes_nothing() {
        let engine = Engine::new(EngineConfig::default(), MemoryStore::new())
            .expect("engine")
            .with_retry_policy(RetryPolicy {
                max_attempts: 5,
                initial_backoff: Duration::from_millis(100),
                max_backoff: Duration::from_secs(1),
            })
            .expect("policy");
        engine
            .create_profile("target", Tier::Free, 0)
            .await
            .expect("create");
        engine.store().inject_conflicts(5);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            engine.submit_report("bob", "target", "spam", 1),
        )
        .await;
        assert!(abandoned.is_err(), "report should still be backing off");

        let doc = engine.store().load_penalty("target").expect("load");
        assert_eq!(doc.version, 0);
        assert_eq!(doc.value, PenaltyState::default());
        assert!(engine.reports_against("target").await.expect("list").is_empty());
    }
}

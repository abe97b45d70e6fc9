//! Profile lifecycle.
//!
//! A profile owns one quota document per [`QuotaKind`] and one penalty
//! document. They are created with it and deleted with it.
//!
//! [`QuotaKind`]: voicematch_types::QuotaKind

use voicematch_types::{Profile, Tier, TimestampMs};

use crate::error::{EngineError, Result};
use crate::retry::run_optimistic;
use crate::store::DocumentStore;
use crate::Engine;

impl<S: DocumentStore> Engine<S> {
    /// Create a profile with fresh quota and penalty documents.
    pub async fn create_profile(&self, user_id: &str, tier: Tier, now: TimestampMs) -> Result<Profile> {
        if user_id.trim().is_empty() {
            return Err(EngineError::InvalidTarget("empty user id".into()));
        }
        let profile = Profile {
            user_id: user_id.to_string(),
            tier,
            created_at: now,
        };
        run_optimistic(&self.retry, "create_profile", || {
            Ok(self.store.insert_profile(&profile)?)
        })
        .await?;
        tracing::debug!(user_id, %tier, "profile created");
        Ok(profile)
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile> {
        Ok(self.store.load_profile(user_id)?)
    }

    /// Move a user to another tier. The new limit applies to the running
    /// cycle straight away.
    pub async fn set_tier(&self, user_id: &str, tier: Tier) -> Result<Profile> {
        run_optimistic(&self.retry, "set_tier", || Ok(self.store.set_tier(user_id, tier)?)).await?;
        tracing::debug!(user_id, %tier, "tier changed");
        Ok(self.store.load_profile(user_id)?)
    }

    /// Delete a profile and everything it owns.
    pub async fn delete_profile(&self, user_id: &str) -> Result<()> {
        run_optimistic(&self.retry, "delete_profile", || {
            Ok(self.store.delete_profile(user_id)?)
        })
        .await?;
        tracing::debug!(user_id, "profile deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineConfig, MemoryStore, RetryPolicy};
    use voicematch_types::QuotaKind;

    fn engine() -> Engine<MemoryStore> {
        Engine::new(EngineConfig::default(), MemoryStore::new())
            .expect("engine")
            .with_retry_policy(RetryPolicy::immediate(3))
            .expect("policy")
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let engine = engine();
        let created = engine
            .create_profile("alice", Tier::Plus, 1_000)
            .await
            .expect("create");
        assert_eq!(engine.profile("alice").await.expect("get"), created);
    }

    #[tokio::test]
    async fn test_duplicate_profile() {
        let engine = engine();
        engine.create_profile("alice", Tier::Free, 0).await.expect("create");
        assert!(matches!(
            engine.create_profile("alice", Tier::Free, 0).await,
            Err(EngineError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_user_id() {
        assert!(matches!(
            engine().create_profile("  ", Tier::Free, 0).await,
            Err(EngineError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn test_set_tier_and_delete() {
        let engine = engine();
        engine.create_profile("alice", Tier::Free, 0).await.expect("create");
        let updated = engine.set_tier("alice", Tier::Premium).await.expect("tier");
        assert_eq!(updated.tier, Tier::Premium);

        engine.delete_profile("alice").await.expect("delete");
        assert!(matches!(
            engine.quota_status("alice", QuotaKind::Approach, 0).await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine.delete_profile("alice").await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_writes_retry_conflicts() {
        let engine = engine();
        engine.store().inject_conflicts(2);
        engine.create_profile("alice", Tier::Free, 0).await.expect("create");
        engine.store().inject_conflicts(2);
        engine.set_tier("alice", Tier::Plus).await.expect("tier");
        assert_eq!(engine.profile("alice").await.expect("get").tier, Tier::Plus);
    }

    #[tokio::test]
    async fn test_create_gives_up_at_bound() {
        let engine = engine();
        engine.store().inject_conflicts(3);
        assert!(matches!(
            engine.create_profile("alice", Tier::Free, 0).await,
            Err(EngineError::TransactionConflict { attempts: 3 })
        ));
        assert!(matches!(
            engine.profile("alice").await,
            Err(EngineError::NotFound(_))
        ));
    }
}

//! In-process [`DocumentStore`].
//!
//! Loads and swaps take the lock separately, so concurrent callers really do
//! interleave between read and write and lose compare-and-swaps the same
//! way they would against a remote store. Conflicts and outages can also be
//! injected on demand.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use voicematch_types::{
    PenaltyState, Profile, QuotaCycle, QuotaKind, Report, Tier, UserId, Versioned, VoiceMessage,
};

use super::{DocumentStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    profiles: HashMap<UserId, Profile>,
    quotas: HashMap<(UserId, QuotaKind), Versioned<QuotaCycle>>,
    penalties: HashMap<UserId, Versioned<PenaltyState>>,
    /// Keyed by (reporter, target).
    reports: BTreeMap<(UserId, UserId), Report>,
    messages: HashMap<String, Versioned<VoiceMessage>>,
}

/// A [`DocumentStore`] backed by in-process maps.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    injected_conflicts: AtomicU32,
    unavailable: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes fail with a conflict before touching anything.
    pub fn inject_conflicts(&self, n: u32) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Simulate the store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".into()))
    }

    /// Lock for a write, consuming one injected conflict if any are pending.
    fn lock_for_write(&self, what: &str) -> StoreResult<MutexGuard<'_, Inner>> {
        let guard = self.lock()?;
        let injected = self
            .injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Conflict(format!("{what} (injected)")));
        }
        Ok(guard)
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Bump `doc` to `next` if its version matches.
fn swap_versioned<T>(
    doc: &mut Versioned<T>,
    expected_version: u64,
    next: T,
    what: &str,
) -> StoreResult<u64> {
    if doc.version != expected_version {
        return Err(StoreError::Conflict(what.to_string()));
    }
    doc.value = next;
    doc.version += 1;
    Ok(doc.version)
}

impl DocumentStore for MemoryStore {
    fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        let user_id = &profile.user_id;
        let mut inner = self.lock_for_write(&format!("profile '{user_id}'"))?;
        if inner.profiles.contains_key(user_id) {
            return Err(StoreError::AlreadyExists(format!("profile '{user_id}'")));
        }
        inner.profiles.insert(user_id.clone(), profile.clone());
        for kind in QuotaKind::ALL {
            inner
                .quotas
                .insert((user_id.clone(), kind), Versioned::new(QuotaCycle::default(), 0));
        }
        inner
            .penalties
            .insert(user_id.clone(), Versioned::new(PenaltyState::default(), 0));
        self.wrote();
        Ok(())
    }

    fn load_profile(&self, user_id: &str) -> StoreResult<Profile> {
        self.lock()?
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile '{user_id}'")))
    }

    fn set_tier(&self, user_id: &str, tier: Tier) -> StoreResult<()> {
        let mut inner = self.lock_for_write(&format!("profile '{user_id}'"))?;
        let profile = inner
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile '{user_id}'")))?;
        profile.tier = tier;
        self.wrote();
        Ok(())
    }

    fn delete_profile(&self, user_id: &str) -> StoreResult<()> {
        let mut inner = self.lock_for_write(&format!("profile '{user_id}'"))?;
        if inner.profiles.remove(user_id).is_none() {
            return Err(StoreError::NotFound(format!("profile '{user_id}'")));
        }
        inner.quotas.retain(|(owner, _), _| owner != user_id);
        inner.penalties.remove(user_id);
        inner.reports.retain(|(_, target), _| target != user_id);
        inner
            .messages
            .retain(|_, m| m.value.author_id != user_id && m.value.recipient_id != user_id);
        self.wrote();
        Ok(())
    }

    fn load_quota(&self, user_id: &str, kind: QuotaKind) -> StoreResult<Versioned<QuotaCycle>> {
        self.lock()?
            .quotas
            .get(&(user_id.to_string(), kind))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{kind} quota for '{user_id}'")))
    }

    fn swap_quota(
        &self,
        user_id: &str,
        kind: QuotaKind,
        expected_version: u64,
        penalty_version: u64,
        next: &QuotaCycle,
    ) -> StoreResult<u64> {
        let what = format!("{kind} quota for '{user_id}'");
        let mut inner = self.lock_for_write(&what)?;
        let gate = inner
            .penalties
            .get(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("penalty for '{user_id}'")))?;
        if gate.version != penalty_version || gate.value.is_account_locked {
            return Err(StoreError::Conflict(format!("penalty for '{user_id}'")));
        }
        let doc = inner
            .quotas
            .get_mut(&(user_id.to_string(), kind))
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        let version = swap_versioned(doc, expected_version, *next, &what)?;
        self.wrote();
        Ok(version)
    }

    fn load_penalty(&self, user_id: &str) -> StoreResult<Versioned<PenaltyState>> {
        self.lock()?
            .penalties
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("penalty for '{user_id}'")))
    }

    fn swap_penalty(
        &self,
        user_id: &str,
        expected_version: u64,
        next: &PenaltyState,
        report: Option<&Report>,
    ) -> StoreResult<u64> {
        let what = format!("penalty for '{user_id}'");
        let mut inner = self.lock_for_write(&what)?;
        let report_key = report.map(|r| (r.reporter_id.clone(), r.target_id.clone()));
        if let Some(key) = &report_key {
            if inner.reports.contains_key(key) {
                return Err(StoreError::AlreadyExists(format!(
                    "report by '{}' against '{}'",
                    key.0, key.1
                )));
            }
        }

        let doc = inner
            .penalties
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        let version = swap_versioned(doc, expected_version, *next, &what)?;

        if let (Some(key), Some(report)) = (report_key, report) {
            inner.reports.insert(key, report.clone());
        }
        self.wrote();
        Ok(version)
    }

    fn has_report(&self, reporter_id: &str, target_id: &str) -> StoreResult<bool> {
        Ok(self
            .lock()?
            .reports
            .contains_key(&(reporter_id.to_string(), target_id.to_string())))
    }

    fn list_reports(&self, target_id: &str) -> StoreResult<Vec<Report>> {
        let inner = self.lock()?;
        let mut reports: Vec<Report> = inner
            .reports
            .values()
            .filter(|r| r.target_id == target_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    fn list_locked(&self) -> StoreResult<Vec<(UserId, PenaltyState)>> {
        let inner = self.lock()?;
        let mut locked: Vec<(UserId, PenaltyState)> = inner
            .penalties
            .iter()
            .filter(|(_, doc)| doc.value.is_account_locked)
            .map(|(user, doc)| (user.clone(), doc.value))
            .collect();
        locked.sort_by(|a, b| {
            b.1.report_count
                .cmp(&a.1.report_count)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(locked)
    }

    fn insert_message(&self, message: &VoiceMessage) -> StoreResult<()> {
        let mut inner = self.lock_for_write(&format!("message '{}'", message.message_id))?;
        for user in [&message.author_id, &message.recipient_id] {
            if !inner.profiles.contains_key(user) {
                return Err(StoreError::InvalidReference(format!("profile '{user}'")));
            }
        }
        if inner.messages.contains_key(&message.message_id) {
            return Err(StoreError::AlreadyExists(format!(
                "message '{}'",
                message.message_id
            )));
        }
        inner.messages.insert(
            message.message_id.clone(),
            Versioned::new(
                VoiceMessage {
                    listen_count: 0,
                    ..message.clone()
                },
                0,
            ),
        );
        self.wrote();
        Ok(())
    }

    fn load_message(&self, message_id: &str) -> StoreResult<Versioned<VoiceMessage>> {
        self.lock()?
            .messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("message '{message_id}'")))
    }

    fn swap_listen_count(
        &self,
        message_id: &str,
        expected_version: u64,
        listen_count: u64,
    ) -> StoreResult<u64> {
        let what = format!("message '{message_id}'");
        let mut inner = self.lock_for_write(&what)?;
        let doc = inner
            .messages
            .get_mut(message_id)
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        if doc.version != expected_version {
            return Err(StoreError::Conflict(what));
        }
        doc.value.listen_count = listen_count;
        doc.version += 1;
        let version = doc.version;
        self.wrote();
        Ok(version)
    }
}

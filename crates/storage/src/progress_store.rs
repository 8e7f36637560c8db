use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};
use tutor_core::Clock;
use tutor_core::model::{LearnerProgress, ProgressPatch, SyncStatus};

use crate::mapping::ProgressDocument;
use crate::repository::{KeyValueStore, Storage};

pub const PROGRESS_KEY: &str = "learner_progress";
pub const SYNC_STATUS_KEY: &str = "sync_status";
pub const ONBOARDING_KEY: &str = "onboarding_complete";

/// Every key `reset_all` clears.
pub const OWNED_KEYS: [&str; 3] = [PROGRESS_KEY, SYNC_STATUS_KEY, ONBOARDING_KEY];

/// Notification published after every successful mutation.
///
/// Carries no payload; subscribers re-read whatever they display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    Progress,
    SyncStatus,
    Onboarding,
    Reset,
}

/// Owner of the persisted learner record.
///
/// Reads never fail: a missing or corrupt payload yields the default record.
/// Writes merge a `ProgressPatch` into the current record, flag the sync
/// status as pending and notify subscribers. Every store opened over the same
/// `Storage` shares its backend and its notification channel.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
    changes: broadcast::Sender<ProgressChange>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self {
            kv: Arc::clone(&storage.kv),
            clock,
            changes: storage.changes(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Receive a `ProgressChange` for every mutation made through any store
    /// over the same `Storage`.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressChange> {
        self.changes.subscribe()
    }

    /// Current learner record, or the default record for today.
    pub async fn read(&self) -> LearnerProgress {
        let defaults = LearnerProgress::new_default(self.clock.today());
        let Some(raw) = self.load(PROGRESS_KEY).await else {
            return defaults;
        };

        match serde_json::from_str::<ProgressDocument>(&raw) {
            Ok(doc) => doc.into_progress(defaults),
            Err(err) => {
                warn!(error = %err, "stored progress is malformed, using defaults");
                defaults
            }
        }
    }

    /// Merge `patch` into the stored record and persist it.
    ///
    /// Returns the merged record. A backend failure is logged and the merged
    /// record is still returned.
    pub async fn write(&self, patch: ProgressPatch) -> LearnerProgress {
        let next = self.read().await.merged(patch);
        match serde_json::to_string(&ProgressDocument::from_progress(&next)) {
            Ok(json) => {
                if self.save(PROGRESS_KEY, &json).await {
                    self.mark_pending().await;
                    self.publish(ProgressChange::Progress);
                }
            }
            Err(err) => warn!(error = %err, "could not encode progress"),
        }
        next
    }

    pub async fn sync_status(&self) -> SyncStatus {
        let Some(raw) = self.load(SYNC_STATUS_KEY).await else {
            return SyncStatus::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored sync status is malformed, using defaults");
            SyncStatus::default()
        })
    }

    /// Record a completed sync at the current clock time.
    pub async fn mark_synced(&self, is_online: bool) -> SyncStatus {
        let status = SyncStatus::synced_at(self.clock.now(), is_online);
        self.save_sync_status(status).await;
        status
    }

    pub async fn set_online(&self, is_online: bool) -> SyncStatus {
        let status = SyncStatus {
            is_online,
            ..self.sync_status().await
        };
        self.save_sync_status(status).await;
        status
    }

    pub async fn is_onboarding_complete(&self) -> bool {
        self.load(ONBOARDING_KEY).await.as_deref() == Some("true")
    }

    pub async fn complete_onboarding(&self) {
        if self.save(ONBOARDING_KEY, "true").await {
            self.publish(ProgressChange::Onboarding);
        }
    }

    /// Remove every key the store owns.
    pub async fn reset_all(&self) {
        for key in OWNED_KEYS {
            if let Err(err) = self.kv.remove(key).await {
                warn!(key, error = %err, "could not remove key during reset");
            }
        }
        self.publish(ProgressChange::Reset);
    }

    async fn mark_pending(&self) {
        let status = self.sync_status().await.with_pending();
        if let Ok(json) = serde_json::to_string(&status) {
            // The progress write already notified subscribers.
            self.save(SYNC_STATUS_KEY, &json).await;
        }
    }

    async fn save_sync_status(&self, status: SyncStatus) {
        match serde_json::to_string(&status) {
            Ok(json) => {
                if self.save(SYNC_STATUS_KEY, &json).await {
                    self.publish(ProgressChange::SyncStatus);
                }
            }
            Err(err) => warn!(error = %err, "could not encode sync status"),
        }
    }

    async fn load(&self, key: &str) -> Option<String> {
        match self.kv.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "storage read failed, using defaults");
                None
            }
        }
    }

    async fn save(&self, key: &str, value: &str) -> bool {
        match self.kv.set(key, value).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "storage write failed");
                false
            }
        }
    }

    fn publish(&self, change: ProgressChange) {
        // No subscribers is fine.
        if self.changes.send(change).is_err() {
            debug!(?change, "no subscribers for change");
        }
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("clock", &self.clock)
            .field("subscribers", &self.changes.receiver_count())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

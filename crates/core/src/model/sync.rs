use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookkeeping for an eventual remote sync.
///
/// Every progress write flips `pending_changes`; nothing in this workspace
/// talks to a remote, so only `mark_synced` clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_synced: Option<DateTime<Utc>>,
    pub pending_changes: bool,
    pub is_online: bool,
}

impl SyncStatus {
    /// Status for a store that has never synced.
    #[must_use]
    pub fn never_synced(is_online: bool) -> Self {
        Self {
            last_synced: None,
            pending_changes: false,
            is_online,
        }
    }

    #[must_use]
    pub fn with_pending(self) -> Self {
        Self {
            pending_changes: true,
            ..self
        }
    }

    #[must_use]
    pub fn synced_at(at: DateTime<Utc>, is_online: bool) -> Self {
        Self {
            last_synced: Some(at),
            pending_changes: false,
            is_online,
        }
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::never_synced(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn pending_flag_survives_round_trip() {
        let status = SyncStatus::default().with_pending();
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"pendingChanges\":true"));
        let back: SyncStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn synced_clears_pending() {
        let status = SyncStatus::synced_at(fixed_now(), false);
        assert!(!status.pending_changes);
        assert_eq!(status.last_synced, Some(fixed_now()));
        assert!(!status.is_online);
    }
}

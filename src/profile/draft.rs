//! Pending profile drafts captured at sign-up.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transient holder of profile fields captured before the profile record is
/// confirmed to exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingProfileDraft {
    pub first_name: String,
    pub last_name: String,
}

/// Keyed storage for [`PendingProfileDraft`] between sign-up and first
/// reconciliation.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Save the draft captured at sign-up submission.
    async fn put(&self, identity_id: Uuid, draft: PendingProfileDraft);

    /// Read the draft left by a just-completed sign-up, if any.
    async fn read(&self, identity_id: Uuid) -> Option<PendingProfileDraft>;

    /// Remove the draft. Deleting an absent draft is a no-op.
    async fn delete(&self, identity_id: Uuid);
}

/// Process-local [`DraftStore`].
///
/// Drafts do not survive a restart; a lost draft only costs the identity
/// metadata fallback during reconciliation.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<Uuid, PendingProfileDraft>>,
}

impl MemoryDraftStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, PendingProfileDraft>> {
        self.drafts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn put(&self, identity_id: Uuid, draft: PendingProfileDraft) {
        self.lock().insert(identity_id, draft);
    }

    async fn read(&self, identity_id: Uuid) -> Option<PendingProfileDraft> {
        self.lock().get(&identity_id).cloned()
    }

    async fn delete(&self, identity_id: Uuid) {
        self.lock().remove(&identity_id);
    }
}

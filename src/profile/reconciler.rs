//! Fetch-or-create flow guaranteeing a profile record per identity.

use thiserror::Error;

use crate::identity::Identity;
use crate::profile::{
    DraftStore, InsertError, ProfileRecord, ProfileStore, StoreError,
};

/// Reconciliation failures, kept distinct so callers never conflate a store
/// outage with a missing profile.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("profile read failed: {0}")]
    RemoteRead(#[source] StoreError),

    #[error("profile write failed: {0}")]
    RemoteWrite(#[source] StoreError),

    /// Authenticated but no record, no draft, and no usable metadata. The
    /// caller must not fabricate a display name from this.
    #[error("no profile record and no pending draft for this identity")]
    ProfileIncomplete,
}

/// Ensures a [`ProfileRecord`] exists for an authenticated identity.
pub struct Reconciler<'a> {
    profiles: &'a dyn ProfileStore,
    drafts: &'a dyn DraftStore,
}

impl<'a> Reconciler<'a> {
    /// Create a new [`Reconciler`] over injected stores.
    pub fn new(
        profiles: &'a dyn ProfileStore,
        drafts: &'a dyn DraftStore,
    ) -> Self {
        Self { profiles, drafts }
    }

    /// Return the canonical display name for `identity`, creating the
    /// profile record from pending sign-up data if it does not exist yet.
    ///
    /// One read, at most one write, at most one draft deletion. A second
    /// call for the same identity short-circuits on the read.
    pub async fn reconcile(
        &self,
        identity: &Identity,
    ) -> Result<String, ReconcileError> {
        if let Some(record) = self
            .profiles
            .find_by_id(identity.id)
            .await
            .map_err(ReconcileError::RemoteRead)?
        {
            // A stale draft left by an earlier crash is ignored, not reused.
            return Ok(record.display_name());
        }

        let draft = match self.drafts.read(identity.id).await {
            Some(draft) => draft,
            None => identity
                .profile_draft()
                .ok_or(ReconcileError::ProfileIncomplete)?,
        };

        let record = ProfileRecord {
            id: identity.id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: identity.email.clone(),
        };

        match self.profiles.insert(&record).await {
            Ok(()) => {},
            // Another session created the record; its row is canonical.
            Err(InsertError::Conflict) => {
                let existing = self
                    .profiles
                    .find_by_id(identity.id)
                    .await
                    .map_err(ReconcileError::RemoteRead)?
                    .ok_or_else(|| {
                        ReconcileError::RemoteRead(StoreError::Backend(
                            "record missing after uniqueness conflict".into(),
                        ))
                    })?;

                self.drafts.delete(identity.id).await;
                return Ok(existing.display_name());
            },
            Err(InsertError::Store(err)) => {
                return Err(ReconcileError::RemoteWrite(err));
            },
        }

        self.drafts.delete(identity.id).await;
        Ok(record.display_name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::profile::{MemoryDraftStore, PendingProfileDraft};

    /// In-memory [`ProfileStore`] with failure injection and call counters.
    #[derive(Default)]
    struct FakeProfileStore {
        records: Mutex<HashMap<Uuid, ProfileRecord>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl FakeProfileStore {
        fn with_record(record: ProfileRecord) -> Self {
            let store = Self::default();
            store
                .records
                .lock()
                .unwrap()
                .insert(record.id, record);
            store
        }

        fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProfileStore for FakeProfileStore {
        async fn find_by_id(
            &self,
            identity_id: Uuid,
        ) -> Result<Option<ProfileRecord>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("connection reset".into()));
            }

            Ok(self.records.lock().unwrap().get(&identity_id).cloned())
        }

        async fn insert(
            &self,
            record: &ProfileRecord,
        ) -> Result<(), InsertError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(
                    StoreError::Backend("connection reset".into()).into()
                );
            }

            let mut records = self.records.lock().unwrap();
            if records.contains_key(&record.id) {
                return Err(InsertError::Conflict);
            }
            records.insert(record.id, record.clone());
            Ok(())
        }
    }

    fn identity(id: Uuid, email: &str) -> Identity {
        Identity {
            id,
            email: email.into(),
            first_name: None,
            last_name: None,
            password: String::default(),
            created_at: chrono::Utc::now(),
        }
    }

    fn draft(first: &str, last: &str) -> PendingProfileDraft {
        PendingProfileDraft {
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    #[tokio::test]
    async fn test_existing_record_short_circuits() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::with_record(ProfileRecord {
            id,
            first_name: "Bo".into(),
            last_name: "Kim".into(),
            email: "bo@x.com".into(),
        });
        let drafts = MemoryDraftStore::default();

        let name = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "bo@x.com"))
            .await
            .unwrap();

        assert_eq!(name, "Bo Kim");
        assert_eq!(profiles.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_draft_is_ignored_when_record_exists() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::with_record(ProfileRecord {
            id,
            first_name: "Bo".into(),
            last_name: "Kim".into(),
            email: "bo@x.com".into(),
        });
        let drafts = MemoryDraftStore::default();
        drafts.put(id, draft("Stale", "Draft")).await;

        let name = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "bo@x.com"))
            .await
            .unwrap();

        assert_eq!(name, "Bo Kim");
        // The orphaned draft stays behind, ignored.
        assert_eq!(drafts.read(id).await, Some(draft("Stale", "Draft")));
    }

    #[tokio::test]
    async fn test_missing_record_consumes_draft() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        let drafts = MemoryDraftStore::default();
        drafts.put(id, draft("Ann", "Lee")).await;

        let name = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "ann@x.com"))
            .await
            .unwrap();

        assert_eq!(name, "Ann Lee");

        let record = profiles.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.first_name, "Ann");
        assert_eq!(record.last_name, "Lee");
        assert_eq!(record.email, "ann@x.com");

        assert_eq!(drafts.read(id).await, None);
        assert_eq!(profiles.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_record_falls_back_to_identity_metadata() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        let drafts = MemoryDraftStore::default();

        let mut identity = identity(id, "ann@x.com");
        identity.first_name = Some("Ann".into());
        identity.last_name = Some("Lee".into());

        let name = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity)
            .await
            .unwrap();

        assert_eq!(name, "Ann Lee");
        assert_eq!(profiles.record_count(), 1);
    }

    #[tokio::test]
    async fn test_draft_takes_priority_over_metadata() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        let drafts = MemoryDraftStore::default();
        drafts.put(id, draft("Ann", "Lee")).await;

        let mut identity = identity(id, "ann@x.com");
        identity.first_name = Some("Other".into());
        identity.last_name = Some("Name".into());

        let name = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity)
            .await
            .unwrap();

        assert_eq!(name, "Ann Lee");
    }

    #[tokio::test]
    async fn test_no_draft_no_metadata_is_incomplete() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        let drafts = MemoryDraftStore::default();

        let err = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "ann@x.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::ProfileIncomplete));
        assert_eq!(profiles.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_call_performs_only_the_read() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        let drafts = MemoryDraftStore::default();
        drafts.put(id, draft("Ann", "Lee")).await;

        let reconciler = Reconciler::new(&profiles, &drafts);
        let identity = identity(id, "ann@x.com");

        reconciler.reconcile(&identity).await.unwrap();
        let reads_after_first = profiles.reads.load(Ordering::SeqCst);

        let name = reconciler.reconcile(&identity).await.unwrap();

        assert_eq!(name, "Ann Lee");
        assert_eq!(profiles.record_count(), 1);
        assert_eq!(profiles.writes.load(Ordering::SeqCst), 1);
        assert_eq!(
            profiles.reads.load(Ordering::SeqCst),
            reads_after_first + 1
        );
    }

    #[tokio::test]
    async fn test_conflicting_insert_falls_back_to_read() {
        // The store already holds a row from a concurrent session, but this
        // task's first read happened before that row landed.
        struct RacingStore {
            existing: ProfileRecord,
            reads: AtomicUsize,
        }

        #[async_trait]
        impl ProfileStore for RacingStore {
            async fn find_by_id(
                &self,
                _identity_id: Uuid,
            ) -> Result<Option<ProfileRecord>, StoreError> {
                if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(None)
                } else {
                    Ok(Some(self.existing.clone()))
                }
            }

            async fn insert(
                &self,
                _record: &ProfileRecord,
            ) -> Result<(), InsertError> {
                Err(InsertError::Conflict)
            }
        }

        let id = Uuid::new_v4();
        let profiles = RacingStore {
            existing: ProfileRecord {
                id,
                first_name: "Bo".into(),
                last_name: "Kim".into(),
                email: "bo@x.com".into(),
            },
            reads: AtomicUsize::new(0),
        };
        let drafts = MemoryDraftStore::default();
        drafts.put(id, draft("Ann", "Lee")).await;

        let name = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "bo@x.com"))
            .await
            .unwrap();

        // The winner's row is canonical and the stale draft is gone.
        assert_eq!(name, "Bo Kim");
        assert_eq!(drafts.read(id).await, None);
    }

    #[tokio::test]
    async fn test_read_failure_is_remote_read() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        profiles.fail_reads.store(true, Ordering::SeqCst);
        let drafts = MemoryDraftStore::default();

        let err = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "ann@x.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::RemoteRead(_)));
    }

    #[tokio::test]
    async fn test_write_failure_is_remote_write_and_keeps_draft() {
        let id = Uuid::new_v4();
        let profiles = FakeProfileStore::default();
        profiles.fail_writes.store(true, Ordering::SeqCst);
        let drafts = MemoryDraftStore::default();
        drafts.put(id, draft("Ann", "Lee")).await;

        let err = Reconciler::new(&profiles, &drafts)
            .reconcile(&identity(id, "ann@x.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::RemoteWrite(_)));
        // No name was persisted, so the draft must survive for a retry.
        assert_eq!(drafts.read(id).await, Some(draft("Ann", "Lee")));
    }
}

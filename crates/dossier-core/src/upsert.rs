//! Idempotent document upserts
//!
//! The identity key of a document is (content locator, kind, owner). Writing
//! the same key twice updates metadata in place; it never adds a row.

use crate::error::UpsertError;
use dossier_model::{
    ArtifactMetadata, ContentLocator, Document, DocumentKey, DocumentKind, TargetRef,
};
use dossier_store::{DocumentStore, LockRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl UpsertAction {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    /// The stored row after the write
    pub document: Document,
}

/// Find-or-insert under a per-target lock, backed by the store's conditional write
#[derive(Debug)]
pub struct UpsertEngine<S> {
    store: Arc<S>,
    locks: LockRegistry<TargetRef>,
    conflict_retries: u32,
}

impl<S: DocumentStore> UpsertEngine<S> {
    /// Create engine over `store`
    #[must_use]
    pub fn new(store: Arc<S>, conflict_retries: u32) -> Self {
        Self {
            store,
            locks: LockRegistry::new(),
            conflict_retries,
        }
    }

    /// Create or update the document identified by (locator, kind, target)
    ///
    /// # Errors
    /// [`UpsertError::StorageConflict`] when the conditional insert keeps
    /// losing and the winner's row cannot be found; any other store failure.
    #[tracing::instrument(skip(self, locator, metadata), fields(locator = %locator))]
    pub fn upsert(
        &self,
        locator: ContentLocator,
        kind: DocumentKind,
        target: TargetRef,
        metadata: ArtifactMetadata,
    ) -> Result<UpsertOutcome, UpsertError> {
        let key = DocumentKey::new(locator, kind, target);
        let handle = self.locks.handle(&target);
        let _guard = handle.lock();

        let mut attempts = 0;
        loop {
            if let Some(existing) = self.store.find(&key)? {
                let document = self.store.update_metadata(existing.id, &metadata)?;
                return Ok(self.finish(UpsertAction::Updated, document));
            }

            match self.store.insert_unique(Document::new(key.clone(), metadata.clone())) {
                Ok(document) => return Ok(self.finish(UpsertAction::Created, document)),
                Err(err) if err.is_conflict() && attempts < self.conflict_retries => {
                    attempts += 1;
                    tracing::warn!(%key, attempts, "conditional insert lost; retrying as update");
                }
                Err(err) if err.is_conflict() => {
                    metrics::counter!("dossier_storage_conflicts_total").increment(1);
                    return Err(UpsertError::StorageConflict { key: Box::new(key) });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Drop lock entries for targets nobody is writing
    pub fn prune_locks(&self) -> usize {
        self.locks.prune()
    }

    fn finish(&self, action: UpsertAction, document: Document) -> UpsertOutcome {
        metrics::counter!("dossier_documents_total", "action" => action.as_str()).increment(1);
        tracing::debug!(
            document = %document.id,
            kind = %document.kind,
            target = %document.owner,
            %action,
            "document upserted"
        );
        UpsertOutcome { action, document }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_model::{
        CaseHolder, CaseHolderId, DocumentId, HolderRole, IdentityKind, UploaderId,
    };
    use dossier_store::{MemoryStore, StoreError};
    use parking_lot::Mutex;

    fn engine() -> (Arc<MemoryStore>, UpsertEngine<MemoryStore>, CaseHolderId) {
        let store = Arc::new(MemoryStore::new());
        let holder =
            store.insert_holder(CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant));
        let engine = UpsertEngine::new(Arc::clone(&store), 1);
        (store, engine, holder)
    }

    fn locator(raw: &str) -> ContentLocator {
        ContentLocator::new(raw).unwrap()
    }

    #[test]
    fn second_upsert_updates_in_place() {
        let (store, engine, holder) = engine();
        let target = TargetRef::CaseHolder(holder);

        let first = engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                target,
                ArtifactMetadata::new("tax", "application/pdf", 10),
            )
            .unwrap();
        let second = engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                target,
                ArtifactMetadata::new("tax 2024", "application/pdf", 12),
            )
            .unwrap();

        assert_eq!(first.action, UpsertAction::Created);
        assert_eq!(second.action, UpsertAction::Updated);
        assert_eq!(first.document.id, second.document.id);
        assert_eq!(second.document.label, "tax 2024");
        assert_eq!(second.document.size, 12);
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn update_keeps_uploader_when_none_supplied() {
        let (_store, engine, holder) = engine();
        let target = TargetRef::CaseHolder(holder);
        let uploader = UploaderId::new();

        engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                target,
                ArtifactMetadata::new("tax", "application/pdf", 10).with_uploader(uploader),
            )
            .unwrap();
        let updated = engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                target,
                ArtifactMetadata::new("tax", "application/pdf", 10),
            )
            .unwrap();

        assert_eq!(updated.document.uploader, Some(uploader));
    }

    #[test]
    fn different_kind_is_a_different_document() {
        let (store, engine, holder) = engine();
        let target = TargetRef::CaseHolder(holder);
        let meta = ArtifactMetadata::new("scan", "image/png", 1);

        engine
            .upsert(locator("blob://a"), DocumentKind::TaxNotice, target, meta.clone())
            .unwrap();
        let other = engine
            .upsert(locator("blob://a"), DocumentKind::FamilyBooklet, target, meta)
            .unwrap();

        assert_eq!(other.action, UpsertAction::Created);
        assert_eq!(store.document_count(), 2);
    }

    /// Store whose first conditional insert always loses to a hidden writer
    struct RacyStore {
        inner: MemoryStore,
        raced: Mutex<bool>,
        reveal_winner: bool,
    }

    impl DocumentStore for RacyStore {
        fn find(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError> {
            self.inner.find(key)
        }

        fn insert_unique(&self, document: Document) -> Result<Document, StoreError> {
            let mut raced = self.raced.lock();
            if !*raced {
                *raced = true;
                let key = document.key();
                if self.reveal_winner {
                    self.inner.insert_unique(document)?;
                }
                return Err(StoreError::conflict(key));
            }
            self.inner.insert_unique(document)
        }

        fn update_metadata(
            &self,
            id: DocumentId,
            metadata: &ArtifactMetadata,
        ) -> Result<Document, StoreError> {
            self.inner.update_metadata(id, metadata)
        }

        fn documents_for(&self, owner: &TargetRef) -> Result<Vec<Document>, StoreError> {
            self.inner.documents_for(owner)
        }

        fn remove(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
            self.inner.remove(id)
        }

        fn document_count(&self) -> usize {
            self.inner.document_count()
        }
    }

    fn racy(reveal_winner: bool, retries: u32) -> UpsertEngine<RacyStore> {
        UpsertEngine::new(
            Arc::new(RacyStore {
                inner: MemoryStore::new(),
                raced: Mutex::new(false),
                reveal_winner,
            }),
            retries,
        )
    }

    #[test]
    fn lost_insert_is_retried_as_update() {
        let engine = racy(true, 1);
        let outcome = engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                TargetRef::CaseHolder(CaseHolderId::new()),
                ArtifactMetadata::new("tax", "application/pdf", 1),
            )
            .unwrap();
        assert_eq!(outcome.action, UpsertAction::Updated);
        assert_eq!(engine.store.document_count(), 1);
    }

    #[test]
    fn conflict_without_retry_budget_surfaces() {
        let engine = racy(true, 0);
        let err = engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                TargetRef::CaseHolder(CaseHolderId::new()),
                ArtifactMetadata::new("tax", "application/pdf", 1),
            )
            .unwrap_err();
        assert!(matches!(err, UpsertError::StorageConflict { .. }));
    }

    #[test]
    fn retry_inserts_when_winner_vanished() {
        let engine = racy(false, 1);
        let outcome = engine
            .upsert(
                locator("blob://a"),
                DocumentKind::TaxNotice,
                TargetRef::CaseHolder(CaseHolderId::new()),
                ArtifactMetadata::new("tax", "application/pdf", 1),
            )
            .unwrap();
        assert_eq!(outcome.action, UpsertAction::Created);
    }

    #[test]
    fn parallel_upserts_of_one_key_create_one_row() {
        use rayon::prelude::*;

        let (store, engine, holder) = engine();
        let target = TargetRef::CaseHolder(holder);
        let actions: Vec<UpsertAction> = (0..16)
            .into_par_iter()
            .map(|i| {
                engine
                    .upsert(
                        locator("blob://shared"),
                        DocumentKind::TaxNotice,
                        target,
                        ArtifactMetadata::new(format!("copy {i}"), "application/pdf", 1),
                    )
                    .unwrap()
                    .action
            })
            .collect();

        assert_eq!(actions.iter().filter(|a| **a == UpsertAction::Created).count(), 1);
        assert_eq!(store.document_count(), 1);
    }
}

//! Batch orchestration
//!
//! A submission is a list of artifacts against one case holder. Items are
//! resolved and upserted in order; one failing item never aborts the rest.
//! Completion is recomputed once per touched holder or property, after every
//! write of the batch has landed.

use crate::aggregate::StatusUpdate;
use crate::engine::DossierEngine;
use crate::error::{EngineResult, ItemError};
use crate::upsert::{UpsertAction, UpsertOutcome};
use dossier_cache::Fingerprint;
use dossier_model::{
    ArtifactMetadata, CaseContext, CaseHolderId, ContentLocator, DocumentId, DocumentKind, LeaseId,
    PropertyId, TargetRef, UploaderId,
};
use dossier_store::DossierStore;
use indexmap::IndexSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ids the caller supplies with a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRefs {
    pub holder_id: CaseHolderId,
    #[serde(default)]
    pub property_id: Option<PropertyId>,
    #[serde(default)]
    pub lease_id: Option<LeaseId>,
    /// Default uploader for items that name none
    #[serde(default)]
    pub uploader: Option<UploaderId>,
}

impl ContextRefs {
    /// Refs for a holder alone
    #[must_use]
    pub fn holder(holder_id: CaseHolderId) -> Self {
        Self {
            holder_id,
            property_id: None,
            lease_id: None,
            uploader: None,
        }
    }

    /// With a property
    #[must_use]
    pub fn with_property(mut self, property_id: PropertyId) -> Self {
        self.property_id = Some(property_id);
        self
    }

    /// With a lease
    #[must_use]
    pub fn with_lease(mut self, lease_id: LeaseId) -> Self {
        self.lease_id = Some(lease_id);
        self
    }

    /// With a default uploader
    #[must_use]
    pub fn with_uploader(mut self, uploader: UploaderId) -> Self {
        self.uploader = Some(uploader);
        self
    }
}

/// One submitted artifact
///
/// `kind` stays a raw tag so an unknown kind fails this item alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub kind: String,
    pub locator: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub size: u64,
    /// Which individual a per-individual artifact belongs to; 0 when absent
    #[serde(default)]
    pub party_index: Option<usize>,
    /// Attach to the lease in context instead of classifying by kind
    #[serde(default)]
    pub attach_to_lease: bool,
    #[serde(default)]
    pub uploader: Option<UploaderId>,
}

impl BatchItem {
    /// Item with empty metadata
    #[must_use]
    pub fn new(kind: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            locator: locator.into(),
            label: String::new(),
            media_type: String::new(),
            size: 0,
            party_index: None,
            attach_to_lease: false,
            uploader: None,
        }
    }

    /// With label, media type and size
    #[must_use]
    pub fn with_metadata(
        mut self,
        label: impl Into<String>,
        media_type: impl Into<String>,
        size: u64,
    ) -> Self {
        self.label = label.into();
        self.media_type = media_type.into();
        self.size = size;
        self
    }

    /// With a party index
    #[must_use]
    pub fn with_party_index(mut self, index: usize) -> Self {
        self.party_index = Some(index);
        self
    }

    /// Route to the lease in context
    #[must_use]
    pub fn for_lease(mut self) -> Self {
        self.attach_to_lease = true;
        self
    }

    /// With an uploader overriding the context's
    #[must_use]
    pub fn with_uploader(mut self, uploader: UploaderId) -> Self {
        self.uploader = Some(uploader);
        self
    }

    fn metadata(&self, fallback_uploader: Option<UploaderId>) -> ArtifactMetadata {
        ArtifactMetadata {
            label: self.label.clone(),
            media_type: self.media_type.clone(),
            size: self.size,
            uploader: self.uploader.or(fallback_uploader),
        }
    }
}

/// Result of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Created,
    Updated,
    Failed,
}

impl From<UpsertAction> for ItemStatus {
    fn from(action: UpsertAction) -> Self {
        match action {
            UpsertAction::Created => Self::Created,
            UpsertAction::Updated => Self::Updated,
        }
    }
}

/// Per-item entry of a [`BatchReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Position in the submitted list
    pub index: usize,
    pub kind: String,
    pub status: ItemStatus,
    pub target: Option<TargetRef>,
    /// Human-readable target, or "unresolved"
    pub target_description: String,
    pub document_id: Option<DocumentId>,
    pub error: Option<String>,
}

impl ItemOutcome {
    fn success(index: usize, item: &BatchItem, target: TargetRef, outcome: &UpsertOutcome) -> Self {
        Self {
            index,
            kind: item.kind.clone(),
            status: outcome.action.into(),
            target: Some(target),
            target_description: target.to_string(),
            document_id: Some(outcome.document.id),
            error: None,
        }
    }

    fn failure(index: usize, item: &BatchItem, error: &ItemError) -> Self {
        Self {
            index,
            kind: item.kind.clone(),
            status: ItemStatus::Failed,
            target: None,
            target_description: "unresolved".to_string(),
            document_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Everything a submission produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub holder_id: CaseHolderId,
    /// Hex content fingerprint of the submission
    pub fingerprint: String,
    /// Earlier sightings of the same submission still remembered
    pub replay_count: u32,
    /// One entry per item, in submission order
    pub outcomes: Vec<ItemOutcome>,
    /// One entry per touched holder or property, in first-touch order
    pub statuses: Vec<StatusUpdate>,
}

impl BatchReport {
    /// Items that created a document
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(ItemStatus::Created)
    }

    /// Items that updated an existing document
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(ItemStatus::Updated)
    }

    /// Items that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Failed)
    }

    /// Some items failed and some did not
    #[must_use]
    pub fn is_partial(&self) -> bool {
        let failed = self.failed();
        failed > 0 && failed < self.outcomes.len()
    }

    /// Outcome of the item at `index`
    #[must_use]
    pub fn outcome(&self, index: usize) -> Option<&ItemOutcome> {
        self.outcomes.get(index)
    }

    fn count(&self, status: ItemStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// A submission for [`DossierEngine::apply_batches`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub context: ContextRefs,
    pub items: Vec<BatchItem>,
}

/// Distinct subjects whose completion may have changed
#[derive(Debug, Default)]
struct Touched {
    holders: IndexSet<CaseHolderId>,
    properties: IndexSet<PropertyId>,
}

impl Touched {
    fn touch(&mut self, context: &CaseContext, target: TargetRef) {
        match target {
            TargetRef::Individual(_) | TargetRef::Organization(_) | TargetRef::CaseHolder(_) => {
                self.holders.insert(context.holder().id);
            }
            TargetRef::Property(id) => {
                self.properties.insert(id);
                // The owner's checklist may count artifacts kept on its properties.
                if let Some(link) = context.property.filter(|link| link.id == id) {
                    self.holders.insert(link.owner_id);
                }
            }
            TargetRef::Lease(_) => {}
        }
    }
}

fn fingerprint(refs: &ContextRefs, items: &[BatchItem]) -> Fingerprint {
    let property = refs.property_id.map(|id| id.to_string());
    let lease = refs.lease_id.map(|id| id.to_string());
    let uploader = refs.uploader.map(|id| id.to_string());
    let builder = Fingerprint::builder()
        .field(&refs.holder_id.to_string())
        .optional(property.as_deref())
        .optional(lease.as_deref())
        .optional(uploader.as_deref());
    items
        .iter()
        .fold(builder, |builder, item| {
            let party = item.party_index.map(|index| index.to_string());
            let uploader = item.uploader.map(|id| id.to_string());
            builder
                .field(&item.kind)
                .field(&item.locator)
                .field(&item.label)
                .field(&item.media_type)
                .field(&item.size.to_string())
                .optional(party.as_deref())
                .field(if item.attach_to_lease { "lease" } else { "kind" })
                .optional(uploader.as_deref())
        })
        .finish()
}

impl<S: DossierStore> DossierEngine<S> {
    /// Apply one submission
    ///
    /// Per-item failures are reported in the outcomes; only an unknown holder
    /// or a store failure while loading context fails the whole call.
    ///
    /// # Errors
    /// [`crate::EngineError::HolderNotFound`] or a store failure before any item ran.
    #[tracing::instrument(skip_all, fields(holder = %refs.holder_id, items = items.len()))]
    pub fn apply_batch(
        &self,
        refs: &ContextRefs,
        items: &[BatchItem],
    ) -> EngineResult<BatchReport> {
        let context = self.load_context(refs.holder_id, refs.property_id, refs.lease_id)?;

        let fingerprint = fingerprint(refs, items);
        let replay_count = self.ledger.record(fingerprint);
        if replay_count > 0 {
            metrics::counter!("dossier_submission_replays_total").increment(1);
        }

        let mut touched = Touched::default();
        let outcomes: Vec<ItemOutcome> = items
            .iter()
            .enumerate()
            .map(|(index, item)| match self.apply_item(&context, refs, item) {
                Ok((target, outcome)) => {
                    touched.touch(&context, target);
                    ItemOutcome::success(index, item, target, &outcome)
                }
                Err(err) => {
                    metrics::counter!("dossier_item_failures_total").increment(1);
                    tracing::warn!(index, kind = %item.kind, error = %err, "item rejected");
                    ItemOutcome::failure(index, item, &err)
                }
            })
            .collect();

        let statuses = self.recompute_touched(&touched);
        self.prune_locks();

        let report = BatchReport {
            holder_id: refs.holder_id,
            fingerprint: fingerprint.to_hex(),
            replay_count,
            outcomes,
            statuses,
        };
        tracing::info!(
            created = report.created(),
            updated = report.updated(),
            failed = report.failed(),
            replay_count,
            fingerprint = %fingerprint.short(),
            "batch applied"
        );
        Ok(report)
    }

    /// Apply independent submissions in parallel
    ///
    /// Results are in submission order.
    pub fn apply_batches(&self, submissions: &[Submission]) -> Vec<EngineResult<BatchReport>> {
        submissions
            .par_iter()
            .map(|submission| self.apply_batch(&submission.context, &submission.items))
            .collect()
    }

    fn apply_item(
        &self,
        context: &CaseContext,
        refs: &ContextRefs,
        item: &BatchItem,
    ) -> Result<(TargetRef, UpsertOutcome), ItemError> {
        let kind: DocumentKind = item
            .kind
            .parse()
            .map_err(|_| ItemError::UnknownKind(item.kind.clone()))?;
        let locator =
            ContentLocator::new(item.locator.as_str()).map_err(|_| ItemError::InvalidLocator)?;
        let target = if item.attach_to_lease {
            self.resolver.resolve_lease(context)?
        } else {
            self.resolver.resolve(kind, context, item.party_index)?
        };
        let outcome = self.upserts.upsert(locator, kind, target, item.metadata(refs.uploader))?;
        Ok((target, outcome))
    }

    fn recompute_touched(&self, touched: &Touched) -> Vec<StatusUpdate> {
        let holders = touched.holders.iter().map(|id| self.refresh_holder(*id));
        let properties = touched.properties.iter().map(|id| self.refresh_property(*id));
        holders
            .chain(properties)
            .filter_map(|result| {
                result
                    .map_err(|err| tracing::error!(error = %err, "completion recompute failed"))
                    .ok()
            })
            .collect()
    }
}

//! Attachment resolver
//!
//! Pure decision function: (kind, context, party index) to exactly one owner.

use crate::rules::{rule_for, RuleClass};
use dossier_model::{CaseContext, DocumentKind, HolderRole, TargetRef};

/// Classification failures, recoverable by supplying better context
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Per-individual kind but the holder has no individual
    #[error("no individual available for {kind}")]
    NoIndividualAvailable { kind: DocumentKind },

    /// Organization kind but the holder has no organization
    #[error("no organization available for {kind}")]
    NoOrganizationAvailable { kind: DocumentKind },

    /// Property-only kind but no property was supplied
    #[error("no property in context for {kind}")]
    NoPropertyInContext { kind: DocumentKind },

    /// Lease routing requested but no lease was supplied
    #[error("no lease in context")]
    NoLeaseInContext,
}

/// Single shared resolver called by every submission entry point
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentResolver;

impl AttachmentResolver {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve the owner of an artifact of `kind`
    ///
    /// `party_index` only matters for per-individual kinds. It defaults to 0
    /// and is clamped to the primary individual when out of range.
    ///
    /// # Errors
    /// A [`ResolutionError`] naming the missing piece of context.
    pub fn resolve(
        &self,
        kind: DocumentKind,
        context: &CaseContext,
        party_index: Option<usize>,
    ) -> Result<TargetRef, ResolutionError> {
        let holder = context.holder();
        match rule_for(kind) {
            RuleClass::PerIndividual => {
                let individuals = context.individuals();
                let index = party_index.unwrap_or(0);
                let person = individuals
                    .get(index)
                    .or_else(|| {
                        tracing::debug!(
                            holder = %holder.id,
                            index,
                            available = individuals.len(),
                            "party index out of range, falling back to primary"
                        );
                        individuals.first()
                    })
                    .ok_or(ResolutionError::NoIndividualAvailable { kind })?;
                Ok(TargetRef::Individual(person.id))
            }
            RuleClass::Organization => context
                .organization()
                .map(|org| TargetRef::Organization(org.id))
                .ok_or(ResolutionError::NoOrganizationAvailable { kind }),
            RuleClass::PropertyOnly => context
                .property
                .map(|property| TargetRef::Property(property.id))
                .ok_or(ResolutionError::NoPropertyInContext { kind }),
            RuleClass::RoleDependent => match (holder.role, context.property) {
                (HolderRole::Owner, Some(property)) => Ok(TargetRef::Property(property.id)),
                _ => Ok(TargetRef::CaseHolder(holder.id)),
            },
            RuleClass::Household => Ok(TargetRef::CaseHolder(holder.id)),
        }
    }

    /// Route a lease-level artifact to the lease supplied in context
    ///
    /// # Errors
    /// [`ResolutionError::NoLeaseInContext`] when no lease was supplied
    pub fn resolve_lease(&self, context: &CaseContext) -> Result<TargetRef, ResolutionError> {
        context
            .lease
            .map(TargetRef::Lease)
            .ok_or(ResolutionError::NoLeaseInContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_model::{
        CaseHolder, HolderGraph, IdentityKind, Individual, LeaseId, Organization, PropertyId,
        PropertyLink,
    };
    use proptest::prelude::*;
    use std::sync::Arc;

    fn holder(role: HolderRole) -> CaseHolder {
        CaseHolder::new(IdentityKind::Individual, role)
    }

    fn people(holder: &CaseHolder, count: usize) -> Vec<Individual> {
        (0..count)
            .map(|i| {
                let mut person = Individual::new(holder.id, i == 0);
                person.seq = i as u64;
                person
            })
            .collect()
    }

    fn context(holder: CaseHolder, individuals: Vec<Individual>) -> CaseContext {
        CaseContext::new(Arc::new(HolderGraph::new(holder, individuals, None)))
    }

    fn property_for(holder: &CaseHolder) -> Option<PropertyLink> {
        Some(PropertyLink {
            id: PropertyId::new(),
            owner_id: holder.id,
        })
    }

    #[test]
    fn identity_document_targets_indexed_individual() {
        let h = holder(HolderRole::Tenant);
        let individuals = people(&h, 3);
        let second = individuals[1].id;
        let ctx = context(h, individuals);

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::IdentityDocument, &ctx, Some(1))
            .unwrap();
        assert_eq!(target, TargetRef::Individual(second));
    }

    #[test]
    fn identity_document_without_individual_fails() {
        let ctx = context(holder(HolderRole::Tenant), vec![]);
        let err = AttachmentResolver::new()
            .resolve(DocumentKind::BirthCertificate, &ctx, None)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoIndividualAvailable { .. }));
    }

    #[test]
    fn organization_kind_targets_organization() {
        let h = CaseHolder::new(IdentityKind::Organization, HolderRole::Owner);
        let org = Organization::new(h.id);
        let org_id = org.id;
        let ctx = CaseContext::new(Arc::new(HolderGraph::new(h, vec![], Some(org))));

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::Bylaws, &ctx, None)
            .unwrap();
        assert_eq!(target, TargetRef::Organization(org_id));
    }

    #[test]
    fn organization_kind_without_organization_fails() {
        let ctx = context(holder(HolderRole::Owner), vec![]);
        let err = AttachmentResolver::new()
            .resolve(DocumentKind::RegistrationCertificate, &ctx, None)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoOrganizationAvailable { .. }));
    }

    #[test]
    fn property_kind_never_falls_back_to_holder() {
        let ctx = context(holder(HolderRole::Owner), vec![]);
        let err = AttachmentResolver::new()
            .resolve(DocumentKind::TitleDeed, &ctx, None)
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NoPropertyInContext {
                kind: DocumentKind::TitleDeed
            }
        );
    }

    #[test]
    fn insurance_for_owner_with_property_targets_property() {
        let h = holder(HolderRole::Owner);
        let property = property_for(&h);
        let ctx = context(h, vec![]).with_property(property);

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::InsuranceCertificate, &ctx, None)
            .unwrap();
        assert_eq!(target, TargetRef::Property(property.unwrap().id));
    }

    #[test]
    fn insurance_for_tenant_targets_holder_even_with_property() {
        let h = holder(HolderRole::Tenant);
        let holder_id = h.id;
        let property = property_for(&h);
        let ctx = context(h, vec![]).with_property(property);

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::InsuranceCertificate, &ctx, None)
            .unwrap();
        assert_eq!(target, TargetRef::CaseHolder(holder_id));
    }

    #[test]
    fn bank_proof_for_owner_without_property_targets_holder() {
        let h = holder(HolderRole::Owner);
        let holder_id = h.id;
        let ctx = context(h, vec![]);

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::BankAccountProof, &ctx, None)
            .unwrap();
        assert_eq!(target, TargetRef::CaseHolder(holder_id));
    }

    #[test]
    fn household_kind_targets_holder() {
        let h = holder(HolderRole::Lead);
        let holder_id = h.id;
        let ctx = context(h, vec![]);

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::FamilyBooklet, &ctx, Some(4))
            .unwrap();
        assert_eq!(target, TargetRef::CaseHolder(holder_id));
    }

    #[test]
    fn primary_inserted_second_is_index_zero() {
        let h = holder(HolderRole::Tenant);
        let mut first = Individual::new(h.id, false);
        first.seq = 1;
        let mut primary = Individual::new(h.id, true);
        primary.seq = 2;
        let primary_id = primary.id;
        let ctx = context(h, vec![first, primary]);

        let target = AttachmentResolver::new()
            .resolve(DocumentKind::IdentityDocument, &ctx, Some(0))
            .unwrap();
        assert_eq!(target, TargetRef::Individual(primary_id));
    }

    #[test]
    fn lease_routing_requires_lease() {
        let h = holder(HolderRole::Owner);
        let resolver = AttachmentResolver::new();
        let ctx = context(h, vec![]);
        assert_eq!(
            resolver.resolve_lease(&ctx),
            Err(ResolutionError::NoLeaseInContext)
        );

        let lease = LeaseId::new();
        let ctx = ctx.with_lease(Some(lease));
        assert_eq!(resolver.resolve_lease(&ctx), Ok(TargetRef::Lease(lease)));
    }

    proptest! {
        #[test]
        fn prop_out_of_range_index_clamps_to_primary(
            count in 1usize..6,
            overshoot in 0usize..50,
            birth in any::<bool>(),
        ) {
            let h = holder(HolderRole::Tenant);
            let individuals = people(&h, count);
            let primary = individuals[0].id;
            let ctx = context(h, individuals);
            let kind = if birth {
                DocumentKind::BirthCertificate
            } else {
                DocumentKind::IdentityDocument
            };

            let target = AttachmentResolver::new()
                .resolve(kind, &ctx, Some(count + overshoot))
                .unwrap();
            prop_assert_eq!(target, TargetRef::Individual(primary));
        }

        #[test]
        fn prop_resolver_is_deterministic(
            index in proptest::option::of(0usize..8),
            k in 0usize..15,
        ) {
            let h = holder(HolderRole::Owner);
            let property = property_for(&h);
            let ctx = context(h.clone(), people(&h, 2)).with_property(property);
            let kind = DocumentKind::ALL[k];
            let resolver = AttachmentResolver::new();

            prop_assert_eq!(
                resolver.resolve(kind, &ctx, index),
                resolver.resolve(kind, &ctx, index)
            );
        }
    }
}

//! Loaded case context handed to the resolver

use crate::entities::{CaseHolder, Individual, Organization};
use crate::ids::{CaseHolderId, LeaseId, PropertyId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A case holder with its people and organization, individuals ordered
/// primary-first then by insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderGraph {
    pub holder: CaseHolder,
    individuals: Vec<Individual>,
    pub organization: Option<Organization>,
}

impl HolderGraph {
    /// Build a graph, normalizing individual order and the primary flag
    #[must_use]
    pub fn new(
        holder: CaseHolder,
        individuals: Vec<Individual>,
        organization: Option<Organization>,
    ) -> Self {
        Self {
            holder,
            individuals: order_individuals(individuals),
            organization,
        }
    }

    /// Individuals, primary first
    #[inline]
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// The primary individual, if any individual exists
    #[inline]
    #[must_use]
    pub fn primary(&self) -> Option<&Individual> {
        self.individuals.first()
    }
}

/// Order individuals primary-first, then by insertion sequence
///
/// When several are flagged primary, only the first-created keeps the flag.
#[must_use]
pub fn order_individuals(mut individuals: Vec<Individual>) -> Vec<Individual> {
    individuals.sort_by_key(|person| person.seq);
    let mut primary_seen = false;
    for person in &mut individuals {
        if person.is_primary {
            if primary_seen {
                person.is_primary = false;
            }
            primary_seen = true;
        }
    }
    // Stable: non-primaries keep insertion order.
    individuals.sort_by_key(|person| !person.is_primary);
    individuals
}

/// A property resolved by the caller together with its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLink {
    pub id: PropertyId,
    pub owner_id: CaseHolderId,
}

/// Everything the resolver may consult for one submission
#[derive(Debug, Clone)]
pub struct CaseContext {
    graph: Arc<HolderGraph>,
    pub property: Option<PropertyLink>,
    pub lease: Option<LeaseId>,
}

impl CaseContext {
    /// Context over a holder graph with no property or lease
    #[must_use]
    pub fn new(graph: Arc<HolderGraph>) -> Self {
        Self {
            graph,
            property: None,
            lease: None,
        }
    }

    /// Supply the property decided by the caller
    #[must_use]
    pub fn with_property(mut self, property: Option<PropertyLink>) -> Self {
        self.property = property;
        self
    }

    /// Supply the lease decided by the caller
    #[must_use]
    pub fn with_lease(mut self, lease: Option<LeaseId>) -> Self {
        self.lease = lease;
        self
    }

    /// Holder graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &HolderGraph {
        &self.graph
    }

    /// Case holder
    #[inline]
    #[must_use]
    pub fn holder(&self) -> &CaseHolder {
        &self.graph.holder
    }

    /// Individuals, primary first
    #[inline]
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        self.graph.individuals()
    }

    /// Organization, if the holder has one
    #[inline]
    #[must_use]
    pub fn organization(&self) -> Option<&Organization> {
        self.graph.organization.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HolderRole, IdentityKind};

    fn person(holder: &CaseHolder, primary: bool, seq: u64) -> Individual {
        let mut individual = Individual::new(holder.id, primary);
        individual.seq = seq;
        individual
    }

    #[test]
    fn primary_moves_to_front() {
        let holder = CaseHolder::new(IdentityKind::Individual, HolderRole::Tenant);
        let first = person(&holder, false, 1);
        let primary = person(&holder, true, 2);
        let graph = HolderGraph::new(holder, vec![first.clone(), primary.clone()], None);

        assert_eq!(graph.individuals()[0].id, primary.id);
        assert_eq!(graph.individuals()[1].id, first.id);
    }

    #[test]
    fn first_created_primary_wins_ties() {
        let holder = CaseHolder::new(IdentityKind::Individual, HolderRole::Owner);
        let later = person(&holder, true, 5);
        let earlier = person(&holder, true, 3);
        let graph = HolderGraph::new(holder, vec![later.clone(), earlier.clone()], None);

        assert_eq!(graph.individuals()[0].id, earlier.id);
        assert!(graph.individuals()[0].is_primary);
        assert!(!graph.individuals()[1].is_primary);
    }

    #[test]
    fn without_primary_order_is_insertion_order() {
        let holder = CaseHolder::new(IdentityKind::Individual, HolderRole::Lead);
        let a = person(&holder, false, 7);
        let b = person(&holder, false, 2);
        let c = person(&holder, false, 4);
        let graph = HolderGraph::new(holder, vec![a.clone(), b.clone(), c.clone()], None);

        let ids: Vec<_> = graph.individuals().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, c.id, a.id]);
    }
}

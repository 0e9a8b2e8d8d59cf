//! Kind-to-rule classification
//!
//! Provides the ordered rule table consulted by [`AttachmentResolver`](crate::AttachmentResolver)
//! and by the completion checklists.

use dossier_model::DocumentKind;
use std::fmt;

/// Targeting rule a document kind falls under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleClass {
    /// Attaches to one individual selected by party index
    PerIndividual,

    /// Attaches to the holder's organization
    Organization,

    /// Attaches to the supplied property, never elsewhere
    PropertyOnly,

    /// Property for an OWNER with a property in context, else the holder
    RoleDependent,

    /// Household-level: attaches to the holder itself
    Household,
}

impl RuleClass {
    /// Short label used in logs and diagnostics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerIndividual => "per_individual",
            Self::Organization => "organization",
            Self::PropertyOnly => "property_only",
            Self::RoleDependent => "role_dependent",
            Self::Household => "household",
        }
    }
}

impl fmt::Display for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rules in precedence order; the first table entry listing a kind wins.
/// Kinds listed nowhere fall through to [`RuleClass::Household`].
pub const RULE_TABLE: [(RuleClass, &[DocumentKind]); 4] = [
    (
        RuleClass::PerIndividual,
        &[DocumentKind::IdentityDocument, DocumentKind::BirthCertificate],
    ),
    (
        RuleClass::Organization,
        &[DocumentKind::RegistrationCertificate, DocumentKind::Bylaws],
    ),
    (
        RuleClass::PropertyOnly,
        &[
            DocumentKind::Diagnostics,
            DocumentKind::TitleDeed,
            DocumentKind::CoOwnershipRules,
            DocumentKind::AllotmentCharter,
            DocumentKind::SyndicalAssociationStatute,
        ],
    ),
    (
        RuleClass::RoleDependent,
        &[DocumentKind::InsuranceCertificate, DocumentKind::BankAccountProof],
    ),
];

/// Rule class for a kind
#[must_use]
pub fn rule_for(kind: DocumentKind) -> RuleClass {
    RULE_TABLE
        .iter()
        .find(|(_, kinds)| kinds.contains(&kind))
        .map_or(RuleClass::Household, |(class, _)| *class)
}

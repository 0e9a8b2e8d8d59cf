//! Closed set of document kinds

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an uploaded artifact represents
///
/// The set is closed: submission channels send the snake_case tag and
/// anything outside this list is rejected with [`ModelError::UnknownKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Passport, national identity card, residence permit
    IdentityDocument,
    /// Birth certificate extract
    BirthCertificate,
    /// Company registration extract
    RegistrationCertificate,
    /// Company bylaws
    Bylaws,
    /// Mandatory technical diagnostics bundle
    Diagnostics,
    /// Title deed
    TitleDeed,
    /// Co-ownership regulations
    CoOwnershipRules,
    /// Allotment specifications
    AllotmentCharter,
    /// Statute of a free syndical association
    SyndicalAssociationStatute,
    /// Home or landlord insurance certificate
    InsuranceCertificate,
    /// Bank account details
    BankAccountProof,
    /// Family booklet
    FamilyBooklet,
    /// Civil union certificate
    CivilUnionCertificate,
    /// Payslips or other income evidence
    ProofOfIncome,
    /// Latest tax notice
    TaxNotice,
}

impl DocumentKind {
    /// Every kind, in declaration order
    pub const ALL: [DocumentKind; 15] = [
        Self::IdentityDocument,
        Self::BirthCertificate,
        Self::RegistrationCertificate,
        Self::Bylaws,
        Self::Diagnostics,
        Self::TitleDeed,
        Self::CoOwnershipRules,
        Self::AllotmentCharter,
        Self::SyndicalAssociationStatute,
        Self::InsuranceCertificate,
        Self::BankAccountProof,
        Self::FamilyBooklet,
        Self::CivilUnionCertificate,
        Self::ProofOfIncome,
        Self::TaxNotice,
    ];

    /// Wire tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityDocument => "identity_document",
            Self::BirthCertificate => "birth_certificate",
            Self::RegistrationCertificate => "registration_certificate",
            Self::Bylaws => "bylaws",
            Self::Diagnostics => "diagnostics",
            Self::TitleDeed => "title_deed",
            Self::CoOwnershipRules => "co_ownership_rules",
            Self::AllotmentCharter => "allotment_charter",
            Self::SyndicalAssociationStatute => "syndical_association_statute",
            Self::InsuranceCertificate => "insurance_certificate",
            Self::BankAccountProof => "bank_account_proof",
            Self::FamilyBooklet => "family_booklet",
            Self::CivilUnionCertificate => "civil_union_certificate",
            Self::ProofOfIncome => "proof_of_income",
            Self::TaxNotice => "tax_notice",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_parses_to_its_kind() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.as_str().parse::<DocumentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn parsing_tolerates_case_and_whitespace() {
        assert_eq!(
            " Title_Deed ".parse::<DocumentKind>().unwrap(),
            DocumentKind::TitleDeed
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "selfie".parse::<DocumentKind>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownKind(tag) if tag == "selfie"));
    }

    #[test]
    fn serde_uses_wire_tag() {
        let json = serde_json::to_string(&DocumentKind::CoOwnershipRules).unwrap();
        assert_eq!(json, "\"co_ownership_rules\"");
    }
}

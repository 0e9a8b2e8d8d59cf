//! Derived completion status

use crate::ids::{CaseHolderId, PropertyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readiness of a case holder or property for staff review
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Nothing required has been provided
    #[default]
    NotStarted,
    /// Some requirements are met
    Partial,
    /// Every requirement is met; awaiting staff review
    PendingCheck,
    /// Validated by staff. Only ever set externally.
    Completed,
}

impl CompletionStatus {
    /// Derive a status from requirement counts
    ///
    /// `Completed` is never produced from scratch: it is kept only when the
    /// stored status already says so and every requirement still holds.
    /// A regression demotes it like any other status. An empty checklist
    /// yields `NotStarted`.
    #[must_use]
    pub fn classify(satisfied: usize, total: usize, current: CompletionStatus) -> Self {
        let all_met = satisfied >= total;
        if current == Self::Completed && all_met {
            return Self::Completed;
        }
        if total == 0 || satisfied == 0 {
            Self::NotStarted
        } else if all_met {
            Self::PendingCheck
        } else {
            Self::Partial
        }
    }

    /// Wire tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Partial => "partial",
            Self::PendingCheck => "pending_check",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity whose completion status is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum StatusSubject {
    CaseHolder(CaseHolderId),
    Property(PropertyId),
}

impl fmt::Display for StatusSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaseHolder(id) => write!(f, "case_holder:{id}"),
            Self::Property(id) => write!(f, "property:{id}"),
        }
    }
}

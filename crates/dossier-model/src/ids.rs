//! Typed identifiers for every node of the case graph
//!
//! All identifiers are ULIDs wrapped in distinct newtypes so that an
//! `IndividualId` can never be passed where a `PropertyId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a fresh identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Underlying ULID
            #[inline]
            #[must_use]
            pub fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Root of a case file ("client")
    CaseHolderId
);
define_id!(
    /// A person belonging to a case holder
    IndividualId
);
define_id!(
    /// The organization belonging to a case holder
    OrganizationId
);
define_id!(
    /// A property owned by a case holder
    PropertyId
);
define_id!(
    /// A lease binding a property to its parties
    LeaseId
);
define_id!(
    /// A stored document row
    DocumentId
);
define_id!(
    /// Authenticated uploader; absent for anonymous intake
    UploaderId
);

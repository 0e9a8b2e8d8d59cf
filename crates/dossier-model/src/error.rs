//! Errors raised while constructing model values

/// Model construction and conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Kind tag outside the closed enumeration
    #[error("unknown document kind: '{0}'")]
    UnknownKind(String),

    /// Content locator is empty or blank
    #[error("content locator must not be blank")]
    InvalidLocator,

    /// Row-level owner columns do not hold exactly one reference
    #[error("document owner must reference exactly one entity, found {populated}")]
    OwnerCardinality { populated: usize },
}

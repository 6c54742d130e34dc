//! Error types for the lanemap core.

use thiserror::Error;

use crate::primitives::Id;
use crate::roles::RuleParameter;

/// Main error type for relation and registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A relation violates the role cardinality of its kind.
    #[error("Invalid {rule} relation {id}: {reason}")]
    InvalidRelation {
        rule: String,
        id: Id,
        reason: String,
    },

    /// A lanelet was placed in a role that excludes a role it already holds.
    #[error("Lanelet {lanelet} cannot be added to role '{role}' of relation {id}: already in role '{existing}'")]
    ConflictingRole {
        id: Id,
        lanelet: Id,
        role: String,
        existing: String,
    },

    /// A role already holds a reference to this primitive.
    #[error("Role '{role}' of relation {id} already references {member}")]
    DuplicateReference {
        id: Id,
        role: String,
        member: RuleParameter,
    },

    /// A relation type name was registered twice.
    #[error("Relation type '{0}' is already registered")]
    DuplicateTypeName(String),

    /// A reference points to a primitive that is not in the map.
    #[error("Role '{role}' of {id} references missing {member}")]
    UnresolvedReference {
        id: Id,
        role: String,
        member: RuleParameter,
    },

    /// A mandatory role was queried before it was populated.
    #[error("Internal invariant violated: {0}")]
    InvariantViolated(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidRelation`].
    #[must_use]
    pub fn invalid(rule: &str, id: Id, reason: impl Into<String>) -> Self {
        Self::InvalidRelation {
            rule: rule.to_string(),
            id,
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Error types for map loading and saving.
//!
//! Record-level failures (`MalformedRecord`, `RecordFailed`) are the ones
//! robust mode collects; everything else aborts the whole operation.

use lanemap_core::{CoreError, Id};
use thiserror::Error;

/// Main error type for the IO library.
#[derive(Debug, Error)]
pub enum IoError {
    /// No handler matches the requested format name or file extension.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A handler was registered twice under the same name.
    #[error("Format '{0}' is already registered")]
    DuplicateFormat(String),

    /// A handler rejected a configuration option.
    #[error("Invalid value for option '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    /// The document as a whole is not a valid map file.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A single record could not be decoded.
    #[error("{kind} {}: {reason}", .id.map_or_else(|| "<no id>".to_string(), |id| id.to_string()))]
    MalformedRecord {
        kind: &'static str,
        id: Option<Id>,
        reason: String,
    },

    /// A decoded record could not be turned into a valid map element,
    /// or a map element could not be turned into a record.
    #[error("{kind} {id}: {source}")]
    RecordFailed {
        kind: &'static str,
        id: Id,
        #[source]
        source: CoreError,
    },

    /// Relation or registry error outside of a record.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// YAML (de)serialization failed.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    pub(crate) fn malformed(kind: &'static str, id: Option<Id>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            kind,
            id,
            reason: reason.into(),
        }
    }

    pub(crate) fn failed(kind: &'static str, id: Id, source: CoreError) -> Self {
        Self::RecordFailed { kind, id, source }
    }

    /// Whether robust mode may record this error and carry on.
    #[must_use]
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. } | Self::RecordFailed { .. })
    }
}

/// Result type alias for IO operations.
pub type Result<T> = std::result::Result<T, IoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lanemap_core::RuleParameter;

    #[test]
    fn test_error_display() {
        let err = IoError::UnsupportedFormat(".pbf".to_string());
        assert_eq!(err.to_string(), "Unsupported format: .pbf");
    }

    #[test]
    fn test_malformed_with_and_without_id() {
        let err = IoError::malformed("node", Some(4), "missing attribute 'lat'");
        assert_eq!(err.to_string(), "node 4: missing attribute 'lat'");
        assert!(err.is_record_level());

        let err = IoError::malformed("way", None, "missing attribute 'id'");
        assert_eq!(err.to_string(), "way <no id>: missing attribute 'id'");
    }

    #[test]
    fn test_record_failed_display() {
        let err = IoError::failed(
            "relation",
            2,
            CoreError::UnresolvedReference {
                id: 2,
                role: "refers".to_string(),
                member: RuleParameter::LineString(77),
            },
        );
        assert_eq!(
            err.to_string(),
            "relation 2: Role 'refers' of 2 references missing linestring 77"
        );
        assert!(err.is_record_level());
        assert!(!IoError::UnsupportedFormat("x".to_string()).is_record_level());
    }
}

//! Parser and writer traits implemented by format handlers.

use lanemap_core::Projector;

use super::types::ErrorPolicy;
use crate::config::Configuration;
use crate::error::Result;
use crate::record::RecordSet;

/// Reads one map file into records.
///
/// Instances are created per call and hold the projector they were built
/// with.
pub trait Parser {
    /// Parse the whole document.
    ///
    /// Record-level failures go through `policy`; failures of the document
    /// itself (not well-formed, wrong root) are returned directly.
    fn parse(&self, input: &str, policy: &mut ErrorPolicy<'_>) -> Result<RecordSet>;
}

/// Serializes records into one map file.
pub trait Writer {
    /// Serialize every record the policy lets through.
    fn write(&self, records: &RecordSet, policy: &mut ErrorPolicy<'_>) -> Result<String>;
}

/// Builds a parser for one call.
///
/// # Errors
/// `InvalidConfig` if the handler rejects an option.
pub type ParserFactory =
    for<'a> fn(&'a dyn Projector, &'a Configuration) -> Result<Box<dyn Parser + 'a>>;

/// Builds a writer for one call.
///
/// # Errors
/// `InvalidConfig` if the handler rejects an option.
pub type WriterFactory =
    for<'a> fn(&'a dyn Projector, &'a Configuration) -> Result<Box<dyn Writer + 'a>>;

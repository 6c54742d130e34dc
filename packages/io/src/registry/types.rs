//! Types shared by handlers and the load/save orchestrator.

use crate::error::{IoError, Result};

/// Human-readable record failures collected in robust mode.
pub type ErrorMessages = Vec<String>;

/// What to do when a single record fails.
#[derive(Debug)]
pub enum ErrorPolicy<'e> {
    /// Abort on the first record failure.
    Strict,
    /// Record the failure and continue with the next record.
    Robust(&'e mut ErrorMessages),
}

impl<'e> ErrorPolicy<'e> {
    /// Robust if a sink is given, strict otherwise.
    #[must_use]
    pub fn from_sink(sink: Option<&'e mut ErrorMessages>) -> Self {
        match sink {
            Some(errors) => Self::Robust(errors),
            None => Self::Strict,
        }
    }

    #[must_use]
    pub fn is_robust(&self) -> bool {
        matches!(self, Self::Robust(_))
    }

    /// Route a failure through the policy.
    ///
    /// Robust mode swallows record-level failures and keeps their message.
    /// Anything else, and every failure in strict mode, comes back as `Err`.
    ///
    /// # Errors
    /// The given error, unless it was recorded.
    pub fn record(&mut self, err: IoError) -> Result<()> {
        match self {
            Self::Robust(errors) if err.is_record_level() => {
                tracing::warn!(error = %err, "Skipping record");
                errors.push(err.to_string());
                Ok(())
            }
            _ => Err(err),
        }
    }

    /// Number of failures recorded so far; always zero in strict mode.
    #[must_use]
    pub fn recorded(&self) -> usize {
        match self {
            Self::Strict => 0,
            Self::Robust(errors) => errors.len(),
        }
    }
}

//! Error types for document extraction.

use colloquy_core::ColloquyError;

/// Errors from the extraction aggregator.
///
/// Individual unit failures are contained (logged and skipped); only
/// batch-level outcomes surface here.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Every unit failed. Distinct from a successful run whose fields are
    /// all absent, so callers can say "could not read this document".
    #[error("nothing extracted: all {units} units failed")]
    NothingExtracted { units: usize },

    #[error("extraction cancelled")]
    Cancelled,
}

impl From<ExtractError> for ColloquyError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Cancelled => ColloquyError::Cancelled,
            other => ColloquyError::Extraction(other.to_string()),
        }
    }
}

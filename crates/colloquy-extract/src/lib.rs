//! Structured extraction over scanned documents for Colloquy.
//!
//! Provides the `UnitExtractor` trait for per-unit field extraction, a
//! `MockExtractor` for testing, the partial-failure-tolerant
//! `ExtractionAggregator` with override-merge semantics, and a keyword
//! frequency tally.

pub mod aggregator;
pub mod error;
pub mod frequency;
pub mod types;

use std::collections::VecDeque;
use std::sync::Mutex;

use colloquy_core::ColloquyError;

pub use aggregator::ExtractionAggregator;
pub use error::ExtractError;
pub use frequency::{rank_keywords, FrequencyTally};
pub use types::{DocumentFields, DocumentUnit};

/// Service that reads structured fields off one document unit.
///
/// Implementations wrap an extraction engine (on-device model, OCR
/// post-processor) behind a uniform async interface. A call may fail; the
/// aggregator treats that as a skippable, per-unit event.
pub trait UnitExtractor: Send + Sync {
    /// Extract the fields visible on the given unit.
    fn extract(
        &self,
        unit: &DocumentUnit,
    ) -> impl std::future::Future<Output = Result<DocumentFields, ColloquyError>> + Send;
}

/// Mock extractor for testing.
///
/// Returns a fixed result, always fails, or plays back one scripted outcome
/// per call, without running a real extraction engine.
pub struct MockExtractor {
    mode: MockMode,
}

enum MockMode {
    Fixed(DocumentFields),
    Failing,
    Scripted(Mutex<VecDeque<Result<DocumentFields, String>>>),
}

impl MockExtractor {
    /// An extractor that returns the given fields for every unit.
    pub fn with_fields(fields: DocumentFields) -> Self {
        Self {
            mode: MockMode::Fixed(fields),
        }
    }

    /// An extractor that returns empty fields for every unit.
    pub fn empty() -> Self {
        Self::with_fields(DocumentFields::default())
    }

    /// An extractor that fails for every unit.
    pub fn failing() -> Self {
        Self {
            mode: MockMode::Failing,
        }
    }

    /// An extractor that plays back one outcome per call, in order.
    /// Calls beyond the script fail.
    pub fn scripted(outcomes: Vec<Result<DocumentFields, String>>) -> Self {
        Self {
            mode: MockMode::Scripted(Mutex::new(outcomes.into())),
        }
    }
}

impl UnitExtractor for MockExtractor {
    async fn extract(&self, unit: &DocumentUnit) -> Result<DocumentFields, ColloquyError> {
        match &self.mode {
            MockMode::Fixed(fields) => Ok(fields.clone()),
            MockMode::Failing => Err(ColloquyError::Extraction(format!(
                "mock failure on unit {}",
                unit.index
            ))),
            MockMode::Scripted(script) => {
                let next = script.lock().expect("script mutex poisoned").pop_front();
                match next {
                    Some(Ok(fields)) => Ok(fields),
                    Some(Err(reason)) => Err(ColloquyError::Extraction(reason)),
                    None => Err(ColloquyError::Extraction("script exhausted".to_string())),
                }
            }
        }
    }
}

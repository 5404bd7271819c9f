//! Multi-unit extraction with partial-failure tolerance.
//!
//! Units are extracted one at a time, strictly in ascending index order, and
//! folded into one aggregate with field-level override: later units win per
//! field. Ordering is an invariant of that merge rule, so units are never
//! extracted concurrently.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use colloquy_core::{ColloquyError, ExtractionConfig};

use crate::error::ExtractError;
use crate::types::{DocumentFields, DocumentUnit};
use crate::UnitExtractor;

/// Runs an extraction operation over every unit of a document and merges
/// the per-unit results.
pub struct ExtractionAggregator<E: UnitExtractor> {
    extractor: E,
    unit_timeout: Option<Duration>,
}

impl<E: UnitExtractor> ExtractionAggregator<E> {
    /// Create an aggregator with no per-unit deadline.
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            unit_timeout: None,
        }
    }

    /// Create an aggregator honoring the configured per-unit deadline.
    pub fn with_config(extractor: E, config: &ExtractionConfig) -> Self {
        let unit_timeout = match config.unit_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            extractor,
            unit_timeout,
        }
    }

    /// Extract and merge all units.
    ///
    /// A failed unit is logged and skipped; the batch continues. Only when
    /// every unit fails does the whole aggregation fail, with
    /// [`ExtractError::NothingExtracted`] — distinct from an `Ok` result
    /// whose fields are all absent.
    pub async fn aggregate(&self, units: &[DocumentUnit]) -> Result<DocumentFields, ExtractError> {
        self.aggregate_with_cancellation(units, &CancellationToken::new())
            .await
    }

    /// Like [`ExtractionAggregator::aggregate`], checking the token before
    /// and during every unit. Cancellation discards the partial aggregate.
    pub async fn aggregate_with_cancellation(
        &self,
        units: &[DocumentUnit],
        cancel: &CancellationToken,
    ) -> Result<DocumentFields, ExtractError> {
        let mut ordered: Vec<&DocumentUnit> = units.iter().collect();
        ordered.sort_by_key(|unit| unit.index);

        let mut aggregate = DocumentFields::default();
        let mut succeeded = 0usize;

        for unit in ordered {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }
            if let Some(fields) = self.extract_unit(unit, cancel).await? {
                aggregate.merge_from(fields);
                succeeded += 1;
            }
        }

        if succeeded == 0 && !units.is_empty() {
            return Err(ExtractError::NothingExtracted { units: units.len() });
        }
        Ok(aggregate)
    }

    /// Run one unit under the deadline and cancellation token.
    ///
    /// Returns `Ok(None)` for a per-unit failure (including deadline
    /// expiry), which is logged and skipped; only cancellation surfaces as
    /// an error.
    async fn extract_unit(
        &self,
        unit: &DocumentUnit,
        cancel: &CancellationToken,
    ) -> Result<Option<DocumentFields>, ExtractError> {
        let attempt = async {
            match self.unit_timeout {
                Some(deadline) => {
                    match tokio::time::timeout(deadline, self.extractor.extract(unit)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ColloquyError::TimedOut(deadline.as_secs())),
                    }
                }
                None => self.extractor.extract(unit).await,
            }
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(ExtractError::Cancelled),
            outcome = attempt => outcome,
        };

        match outcome {
            Ok(fields) => {
                tracing::debug!(unit = unit.index, "Unit extracted");
                Ok(Some(fields))
            }
            Err(e) => {
                tracing::warn!(unit = unit.index, error = %e, "Unit extraction failed; skipping");
                Ok(None)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

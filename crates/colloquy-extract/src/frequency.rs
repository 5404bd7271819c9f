//! Label frequency tallying and ranking.

use std::collections::HashMap;

use crate::types::DocumentFields;

/// Counts label occurrences across a collection of records.
///
/// `ranked` orders labels by descending count; equal counts keep first-seen
/// order, so rankings are deterministic for a given input sequence.
#[derive(Debug, Default)]
pub struct FrequencyTally {
    counts: HashMap<String, usize>,
    first_seen: Vec<String>,
}

impl FrequencyTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of a label.
    pub fn record(&mut self, label: &str) {
        match self.counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(label.to_string(), 1);
                self.first_seen.push(label.to_string());
            }
        }
    }

    /// Count one occurrence of each label in the iterator.
    pub fn record_many<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            self.record(label.as_ref());
        }
    }

    /// The count recorded for a label so far.
    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Number of distinct labels seen.
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    /// All labels with their counts, ordered by descending count and, for
    /// equal counts, by first appearance.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .first_seen
            .iter()
            .map(|label| (label.clone(), self.counts[label]))
            .collect();
        // Stable sort keeps first-seen order within equal counts.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

/// Rank the keywords reported across a set of extracted documents,
/// returning at most `limit` entries.
pub fn rank_keywords(documents: &[DocumentFields], limit: usize) -> Vec<(String, usize)> {
    let mut tally = FrequencyTally::new();
    for document in documents {
        tally.record_many(&document.keywords);
    }
    let mut ranked = tally.ranked();
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_across_records() {
        let records = vec![vec!["x", "y"], vec!["x"], vec!["y", "y"]];
        let mut tally = FrequencyTally::new();
        for record in &records {
            tally.record_many(record.iter());
        }

        assert_eq!(tally.count("x"), 2);
        assert_eq!(tally.count("y"), 3);
        assert_eq!(tally.count("z"), 0);
        assert_eq!(
            tally.ranked(),
            vec![("y".to_string(), 3), ("x".to_string(), 2)]
        );
    }

    #[test]
    fn test_empty_tally() {
        let tally = FrequencyTally::new();
        assert!(tally.is_empty());
        assert!(tally.ranked().is_empty());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let mut tally = FrequencyTally::new();
        tally.record_many(["beta", "alpha", "gamma"]);
        tally.record("alpha");

        assert_eq!(
            tally.ranked(),
            vec![
                ("alpha".to_string(), 2),
                // beta and gamma tie at 1; beta appeared first.
                ("beta".to_string(), 1),
                ("gamma".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_records_with_no_labels_contribute_nothing() {
        let mut tally = FrequencyTally::new();
        tally.record_many(Vec::<String>::new());
        tally.record_many(["solo"]);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally.ranked(), vec![("solo".to_string(), 1)]);
    }

    #[test]
    fn test_rank_keywords_over_documents() {
        let documents = vec![
            DocumentFields {
                keywords: vec!["invoice".to_string(), "urgent".to_string()],
                ..DocumentFields::default()
            },
            DocumentFields::default(),
            DocumentFields {
                keywords: vec!["invoice".to_string()],
                ..DocumentFields::default()
            },
        ];

        let ranked = rank_keywords(&documents, 10);
        assert_eq!(
            ranked,
            vec![("invoice".to_string(), 2), ("urgent".to_string(), 1)]
        );
    }

    #[test]
    fn test_rank_keywords_honors_limit() {
        let documents = vec![DocumentFields {
            keywords: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..DocumentFields::default()
        }];
        let ranked = rank_keywords(&documents, 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_multilingual_labels() {
        let mut tally = FrequencyTally::new();
        tally.record_many(["請求書", "facture", "請求書"]);
        assert_eq!(tally.ranked()[0], ("請求書".to_string(), 2));
    }
}

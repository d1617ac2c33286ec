//! Batch normalization: extract, validate, deduplicate and order.
//!
//! Messages are extracted and validated independently (optionally on the
//! rayon pool). Deduplication is one sequential pass over the outcomes in
//! input order, so "first success wins" refers to input position and never
//! to completion order.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ExtractionFailure, FailureReason};
use crate::extract::{MessageExtractor, OrderExtractor, Outcome};
use crate::models::config::ExtractionConfig;
use crate::models::message::RawMessage;
use crate::models::order::OrderRecord;
use crate::report::ExtractionReport;
use crate::validate::RecordValidator;

/// Result of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Accepted records, ordered by `(order_time, source_message_id)`.
    pub dataset: Vec<OrderRecord>,
    /// Every failure, in input order.
    pub failures: Vec<ExtractionFailure>,
    /// Number of messages in the batch.
    pub input_count: usize,
}

impl BatchOutcome {
    /// Success/failure counts for this run.
    pub fn report(&self) -> ExtractionReport {
        ExtractionReport::from_outcome(self.input_count, self.dataset.len(), &self.failures)
    }
}

/// Applies extraction and validation across a batch of messages.
pub struct BatchNormalizer<E = OrderExtractor> {
    extractor: E,
    validator: RecordValidator,
    parallel: bool,
    known_ids: HashSet<String>,
}

impl BatchNormalizer<OrderExtractor> {
    /// Create a normalizer with the default extractor.
    pub fn new() -> Self {
        Self::with_extractor(OrderExtractor::new())
    }

    /// Build a normalizer from configuration.
    pub fn from_config(config: &ExtractionConfig) -> crate::Result<Self> {
        Ok(Self::with_extractor(OrderExtractor::from_config(config)?).with_parallel(config.parallel))
    }
}

impl Default for BatchNormalizer<OrderExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: MessageExtractor> BatchNormalizer<E> {
    /// Create a normalizer around any extractor.
    pub fn with_extractor(extractor: E) -> Self {
        Self {
            extractor,
            validator: RecordValidator::new(),
            parallel: false,
            known_ids: HashSet::new(),
        }
    }

    /// Extract on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Treat these message ids as already accepted by an earlier run.
    ///
    /// Messages carrying one of them are reported as duplicates, which
    /// makes re-running over an overlapping message set idempotent.
    pub fn with_known_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    fn process(&self, message: &RawMessage) -> Outcome<OrderRecord> {
        self.extractor
            .extract(message)
            .and_then(|record| self.validator.validate(record))
    }

    /// Normalize a batch of messages.
    pub fn normalize(&self, messages: &[RawMessage]) -> BatchOutcome {
        let outcomes: Vec<Outcome<OrderRecord>> = if self.parallel {
            messages.par_iter().map(|m| self.process(m)).collect()
        } else {
            messages.iter().map(|m| self.process(m)).collect()
        };

        let mut seen = self.known_ids.clone();
        let mut dataset = Vec::new();
        let mut failures = Vec::new();

        for (message, outcome) in messages.iter().zip(outcomes) {
            if seen.contains(&message.id) {
                warn!(id = %message.id, "Duplicate message");
                failures.push(ExtractionFailure::new(message.id.as_str(), FailureReason::DuplicateMessage));
                continue;
            }

            match outcome {
                Ok(record) => {
                    seen.insert(message.id.clone());
                    dataset.push(record);
                }
                Err(failure) => {
                    warn!(id = %failure.message_id, reason = %failure.reason, "Message not extracted");
                    failures.push(failure);
                }
            }
        }

        dataset.sort_by(|a, b| {
            a.order_time
                .cmp(&b.order_time)
                .then_with(|| a.source_message_id.cmp(&b.source_message_id))
        });

        info!(
            total = messages.len(),
            accepted = dataset.len(),
            failed = failures.len(),
            "Batch normalized"
        );

        BatchOutcome {
            dataset,
            failures,
            input_count: messages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn inline_body(restaurant: &str, amount: &str, ordered: &str, delivered: &str) -> String {
        format!(
            "Restaurant: {}\nOrder Amount: ₹{}\nOrdered at: {}\nDelivered at: {}",
            restaurant, amount, ordered, delivered
        )
    }

    fn message(id: &str, body: String) -> RawMessage {
        RawMessage::new(id, "Order delivered", body, ts("2024-03-05T00:00:00+05:30"))
    }

    fn sample_batch() -> Vec<RawMessage> {
        vec![
            message("c", inline_body("Cafe C", "300.00", "2024-03-03 12:00", "2024-03-03 12:30")),
            message("promo", "Flat 50% off today only!".to_string()),
            message("a", inline_body("Diner A", "120.00", "2024-03-01 09:00", "2024-03-01 09:40")),
            message("bad-ts", inline_body("Late L", "99.00", "2024-03-02 20:00", "2024-03-02 19:00")),
            message("b", inline_body("Bistro B", "250.00", "2024-03-01 09:00", "2024-03-01 09:20")),
            message("a", inline_body("Other A", "999.00", "2024-03-04 10:00", "2024-03-04 10:30")),
        ]
    }

    fn ids(outcome: &BatchOutcome) -> Vec<&str> {
        outcome.dataset.iter().map(|r| r.source_message_id.as_str()).collect()
    }

    #[test]
    fn test_dataset_ordering_and_tiebreak() {
        let outcome = BatchNormalizer::new().normalize(&sample_batch());
        assert_eq!(ids(&outcome), vec!["a", "b", "c"]);

        let times: Vec<_> = outcome.dataset.iter().map(|r| r.order_time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_failures_in_input_order() {
        let outcome = BatchNormalizer::new().normalize(&sample_batch());
        let reasons: Vec<(&str, FailureReason)> = outcome
            .failures
            .iter()
            .map(|f| (f.message_id.as_str(), f.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("promo", FailureReason::NoMatchPattern),
                ("bad-ts", FailureReason::TimestampOrderingViolation),
                ("a", FailureReason::DuplicateMessage),
            ]
        );
    }

    #[test]
    fn test_first_in_order_duplicate_kept() {
        let outcome = BatchNormalizer::new().normalize(&sample_batch());
        let a = outcome.dataset.iter().find(|r| r.source_message_id == "a").unwrap();
        assert_eq!(a.restaurant_name, "Diner A");
    }

    #[test]
    fn test_conservation() {
        let batch = sample_batch();
        let outcome = BatchNormalizer::new().normalize(&batch);
        assert_eq!(outcome.dataset.len() + outcome.failures.len(), batch.len());
        assert_eq!(outcome.input_count, batch.len());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let batch = sample_batch();
        let sequential = BatchNormalizer::new().with_parallel(false).normalize(&batch);
        let parallel = BatchNormalizer::new().with_parallel(true).normalize(&batch);
        assert_eq!(sequential.dataset, parallel.dataset);
        assert_eq!(sequential.failures, parallel.failures);
    }

    #[test]
    fn test_failed_first_then_success_wins() {
        let batch = vec![
            message("x", "not an order".to_string()),
            message("x", inline_body("Cafe X", "80.00", "2024-03-01 10:00", "2024-03-01 10:30")),
        ];
        let outcome = BatchNormalizer::new().normalize(&batch);
        assert_eq!(ids(&outcome), vec!["x"]);
        assert_eq!(outcome.failures[0].reason, FailureReason::NoMatchPattern);
    }

    #[test]
    fn test_rerun_with_known_ids_is_idempotent() {
        let batch = sample_batch();
        let first = BatchNormalizer::new().normalize(&batch);

        let second = BatchNormalizer::new()
            .with_known_ids(first.dataset.iter().map(|r| r.source_message_id.clone()))
            .normalize(&batch);

        assert!(second.dataset.is_empty());
        assert_eq!(second.failures.len(), batch.len());
        let duplicates = second
            .failures
            .iter()
            .filter(|f| f.reason == FailureReason::DuplicateMessage)
            .count();
        // a, b, c, and the second a
        assert_eq!(duplicates, 4);
    }

    #[test]
    fn test_same_batch_twice_same_dataset() {
        let batch = sample_batch();
        let normalizer = BatchNormalizer::new();
        assert_eq!(normalizer.normalize(&batch).dataset, normalizer.normalize(&batch).dataset);
    }

    struct AlwaysFails;

    impl MessageExtractor for AlwaysFails {
        fn extract(&self, message: &RawMessage) -> Outcome<OrderRecord> {
            Err(ExtractionFailure::new(message.id.as_str(), FailureReason::UnparsableAmount))
        }
    }

    #[test]
    fn test_custom_extractor() {
        let batch = sample_batch();
        let outcome = BatchNormalizer::with_extractor(AlwaysFails).normalize(&batch);
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.failures.len(), batch.len());
        assert_eq!(outcome.report().failed, batch.len());
    }
}

//! Extraction-quality report for a batch run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{ExtractionFailure, FailureReason};

/// Counts of successes and failures by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Messages in the batch.
    pub total: usize,
    /// Records that reached the dataset.
    pub succeeded: usize,
    /// Messages that did not.
    pub failed: usize,
    /// Failure counts keyed by reason kind.
    pub by_reason: BTreeMap<String, usize>,
    /// `MissingField` failures keyed by field name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub missing_fields: BTreeMap<String, usize>,
}

impl ExtractionReport {
    pub fn from_outcome(total: usize, succeeded: usize, failures: &[ExtractionFailure]) -> Self {
        let mut report = Self {
            total,
            succeeded,
            failed: failures.len(),
            ..Default::default()
        };

        for failure in failures {
            *report
                .by_reason
                .entry(failure.reason.kind().to_string())
                .or_default() += 1;

            if let FailureReason::MissingField(field) = &failure.reason {
                *report.missing_fields.entry(field.clone()).or_default() += 1;
            }
        }

        report
    }

    /// Whether every message is accounted for.
    pub fn is_balanced(&self) -> bool {
        self.succeeded + self.failed == self.total
    }

    pub fn count(&self, kind: &str) -> usize {
        self.by_reason.get(kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} messages failed", self.failed, self.total)?;

        if !self.by_reason.is_empty() {
            let parts: Vec<String> = self
                .by_reason
                .iter()
                .map(|(kind, count)| format!("{} {}", count, kind))
                .collect();
            write!(f, ": {}", parts.join(", "))?;
        }

        Ok(())
    }
}

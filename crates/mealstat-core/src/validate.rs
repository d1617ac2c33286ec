//! Cross-field plausibility checks on extracted records.
//!
//! The extractor guarantees each field parsed; it does not guarantee the
//! fields agree with each other. A template that drifts can still point at
//! the wrong figure or the wrong timestamp, and those records are turned
//! into failures here rather than corrected.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{ExtractionFailure, FailureReason};
use crate::extract::Outcome;
use crate::models::order::OrderRecord;

/// Re-checks the order-record invariants.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator;

impl RecordValidator {
    pub fn new() -> Self {
        Self
    }

    /// Pass the record through unchanged, or downgrade it to a failure
    /// tagged with the violated invariant.
    pub fn validate(&self, record: OrderRecord) -> Outcome<OrderRecord> {
        match check(&record) {
            Ok(()) => Ok(record),
            Err(reason) => {
                debug!(id = %record.source_message_id, %reason, "Record failed validation");
                Err(ExtractionFailure::new(record.source_message_id, reason))
            }
        }
    }
}

/// Check a record against the invariants without consuming it.
pub fn check(record: &OrderRecord) -> Result<(), FailureReason> {
    if record.amount < Decimal::ZERO
        || record.discount_amount < Decimal::ZERO
        || record.discount_amount > record.amount
    {
        return Err(FailureReason::AmountOrderingViolation);
    }

    if let Some(delivered) = record.delivery_time {
        if delivered < record.order_time {
            return Err(FailureReason::TimestampOrderingViolation);
        }
    }

    Ok(())
}

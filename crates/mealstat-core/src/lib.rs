//! Core library for food-delivery email extraction.
//!
//! This crate provides:
//! - Template-driven field extraction from delivery-confirmation emails
//! - Cross-field validation of extracted order records
//! - Batch normalization with deduplication and full failure accounting
//! - CSV export, extraction-quality reports and aggregate statistics

pub mod error;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod report;
pub mod stats;
pub mod text;
pub mod validate;

pub use error::{ExtractionFailure, FailureReason, IngestError, MealstatError, Result};
pub use extract::{MessageExtractor, OrderExtractor, Outcome, TemplateMatcher};
pub use models::config::MealstatConfig;
pub use models::message::RawMessage;
pub use models::order::OrderRecord;
pub use normalize::{BatchNormalizer, BatchOutcome};
pub use report::ExtractionReport;
pub use stats::OrderStats;
pub use validate::RecordValidator;

/// Extract one message with the default extractor.
pub fn extract(message: &RawMessage) -> Outcome<OrderRecord> {
    OrderExtractor::new().extract(message)
}

/// Validate one record.
pub fn validate(record: OrderRecord) -> Outcome<OrderRecord> {
    RecordValidator::new().validate(record)
}

/// Normalize a batch with the default extractor, sequentially.
pub fn normalize(messages: &[RawMessage]) -> BatchOutcome {
    BatchNormalizer::new().normalize(messages)
}

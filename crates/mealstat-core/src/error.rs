//! Error types for the mealstat-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the mealstat library.
///
/// These are fatal to the operation that raised them (reading a mailbox
/// dump, writing a dataset). Per-message extraction problems are never
/// reported through this type; see [`ExtractionFailure`].
#[derive(Error, Debug)]
pub enum MealstatError {
    /// Message ingestion error.
    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Tabular export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored dataset row could not be read back.
    #[error("invalid dataset row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to turning stored mail into [`RawMessage`](crate::RawMessage) values.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The RFC 822 message could not be parsed.
    #[error("failed to parse mail: {0}")]
    Mail(#[from] mailparse::MailParseError),

    /// A line of a JSON lines dump was not a message.
    #[error("invalid message on line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    /// A header required to build a message is absent.
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    /// The message date header could not be interpreted.
    #[error("invalid date header: {0}")]
    InvalidDate(String),
}

/// Why a single message did not become an order record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field")]
pub enum FailureReason {
    /// No known template recognized the message layout.
    #[error("no template matched")]
    NoMatchPattern,

    /// A template matched but a required field was empty or absent.
    #[error("missing field: {0}")]
    MissingField(String),

    /// An amount was located but is not a non-negative two-place decimal.
    #[error("unparsable amount")]
    UnparsableAmount,

    /// A timestamp was located but does not denote a real instant.
    #[error("unparsable timestamp")]
    UnparsableTimestamp,

    /// Negative amount or discount, or discount larger than amount.
    #[error("discount exceeds amount or amount is negative")]
    AmountOrderingViolation,

    /// Delivery time precedes order time.
    #[error("delivery time precedes order time")]
    TimestampOrderingViolation,

    /// Another message with the same id was already accepted.
    #[error("duplicate message")]
    DuplicateMessage,
}

impl FailureReason {
    /// Stable label used when grouping failures in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::NoMatchPattern => "NoMatchPattern",
            FailureReason::MissingField(_) => "MissingField",
            FailureReason::UnparsableAmount => "UnparsableAmount",
            FailureReason::UnparsableTimestamp => "UnparsableTimestamp",
            FailureReason::AmountOrderingViolation => "AmountOrderingViolation",
            FailureReason::TimestampOrderingViolation => "TimestampOrderingViolation",
            FailureReason::DuplicateMessage => "DuplicateMessage",
        }
    }

    pub fn missing(field: &str) -> Self {
        FailureReason::MissingField(field.to_string())
    }
}

/// A per-message failure outcome, returned as data.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("message {message_id}: {reason}")]
pub struct ExtractionFailure {
    /// Id of the message that failed.
    pub message_id: String,
    /// What went wrong.
    pub reason: FailureReason,
}

impl ExtractionFailure {
    pub fn new(message_id: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            message_id: message_id.into(),
            reason,
        }
    }
}

/// Result type for the mealstat library.
pub type Result<T> = std::result::Result<T, MealstatError>;

//! Rule-based field extractors for delivery confirmations.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{format_inr, parse_amount, AmountExtractor};
pub use dates::{ist_offset, TimestampExtractor};
pub use patterns::*;

use crate::error::FailureReason;

/// Outcome of extracting one located field: the value, or why the text
/// that was found could not be turned into one.
pub type FieldResult<T> = Result<ExtractionMatch<T>, FailureReason>;

/// Trait for field extractors.
///
/// `None` means nothing recognizable was found. `Some(Err(_))` means a value
/// was recognized but is invalid.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field from text.
    fn extract(&self, text: &str) -> Option<FieldResult<Self::Output>>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<FieldResult<Self::Output>>;
}

/// A located field value with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

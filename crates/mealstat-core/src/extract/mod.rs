//! Order field extraction module.

mod extractor;
pub mod rules;
pub mod templates;

pub use extractor::OrderExtractor;
pub use templates::{default_templates, InlineLabelTemplate, LocatedFields, SummaryBlockTemplate, TemplateMatcher};

use crate::error::ExtractionFailure;
use crate::models::message::RawMessage;
use crate::models::order::OrderRecord;

/// Per-message outcome: a value or a typed failure.
pub type Outcome<T> = std::result::Result<T, ExtractionFailure>;

/// Trait for message-to-record extractors.
///
/// Implementations must be pure: the same message always yields the same
/// outcome.
pub trait MessageExtractor: Send + Sync {
    /// Extract an order record from one message.
    fn extract(&self, message: &RawMessage) -> Outcome<OrderRecord>;
}

//! Template-driven order extraction.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::error::{ExtractionFailure, FailureReason};
use crate::models::config::ExtractionConfig;
use crate::models::message::RawMessage;
use crate::models::order::OrderRecord;
use crate::text::body_lines;

use super::rules::{ist_offset, AmountExtractor, FieldExtractor, TimestampExtractor};
use super::templates::{default_templates, LocatedFields, TemplateMatcher};
use super::{MessageExtractor, Outcome};

/// Extracts order records by trying each known template in priority order.
///
/// The first template that structurally matches is used exclusively; a
/// failure inside it is final and later templates are not consulted.
pub struct OrderExtractor {
    templates: Vec<Box<dyn TemplateMatcher>>,
    amounts: AmountExtractor,
    timestamps: TimestampExtractor,
    reject_replies: bool,
}

impl OrderExtractor {
    /// Create an extractor with the default templates and IST reporting zone.
    pub fn new() -> Self {
        Self {
            templates: default_templates(),
            amounts: AmountExtractor::new(),
            timestamps: TimestampExtractor::new(ist_offset()),
            reject_replies: true,
        }
    }

    /// Build an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> crate::Result<Self> {
        Ok(Self::new()
            .with_offset(config.reporting_offset()?)
            .with_reply_rejection(config.reject_replies))
    }

    /// Set the sender's reporting timezone.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.timestamps = TimestampExtractor::new(offset);
        self
    }

    /// Set whether replies and forwards are rejected by subject.
    pub fn with_reply_rejection(mut self, reject: bool) -> Self {
        self.reject_replies = reject;
        self
    }

    /// Replace the template set. Order is priority order.
    pub fn with_templates(mut self, templates: Vec<Box<dyn TemplateMatcher>>) -> Self {
        self.templates = templates;
        self
    }

    fn parse_fields(
        &self,
        fields: LocatedFields,
        message_id: &str,
    ) -> Result<OrderRecord, FailureReason> {
        let restaurant_name = fields.restaurant_name.trim();
        if restaurant_name.is_empty() {
            return Err(FailureReason::missing("restaurant_name"));
        }

        let amount = self.required_amount(&fields.amount)?;
        let discount_amount = match fields.discount.as_deref() {
            Some(text) => self.optional_amount(text)?,
            None => Decimal::new(0, 2),
        };

        let order_time = match fields.order_time.as_deref() {
            Some(text) => self.timestamp(text)?,
            None => return Err(FailureReason::missing("order_time")),
        };
        let delivery_time = fields
            .delivery_time
            .as_deref()
            .map(|text| self.timestamp(text))
            .transpose()?;

        Ok(OrderRecord {
            restaurant_name: restaurant_name.to_string(),
            order_time,
            delivery_time,
            amount,
            discount_amount,
            source_message_id: message_id.to_string(),
        })
    }

    fn required_amount(&self, text: &str) -> Result<Decimal, FailureReason> {
        if text.trim().is_empty() {
            return Err(FailureReason::missing("amount"));
        }
        match self.amounts.extract(text) {
            Some(found) => found.map(|m| m.value),
            None => Err(FailureReason::UnparsableAmount),
        }
    }

    fn optional_amount(&self, text: &str) -> Result<Decimal, FailureReason> {
        match self.amounts.extract(text) {
            Some(found) => found.map(|m| m.value),
            None if text.trim().is_empty() => Ok(Decimal::new(0, 2)),
            None => Err(FailureReason::UnparsableAmount),
        }
    }

    fn timestamp(&self, text: &str) -> Result<DateTime<FixedOffset>, FailureReason> {
        match self.timestamps.extract(text) {
            Some(found) => found.map(|m| m.value),
            None => Err(FailureReason::UnparsableTimestamp),
        }
    }
}

impl Default for OrderExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageExtractor for OrderExtractor {
    fn extract(&self, message: &RawMessage) -> Outcome<OrderRecord> {
        let fail = |reason| ExtractionFailure::new(message.id.as_str(), reason);

        if self.reject_replies && message.is_reply_or_forward() {
            debug!(id = %message.id, subject = %message.subject, "Rejecting reply/forward");
            return Err(fail(FailureReason::NoMatchPattern));
        }

        let lines = body_lines(&message.body);
        trace!(id = %message.id, lines = lines.len(), "Normalized body");

        for template in &self.templates {
            if let Some(fields) = template.locate(&lines) {
                debug!(id = %message.id, template = template.name(), "Template matched");
                return self.parse_fields(fields, &message.id).map_err(|reason| {
                    debug!(id = %message.id, template = template.name(), %reason, "Field extraction failed");
                    fail(reason)
                });
            }
        }

        debug!(id = %message.id, "No template matched");
        Err(fail(FailureReason::NoMatchPattern))
    }
}

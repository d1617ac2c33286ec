//! Configuration structures for the extraction pipeline.

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MealstatError, Result};

/// Main configuration for the mealstat pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MealstatConfig {
    /// Mailbox selection handed to the retrieval side.
    pub mail: MailConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Dataset export configuration.
    pub export: ExportConfig,
}

/// Which messages count as delivery confirmations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Sender address of delivery confirmations.
    pub sender: String,

    /// Subject fragments identifying a delivery confirmation (any of).
    pub subject_keywords: Vec<String>,

    /// Earliest date to search, `YYYY/MM/DD`.
    pub start_date: Option<String>,

    /// Latest date to search, `YYYY/MM/DD`.
    pub end_date: Option<String>,

    /// Maximum number of messages to request.
    pub max_messages: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: "noreply@swiggy.in".to_string(),
            subject_keywords: vec![
                "successfully delivered".to_string(),
                "order delivered".to_string(),
            ],
            start_date: Some("2016/01/01".to_string()),
            end_date: Some("2025/12/31".to_string()),
            max_messages: 500,
        }
    }
}

impl MailConfig {
    /// Mailbox search query selecting delivery confirmations.
    pub fn mail_query(&self) -> String {
        let mut query = format!("from:{}", self.sender);

        if !self.subject_keywords.is_empty() {
            let terms: Vec<String> = self
                .subject_keywords
                .iter()
                .map(|k| format!("subject:\"{}\"", k))
                .collect();
            query.push_str(&format!(" AND ({})", terms.join(" OR ")));
        }

        if let Some(start) = &self.start_date {
            query.push_str(&format!(" AND after:{}", start.replace('/', "-")));
        }
        if let Some(end) = &self.end_date {
            query.push_str(&format!(" AND before:{}", end.replace('/', "-")));
        }

        query
    }

    /// Whether a sender/subject pair passes this filter.
    pub fn accepts(&self, from: &str, subject: &str) -> bool {
        let sender_ok = from.to_lowercase().contains(&self.sender.to_lowercase());
        let subject = subject.to_lowercase();
        let subject_ok = self.subject_keywords.is_empty()
            || self
                .subject_keywords
                .iter()
                .any(|k| subject.contains(&k.to_lowercase()));
        sender_ok && subject_ok
    }

    /// Whether a message date falls inside the search window.
    ///
    /// `start_date` is inclusive and `end_date` exclusive, matching the
    /// `after:`/`before:` terms of [`mail_query`](Self::mail_query). A bound
    /// that is unset or not `YYYY/MM/DD` does not restrict.
    pub fn in_range(&self, date: NaiveDate) -> bool {
        let bound = |d: &Option<String>| {
            d.as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y/%m/%d").ok())
        };
        let after_start = bound(&self.start_date).is_none_or(|start| date >= start);
        let before_end = bound(&self.end_date).is_none_or(|end| date < end);
        after_start && before_end
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Offset of the sender's reporting timezone from UTC, in minutes.
    pub utc_offset_minutes: i32,

    /// Extract messages on a worker pool.
    pub parallel: bool,

    /// Reject messages whose subject marks a reply or forward.
    pub reject_replies: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 330,
            parallel: true,
            reject_replies: true,
        }
    }
}

impl ExtractionConfig {
    /// The reporting timezone as a chrono offset.
    pub fn reporting_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            MealstatError::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

/// Dataset export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// CSV file the dataset is written to.
    pub output_file: PathBuf,

    /// strftime format for timestamp columns.
    pub timestamp_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("swiggy_orders.csv"),
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl MealstatConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        self.extraction.reporting_offset()?;
        crate::export::check_timestamp_format(&self.export.timestamp_format)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

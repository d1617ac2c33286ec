//! Common regex patterns for delivery-confirmation extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// English month names and their common abbreviations.
const MONTH_NAME: &str =
    r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

lazy_static! {
    // Element tags plus declarations and conditional markers (<!DOCTYPE>, <![endif]>)
    pub static ref HTML_TAG: Regex = Regex::new(
        r"</?[a-zA-Z][^>]*>|<![^>]*>"
    ).unwrap();

    // Comments (including MSO conditional blocks) and non-rendered elements
    pub static ref HTML_SKIPPED_BLOCK: Regex = Regex::new(
        r"(?is)<!--.*?-->|<(?:script|style|head)\b[^>]*>.*?</(?:script|style|head)\s*>"
    ).unwrap();

    pub static ref HTML_NUMERIC_ENTITY: Regex = Regex::new(
        r"&#([xX]?)([0-9a-fA-F]+);"
    ).unwrap();

    pub static ref HTML_ENTITY: Regex = Regex::new(
        r"&([a-zA-Z][a-zA-Z0-9]*);"
    ).unwrap();

    // Amounts (₹ 1,250.00 / Rs. 450 / INR 99.5)
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"(?i)(?:₹|\bRs\.?|\bINR)\s*(-?\s*\d[\d,]*(?:\.\d+)?)"
    ).unwrap();

    pub static ref PLAIN_AMOUNT: Regex = Regex::new(
        r"^(\d+)(?:\.(\d{1,2}))?$"
    ).unwrap();

    // Timestamps
    // "Friday, March 1, 2024 7:30 PM" or "March 1, 2024 07:30 pm"
    pub static ref TIMESTAMP_MONTH_FIRST: Regex = Regex::new(&format!(
        r"(?i)\b(?:(?:mon|tues|wednes|thurs|fri|satur|sun)day,?\s+)?({})\.?\s+(\d{{1,2}}),?\s+(\d{{4}}),?\s+(?:at\s+)?(\d{{1,2}}):(\d{{2}})\s*([ap])\.?m\.?",
        MONTH_NAME
    )).unwrap();

    // "1 Mar 2024, 7:30 PM"
    pub static ref TIMESTAMP_DAY_FIRST: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s+({})\.?,?\s+(\d{{4}}),?\s+(?:at\s+)?(\d{{1,2}}):(\d{{2}})\s*([ap])\.?m\.?",
        MONTH_NAME
    )).unwrap();

    // "2024-03-01 19:30" or "2024-03-01T19:30:15"
    pub static ref TIMESTAMP_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})[ T](\d{1,2}):(\d{2})(?::(\d{2}))?"
    ).unwrap();

    // "01/03/2024 19:30"
    pub static ref TIMESTAMP_DMY: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4}),?\s+(\d{1,2}):(\d{2})\b"
    ).unwrap();

    // Inline-label layout ("Restaurant: Tasty Bites")
    pub static ref INLINE_RESTAURANT: Regex = Regex::new(
        r"(?i)^(?:restaurant|restaurant name|ordered from)\s*:(.*)$"
    ).unwrap();

    pub static ref INLINE_AMOUNT: Regex = Regex::new(
        r"(?i)^(?:order amount|order total|total paid|grand total|bill total)\s*:(.*)$"
    ).unwrap();

    pub static ref INLINE_DISCOUNT: Regex = Regex::new(
        r"(?i)^(?:discount|discount applied|total discount|savings)\s*:(.*)$"
    ).unwrap();

    pub static ref INLINE_ORDERED_AT: Regex = Regex::new(
        r"(?i)^(?:ordered at|order placed at|order time|placed at)\s*:(.*)$"
    ).unwrap();

    pub static ref INLINE_DELIVERED_AT: Regex = Regex::new(
        r"(?i)^(?:delivered at|order delivered at|delivery time)\s*:(.*)$"
    ).unwrap();
}

/// Month number for an English month name or abbreviation, 0 if unknown.
pub fn month_to_number(month: &str) -> u32 {
    let month = month.to_lowercase();
    let months = [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ];

    months
        .iter()
        .position(|m| *m == month || (month.len() >= 3 && m.starts_with(&month)))
        .map(|i| i as u32 + 1)
        .unwrap_or(0)
}
